//! End-to-end orchestrator run against a live PostgreSQL.
//!
//! Requires `GUILDDB_TEST_DATABASE_URL` pointing at a disposable database;
//! the test skips cleanly when it is not set.

use chrono::Utc;
use rusqlite::params;

use guilddb_core::{MigrateConfig, PgStore, SqliteStore};
use guilddb_migrate::{MigrationOrchestrator, SchemaMigrator};

const ENV_URL: &str = "GUILDDB_TEST_DATABASE_URL";

async fn seed_source(path: &std::path::Path) {
    let store = SqliteStore::open(path).await.unwrap();
    SchemaMigrator::apply_migrations(&store).await.unwrap();

    let now = Utc::now();
    store
        .with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO guild_configs
                 (guild_id, staff_role_id, mute_role_id, delete_message_on_command, prefix)
                 VALUES (?1, NULL, NULL, 0, NULL)",
                params![101i64],
            )?;
            for id in 1i64..=3 {
                tx.execute(
                    "INSERT INTO warnings
                     (id, guild_id, user_id, reason, moderator, forgiven, warned_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![id, 101i64, 555i64, "spam", "mod", false, now],
                )?;
            }
            for id in 1i64..=2 {
                tx.execute(
                    "INSERT INTO reminders
                     (id, user_id, channel_id, message, due_at, is_private)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![id, 555i64, 9i64, "water the plants", now, false],
                )?;
            }
            tx.commit()
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_run_twice_is_idempotent() {
    let Ok(url) = std::env::var(ENV_URL) else {
        eprintln!("{ENV_URL} not set, skipping");
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guilddb.db");
    seed_source(&path).await;

    let config = MigrateConfig::new("", &url)
        .with_migrate_on_start(true)
        .with_source_path(&path)
        .with_batch_size(2)
        .with_max_in_flight(2);

    let first = MigrationOrchestrator::new(config.clone())
        .run()
        .await
        .unwrap();

    let destination = PgStore::connect_lazy(&url).unwrap();

    // On a fresh database the prefix migration was newly applied, so its
    // backfill hook must have repaired the NULL prefix copied from the
    // source. Hooks fire only for newly applied migrations, so this holds
    // only after the run that applied them.
    if !first.applied_destination.is_empty() {
        let backfilled: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM guild_configs WHERE prefix = '.'")
                .fetch_one(destination.pool())
                .await
                .unwrap();
        assert_eq!(backfilled, 1);
    }

    let second = MigrationOrchestrator::new(config).run().await.unwrap();

    // The second run re-copies the same deduplicated rows and applies no
    // further destination migrations.
    assert_eq!(first.total_rows, second.total_rows);
    assert!(second.applied_destination.is_empty());

    // Read the final state through a unit of work, the same surface the
    // command layer uses.
    let mut uow = destination.begin().await.unwrap();
    let warnings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM warnings")
        .fetch_one(&mut *uow)
        .await
        .unwrap();
    let reminders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reminders")
        .fetch_one(&mut *uow)
        .await
        .unwrap();
    uow.commit().await.unwrap();
    assert_eq!(warnings, 3);
    assert_eq!(reminders, 2);
}
