//! Ordered schema migration application.

use chrono::Utc;
use tracing::{debug, info};

use guilddb_core::{MigrationRecord, MigrationStore, HISTORY_TABLE, MIGRATIONS};

use crate::error::SchemaMigrationError;

/// Applies pending compiled-in migrations to one store.
pub struct SchemaMigrator;

impl SchemaMigrator {
    /// Apply every known migration absent from the store's history, in
    /// declared order.
    ///
    /// Returns exactly the newly applied records; empty when nothing was
    /// pending, which makes repeated calls a no-op. On failure the error
    /// names the failing migration; migrations applied earlier in the batch
    /// stay committed.
    pub async fn apply_migrations<S: MigrationStore + ?Sized>(
        store: &S,
    ) -> Result<Vec<MigrationRecord>, SchemaMigrationError> {
        store
            .ensure_history()
            .await
            .map_err(|source| SchemaMigrationError {
                migration_id: HISTORY_TABLE.to_string(),
                source,
            })?;

        let applied = store
            .applied_ids()
            .await
            .map_err(|source| SchemaMigrationError {
                migration_id: HISTORY_TABLE.to_string(),
                source,
            })?;

        let mut newly_applied = Vec::new();
        for migration in MIGRATIONS {
            if applied.contains(migration.id) {
                continue;
            }
            let applied_at = Utc::now();
            debug!(
                migration = migration.id,
                dialect = ?store.dialect(),
                "applying schema migration"
            );
            store
                .apply(migration, applied_at)
                .await
                .map_err(|source| SchemaMigrationError {
                    migration_id: migration.id.to_string(),
                    source,
                })?;
            newly_applied.push(MigrationRecord {
                id: migration.id.to_string(),
                applied_at,
            });
        }

        if !newly_applied.is_empty() {
            info!(
                count = newly_applied.len(),
                dialect = ?store.dialect(),
                "applied pending schema migrations"
            );
        }

        Ok(newly_applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use guilddb_core::{Dialect, Migration, SqliteStore, StoreError};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_applies_all_then_none() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let first = SchemaMigrator::apply_migrations(&store).await.unwrap();
        assert_eq!(first.len(), MIGRATIONS.len());
        let ids: Vec<_> = first.iter().map(|r| r.id.as_str()).collect();
        let declared: Vec<_> = MIGRATIONS.iter().map(|m| m.id).collect();
        assert_eq!(ids, declared);

        let second = SchemaMigrator::apply_migrations(&store).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_skips_already_recorded_migrations() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.ensure_history().await.unwrap();
        store.apply(&MIGRATIONS[0], Utc::now()).await.unwrap();

        let newly = SchemaMigrator::apply_migrations(&store).await.unwrap();
        assert_eq!(newly.len(), MIGRATIONS.len() - 1);
        assert!(newly.iter().all(|r| r.id != MIGRATIONS[0].id));
    }

    /// Store that fails to apply one specific migration.
    struct FailingStore {
        fail_on: &'static str,
        applied: Mutex<HashSet<String>>,
    }

    impl MigrationStore for FailingStore {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        async fn ensure_history(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn applied_ids(&self) -> Result<HashSet<String>, StoreError> {
            Ok(self.applied.lock().clone())
        }

        async fn apply(
            &self,
            migration: &Migration,
            _applied_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            if migration.id == self.fail_on {
                return Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
            }
            self.applied.lock().insert(migration.id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_names_migration_and_keeps_prior_progress() {
        let store = FailingStore {
            fail_on: MIGRATIONS[1].id,
            applied: Mutex::new(HashSet::new()),
        };

        let err = SchemaMigrator::apply_migrations(&store).await.unwrap_err();
        assert_eq!(err.migration_id, MIGRATIONS[1].id);

        // The first migration stays committed after the batch fails.
        let applied = store.applied.lock();
        assert!(applied.contains(MIGRATIONS[0].id));
        assert!(!applied.contains(MIGRATIONS[1].id));
    }
}
