//! Compiled-in schema migrations.
//!
//! Every migration is carried in both dialects so the same ordered list can
//! be applied to the embedded source and the centralized destination. The
//! history table of each store is the sole gate for "is migration X needed":
//! it is append-only, and a migration id present there is never re-applied.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// SQL dialect spoken by a store engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Embedded single-file store.
    Sqlite,
    /// Centralized networked store.
    Postgres,
}

/// One schema migration, compiled into the program.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Stable identifier; the timestamp prefix orders the list.
    pub id: &'static str,
    sqlite: &'static str,
    postgres: &'static str,
}

impl Migration {
    /// The schema-change SQL for the given dialect.
    pub fn sql(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Sqlite => self.sqlite,
            Dialect::Postgres => self.postgres,
        }
    }
}

/// A migration recorded as applied in a store's history table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationRecord {
    /// Migration identifier.
    pub id: String,
    /// When the migration was applied to this store.
    pub applied_at: DateTime<Utc>,
}

/// Name of the migration-history table.
pub const HISTORY_TABLE: &str = "__migrations";

/// Id of the migration that creates the initial entity tables.
pub const INITIAL_SCHEMA_MIGRATION: &str = "20240105120000_initial_schema";

/// Id of the migration that adds the nullable guild prefix column.
/// The prefix backfill hook is bound to this id.
pub const GUILD_PREFIX_MIGRATION: &str = "20240406153000_guild_prefix_column";

/// Id of the migration that adds the XP level-up timestamp column.
pub const XP_LEVEL_UP_MIGRATION: &str = "20240612101500_xp_last_level_up";

/// All known migrations, in ascending application order.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        id: INITIAL_SCHEMA_MIGRATION,
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS guild_configs (
                guild_id INTEGER PRIMARY KEY,
                staff_role_id INTEGER,
                mute_role_id INTEGER,
                delete_message_on_command INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS discord_users (
                user_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                avatar_url TEXT,
                is_bot_owner INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS afk (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                user_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                set_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS auto_commands (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                channel_id INTEGER NOT NULL,
                command_text TEXT NOT NULL,
                interval_secs INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ban_templates (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS command_aliases (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                trigger_text TEXT NOT NULL,
                mapping TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS giveaways (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                channel_id INTEGER NOT NULL,
                message_id INTEGER,
                prize TEXT NOT NULL,
                winners INTEGER NOT NULL,
                ends_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS multi_greets (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                channel_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                delete_after_secs INTEGER
            );

            CREATE TABLE IF NOT EXISTS muted_users (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                user_id INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS polls (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                channel_id INTEGER NOT NULL,
                question TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS poll_votes (
                id INTEGER PRIMARY KEY,
                poll_id INTEGER NOT NULL REFERENCES polls(id),
                user_id INTEGER NOT NULL,
                vote_index INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quotes (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                keyword TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                due_at TEXT NOT NULL,
                is_private INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS suggestions (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                suggestion_number INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                message_id INTEGER,
                content TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unban_timers (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                user_id INTEGER NOT NULL,
                unban_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unmute_timers (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                user_id INTEGER NOT NULL,
                unmute_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_xp_stats (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                xp INTEGER NOT NULL DEFAULT 0,
                awarded_xp INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS warnings (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                user_id INTEGER NOT NULL,
                reason TEXT,
                moderator TEXT NOT NULL,
                forgiven INTEGER NOT NULL DEFAULT 0,
                warned_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS warning_punishments (
                id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL REFERENCES guild_configs(guild_id),
                count INTEGER NOT NULL,
                punishment INTEGER NOT NULL,
                time_mins INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_afk_guild ON afk(guild_id);
            CREATE INDEX IF NOT EXISTS idx_poll_votes_poll ON poll_votes(poll_id);
            CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(due_at);
            CREATE INDEX IF NOT EXISTS idx_xp_user_guild ON user_xp_stats(user_id, guild_id);
            CREATE INDEX IF NOT EXISTS idx_warnings_guild_user ON warnings(guild_id, user_id);
            "#,
        postgres: r#"
            CREATE TABLE IF NOT EXISTS guild_configs (
                guild_id BIGINT PRIMARY KEY,
                staff_role_id BIGINT,
                mute_role_id BIGINT,
                delete_message_on_command BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE TABLE IF NOT EXISTS discord_users (
                user_id BIGINT PRIMARY KEY,
                username TEXT NOT NULL,
                avatar_url TEXT,
                is_bot_owner BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE TABLE IF NOT EXISTS afk (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                user_id BIGINT NOT NULL,
                message TEXT NOT NULL,
                set_at TIMESTAMPTZ NOT NULL
            );

            CREATE TABLE IF NOT EXISTS auto_commands (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                channel_id BIGINT NOT NULL,
                command_text TEXT NOT NULL,
                interval_secs BIGINT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ban_templates (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS command_aliases (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                trigger_text TEXT NOT NULL,
                mapping TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS giveaways (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                channel_id BIGINT NOT NULL,
                message_id BIGINT,
                prize TEXT NOT NULL,
                winners INTEGER NOT NULL,
                ends_at TIMESTAMPTZ NOT NULL
            );

            CREATE TABLE IF NOT EXISTS multi_greets (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                channel_id BIGINT NOT NULL,
                message TEXT NOT NULL,
                delete_after_secs BIGINT
            );

            CREATE TABLE IF NOT EXISTS muted_users (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                user_id BIGINT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS polls (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                channel_id BIGINT NOT NULL,
                question TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS poll_votes (
                id BIGINT PRIMARY KEY,
                poll_id BIGINT NOT NULL REFERENCES polls(id),
                user_id BIGINT NOT NULL,
                vote_index INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quotes (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                keyword TEXT NOT NULL,
                author_id BIGINT NOT NULL,
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reminders (
                id BIGINT PRIMARY KEY,
                user_id BIGINT NOT NULL,
                channel_id BIGINT NOT NULL,
                message TEXT NOT NULL,
                due_at TIMESTAMPTZ NOT NULL,
                is_private BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE TABLE IF NOT EXISTS suggestions (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                suggestion_number BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                message_id BIGINT,
                content TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unban_timers (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                user_id BIGINT NOT NULL,
                unban_at TIMESTAMPTZ NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unmute_timers (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                user_id BIGINT NOT NULL,
                unmute_at TIMESTAMPTZ NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_xp_stats (
                id BIGINT PRIMARY KEY,
                user_id BIGINT NOT NULL,
                guild_id BIGINT NOT NULL,
                xp BIGINT NOT NULL DEFAULT 0,
                awarded_xp BIGINT NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS warnings (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                user_id BIGINT NOT NULL,
                reason TEXT,
                moderator TEXT NOT NULL,
                forgiven BOOLEAN NOT NULL DEFAULT FALSE,
                warned_at TIMESTAMPTZ NOT NULL
            );

            CREATE TABLE IF NOT EXISTS warning_punishments (
                id BIGINT PRIMARY KEY,
                guild_id BIGINT NOT NULL REFERENCES guild_configs(guild_id),
                count INTEGER NOT NULL,
                punishment INTEGER NOT NULL,
                time_mins INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_afk_guild ON afk(guild_id);
            CREATE INDEX IF NOT EXISTS idx_poll_votes_poll ON poll_votes(poll_id);
            CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(due_at);
            CREATE INDEX IF NOT EXISTS idx_xp_user_guild ON user_xp_stats(user_id, guild_id);
            CREATE INDEX IF NOT EXISTS idx_warnings_guild_user ON warnings(guild_id, user_id);
            "#,
    },
    Migration {
        id: GUILD_PREFIX_MIGRATION,
        sqlite: "ALTER TABLE guild_configs ADD COLUMN prefix TEXT;",
        postgres: "ALTER TABLE guild_configs ADD COLUMN prefix TEXT;",
    },
    Migration {
        id: XP_LEVEL_UP_MIGRATION,
        sqlite: "ALTER TABLE user_xp_stats ADD COLUMN last_level_up TEXT;",
        postgres: "ALTER TABLE user_xp_stats ADD COLUMN last_level_up TIMESTAMPTZ;",
    },
];

/// History-table DDL for the given dialect.
pub fn history_ddl(dialect: Dialect) -> String {
    let applied_at_type = match dialect {
        Dialect::Sqlite => "TEXT",
        Dialect::Postgres => "TIMESTAMPTZ",
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {HISTORY_TABLE} (\
         id TEXT PRIMARY KEY, applied_at {applied_at_type} NOT NULL)"
    )
}
