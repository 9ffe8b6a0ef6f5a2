//! GuildDB Core - store handles, entity model, and compiled-in schema.
//!
//! This crate provides everything the migration engine and the bot's command
//! layer share: handles to the embedded SQLite store and the centralized
//! PostgreSQL store, the [`Entity`] trait with the persisted collection
//! structs, the ordered list of compiled-in schema migrations, and the
//! configuration that locates both stores.

pub mod config;
pub mod entity;
pub mod error;
pub mod schema;
pub mod store;

pub use config::{client_id_from_token, MigrateConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_IN_FLIGHT};
pub use entity::{Entity, EntitySink, EntitySource};
pub use error::{ConfigError, StoreError};
pub use schema::{Dialect, Migration, MigrationRecord, HISTORY_TABLE, MIGRATIONS};
pub use store::{MigrationStore, PgStore, SqlExec, SqliteStore};
