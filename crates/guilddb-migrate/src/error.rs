//! Migration engine error taxonomy.
//!
//! Propagation policy: configuration and schema errors are fatal to the whole
//! run; a transfer error aborts the run after constraint suspension has been
//! reversed; hook failures are aggregated and surfaced without undoing
//! completed transfer work.

use guilddb_core::{ConfigError, StoreError};
use thiserror::Error;

/// A named schema migration failed to apply.
///
/// Migrations applied earlier in the same batch remain committed; each is
/// independently recorded in the history table.
#[derive(Debug, Error)]
#[error("schema migration {migration_id} failed: {source}")]
pub struct SchemaMigrationError {
    /// Id of the failing migration, or the history table name when the
    /// history itself could not be read or created.
    pub migration_id: String,
    /// Underlying store failure.
    #[source]
    pub source: StoreError,
}

/// A bulk transfer failed for a named entity collection.
///
/// The destination collection may be left empty or partially loaded;
/// re-running the transfer for that collection is the prescribed recovery,
/// since the leading delete makes re-entry safe.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reading the source collection failed.
    #[error("transfer of {entity} failed reading the source: {source}")]
    Read {
        /// Entity collection being transferred.
        entity: &'static str,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// Clearing the destination collection failed.
    #[error("transfer of {entity} failed clearing the destination: {source}")]
    Replace {
        /// Entity collection being transferred.
        entity: &'static str,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// A destination batch write failed.
    #[error("transfer of {entity} failed at batch {batch_index}: {source}")]
    Batch {
        /// Entity collection being transferred.
        entity: &'static str,
        /// Zero-based index of the failing batch.
        batch_index: usize,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },
}

impl TransferError {
    /// The entity collection this error names.
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Read { entity, .. } | Self::Replace { entity, .. } | Self::Batch { entity, .. } => {
                entity
            }
        }
    }
}

/// One failed post-migration hook invocation.
#[derive(Debug, Clone)]
pub struct HookFailure {
    /// Migration the hook was bound to.
    pub migration_id: String,
    /// Hook name.
    pub hook: String,
    /// Rendered failure.
    pub message: String,
}

/// Aggregation of post-migration hook failures.
///
/// Every bound hook is attempted before this is returned; one failing hook
/// never blocks the others.
#[derive(Debug, Error)]
#[error("{} post-migration hook(s) failed", .failures.len())]
pub struct HookDispatchError {
    /// The individual failures, in dispatch order.
    pub failures: Vec<HookFailure>,
}

/// Top-level error for a migration run.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Invalid or missing configuration. Aborts startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A schema migration failed.
    #[error(transparent)]
    Schema(#[from] SchemaMigrationError),

    /// A bulk transfer failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// One or more post-migration hooks failed.
    #[error(transparent)]
    Hooks(#[from] HookDispatchError),

    /// A store operation outside the phases above failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_names_entity_and_batch() {
        let err = TransferError::Batch {
            entity: "polls",
            batch_index: 3,
            source: StoreError::Sqlite(rusqlite::Error::InvalidQuery),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("polls"));
        assert!(rendered.contains("batch 3"));
        assert_eq!(err.entity(), "polls");
    }

    #[test]
    fn test_hook_dispatch_error_counts_failures() {
        let err = HookDispatchError {
            failures: vec![
                HookFailure {
                    migration_id: "X".into(),
                    hook: "backfill".into(),
                    message: "boom".into(),
                },
                HookFailure {
                    migration_id: "Y".into(),
                    hook: "reindex".into(),
                    message: "boom".into(),
                },
            ],
        };
        assert!(err.to_string().contains('2'));
    }
}
