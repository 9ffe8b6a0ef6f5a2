//! Post-migration data-repair hooks.
//!
//! A hook is bound to exactly one migration id and runs after that migration
//! has been newly applied to the destination. The registry is built
//! explicitly at startup; there is no runtime type scanning.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use guilddb_core::schema::GUILD_PREFIX_MIGRATION;
use guilddb_core::{MigrationRecord, PgStore, SqlExec, StoreError};

use crate::error::{HookDispatchError, HookFailure};

/// Repair logic bound to one schema migration.
///
/// Hooks run with at-least-once semantics: a re-run after a partial failure
/// may invoke them again for the same migration, so they must be idempotent.
#[async_trait]
pub trait PostMigrationHook: Send + Sync {
    /// Id of the migration this hook repairs after.
    fn migration_id(&self) -> &'static str;

    /// Name used in logs and aggregated errors.
    fn name(&self) -> &'static str;

    /// Run the repair against the destination store.
    async fn run(&self, migration_id: &str, destination: &PgStore) -> Result<(), StoreError>;
}

/// Static registry mapping migration id to its repair hooks.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<&'static str, Vec<Arc<dyn PostMigrationHook>>>,
}

impl HookRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in hook registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BackfillGuildPrefix));
        registry
    }

    /// Bind a hook under its declared migration id.
    pub fn register(&mut self, hook: Arc<dyn PostMigrationHook>) {
        self.hooks.entry(hook.migration_id()).or_default().push(hook);
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Invoke every hook bound to each newly applied migration.
    ///
    /// Hooks run sequentially. Every bound hook is attempted; failures are
    /// logged as they happen and aggregated into one error afterwards.
    pub async fn dispatch(
        &self,
        applied: &[MigrationRecord],
        destination: &PgStore,
    ) -> Result<(), HookDispatchError> {
        let mut failures = Vec::new();

        for record in applied {
            let Some(hooks) = self.hooks.get(record.id.as_str()) else {
                continue;
            };
            for hook in hooks {
                info!(
                    migration = %record.id,
                    hook = hook.name(),
                    "running post-migration hook"
                );
                if let Err(err) = hook.run(&record.id, destination).await {
                    error!(
                        migration = %record.id,
                        hook = hook.name(),
                        error = %err,
                        "post-migration hook failed"
                    );
                    failures.push(HookFailure {
                        migration_id: record.id.clone(),
                        hook: hook.name().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HookDispatchError { failures })
        }
    }
}

/// Backfills the guild prefix column added by [`GUILD_PREFIX_MIGRATION`].
///
/// Rows created before the column existed carry NULL; they get the stock
/// prefix. Safe to run any number of times.
struct BackfillGuildPrefix;

#[async_trait]
impl PostMigrationHook for BackfillGuildPrefix {
    fn migration_id(&self) -> &'static str {
        GUILD_PREFIX_MIGRATION
    }

    fn name(&self) -> &'static str {
        "backfill_guild_prefix"
    }

    async fn run(&self, _migration_id: &str, destination: &PgStore) -> Result<(), StoreError> {
        destination
            .execute_raw("UPDATE guild_configs SET prefix = '.' WHERE prefix IS NULL")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook {
        bound_to: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PostMigrationHook for CountingHook {
        fn migration_id(&self) -> &'static str {
            self.bound_to
        }

        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self, _migration_id: &str, _destination: &PgStore) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHook {
        bound_to: &'static str,
    }

    #[async_trait]
    impl PostMigrationHook for FailingHook {
        fn migration_id(&self) -> &'static str {
            self.bound_to
        }

        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _migration_id: &str, _destination: &PgStore) -> Result<(), StoreError> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    fn record(id: &str) -> MigrationRecord {
        MigrationRecord {
            id: id.to_string(),
            applied_at: Utc::now(),
        }
    }

    fn unreachable_destination() -> PgStore {
        PgStore::connect_lazy("postgres://localhost:1/unreachable").unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_invokes_only_bound_hooks() {
        let x_calls = Arc::new(AtomicUsize::new(0));
        let y_calls = Arc::new(AtomicUsize::new(0));

        let mut registry = HookRegistry::new();
        registry.register(Arc::new(CountingHook {
            bound_to: "X",
            calls: Arc::clone(&x_calls),
        }));
        registry.register(Arc::new(CountingHook {
            bound_to: "Y",
            calls: Arc::clone(&y_calls),
        }));

        registry
            .dispatch(&[record("X")], &unreachable_destination())
            .await
            .unwrap();

        assert_eq!(x_calls.load(Ordering::SeqCst), 1);
        assert_eq!(y_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_other_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));

        let mut registry = HookRegistry::new();
        registry.register(Arc::new(FailingHook { bound_to: "X" }));
        registry.register(Arc::new(CountingHook {
            bound_to: "X",
            calls: Arc::clone(&calls),
        }));
        registry.register(Arc::new(CountingHook {
            bound_to: "Y",
            calls: Arc::clone(&calls),
        }));

        let err = registry
            .dispatch(
                &[record("X"), record("Y")],
                &unreachable_destination(),
            )
            .await
            .unwrap_err();

        // Both surviving hooks still ran; only the failing one is reported.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].migration_id, "X");
        assert_eq!(err.failures[0].hook, "failing");
    }

    #[tokio::test]
    async fn test_dispatch_with_nothing_applied_is_a_no_op() {
        let registry = HookRegistry::builtin();
        registry
            .dispatch(&[], &unreachable_destination())
            .await
            .unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }
}
