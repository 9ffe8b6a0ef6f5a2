//! Referential-integrity suspension around bulk loads.
//!
//! With enforcement suspended, collections can be bulk-loaded in dependency
//! order without transactionally pre-loading parent rows. Leaving a store
//! with enforcement permanently off is a severe failure mode, so resumption
//! is guaranteed on every exit path.

use guilddb_core::{SqlExec, StoreError};
use tracing::{debug, error, warn};

const SUSPEND_SQL: &str = "SET session_replication_role = replica";
const RESUME_SQL: &str = "SET session_replication_role = DEFAULT";

/// Suspend constraint enforcement on `store`, returning a guard that must be
/// resumed once the bulk phase is over.
pub async fn suspend<E>(store: &E) -> Result<SuspendGuard<E>, StoreError>
where
    E: SqlExec + Clone + Send + Sync + 'static,
{
    store.execute_raw(SUSPEND_SQL).await?;
    debug!("constraint enforcement suspended");
    Ok(SuspendGuard {
        store: store.clone(),
        released: false,
    })
}

/// Guard over a store whose constraint enforcement is suspended.
///
/// Call [`SuspendGuard::resume`] on both the success and the failure path of
/// the bracketed phase. A guard dropped without it (panic, cancellation)
/// spawns a best-effort resume on the current runtime and logs a warning.
#[must_use = "constraint enforcement stays suspended until the guard is resumed"]
pub struct SuspendGuard<E>
where
    E: SqlExec + Clone + Send + Sync + 'static,
{
    store: E,
    released: bool,
}

impl<E> SuspendGuard<E>
where
    E: SqlExec + Clone + Send + Sync + 'static,
{
    /// Re-enable constraint enforcement.
    pub async fn resume(mut self) -> Result<(), StoreError> {
        self.released = true;
        self.store.execute_raw(RESUME_SQL).await?;
        debug!("constraint enforcement resumed");
        Ok(())
    }
}

impl<E> Drop for SuspendGuard<E>
where
    E: SqlExec + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!("suspend guard dropped without resume, scheduling constraint resume");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let store = self.store.clone();
            handle.spawn(async move {
                if let Err(err) = store.execute_raw(RESUME_SQL).await {
                    error!(error = %err, "failed to resume constraint enforcement");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingExec {
        statements: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SqlExec for RecordingExec {
        async fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
            self.statements.lock().push(sql.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_suspend_then_resume_issue_both_directives() {
        let exec = RecordingExec::default();
        let guard = suspend(&exec).await.unwrap();
        guard.resume().await.unwrap();

        let statements = exec.statements.lock();
        assert_eq!(statements.as_slice(), [SUSPEND_SQL, RESUME_SQL]);
    }

    #[tokio::test]
    async fn test_resume_runs_on_the_failure_path() {
        async fn failing_bulk_phase() -> Result<(), StoreError> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        let exec = RecordingExec::default();
        let guard = suspend(&exec).await.unwrap();
        let result = failing_bulk_phase().await;
        guard.resume().await.unwrap();
        assert!(result.is_err());

        let statements = exec.statements.lock();
        assert_eq!(statements.iter().filter(|s| *s == RESUME_SQL).count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_guard_schedules_resume() {
        let exec = RecordingExec::default();
        let guard = suspend(&exec).await.unwrap();
        drop(guard);

        // The fallback runs as a spawned task; yield until it lands.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        let statements = exec.statements.lock();
        assert_eq!(statements.last().map(String::as_str), Some(RESUME_SQL));
    }
}
