//! Store handles and the trait seams the migration engine drives them through.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::schema::{Dialect, Migration};

mod postgres;
mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Store-side operations needed by the schema migrator.
///
/// Both engines implement this, so one migrator runs against either side.
///
/// Uses native `async fn` in trait (not `#[async_trait]`): the `apply`
/// implementation drives a sqlx transaction, and the boxed-future desugaring
/// `#[async_trait]` produces trips a higher-ranked `Send`/`Executor` bound that
/// rustc cannot currently prove (rust-lang/rust#100013). This trait is only
/// ever used through concrete store types, so native async fn is sufficient.
#[allow(async_fn_in_trait)]
pub trait MigrationStore: Send + Sync {
    /// The SQL dialect this store speaks.
    fn dialect(&self) -> Dialect;

    /// Create the migration-history table when absent.
    async fn ensure_history(&self) -> Result<(), StoreError>;

    /// Ids of migrations already recorded as applied.
    async fn applied_ids(&self) -> Result<HashSet<String>, StoreError>;

    /// Apply one migration's schema change and record it, atomically.
    async fn apply(
        &self,
        migration: &Migration,
        applied_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Minimal raw-SQL seam, used for store-level directives such as constraint
/// suspension.
#[async_trait]
pub trait SqlExec: Send + Sync {
    /// Execute a statement that takes no parameters and returns no rows.
    async fn execute_raw(&self, sql: &str) -> Result<(), StoreError>;
}
