//! Embedded SQLite store handle.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::entity::{Entity, EntitySource};
use crate::error::StoreError;
use crate::schema::{history_ddl, Dialect, Migration, HISTORY_TABLE};
use crate::store::MigrationStore;

/// Handle to the embedded per-deployment SQLite store.
///
/// `rusqlite` connections are not `Sync`, so all access funnels through one
/// mutex and runs on the blocking pool; callers stay on the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the store at `path`, creating the file when absent.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_owned();
        tracing::debug!(path = %path.display(), "opening embedded store");
        let conn = tokio::task::spawn_blocking(move || Connection::open(path)).await??;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory store. Test fixtures.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(Connection::open_in_memory).await??;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn with_conn<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || f(&mut conn.lock())).await??;
        Ok(result)
    }
}

impl MigrationStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn ensure_history(&self) -> Result<(), StoreError> {
        let ddl = history_ddl(Dialect::Sqlite);
        self.with_conn(move |conn| conn.execute(&ddl, []).map(|_| ()))
            .await
    }

    async fn applied_ids(&self) -> Result<HashSet<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT id FROM {HISTORY_TABLE}"))?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<HashSet<_>, _>>()?;
            Ok(ids)
        })
        .await
    }

    async fn apply(
        &self,
        migration: &Migration,
        applied_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let migration = *migration;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql(Dialect::Sqlite))?;
            tx.execute(
                &format!("INSERT INTO {HISTORY_TABLE} (id, applied_at) VALUES (?1, ?2)"),
                params![migration.id, applied_at],
            )?;
            tx.commit()
        })
        .await
    }
}

#[async_trait]
impl<T: Entity> EntitySource<T> for SqliteStore {
    async fn read_all(&self) -> Result<Vec<T>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| T::read(row))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}
