//! Centralized PostgreSQL store handle.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::entity::{Entity, EntitySink};
use crate::error::StoreError;
use crate::schema::{history_ddl, Dialect, Migration, HISTORY_TABLE};
use crate::store::{MigrationStore, SqlExec};

/// Handle to the centralized PostgreSQL store.
///
/// Wraps a connection pool; clones share the pool. The pool is sized by the
/// caller so that every in-flight bulk batch can hold a connection.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect eagerly with a pool of `max_connections`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        tracing::debug!(max_connections, "connecting to destination store");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Build a handle without connecting; the first query connects.
    pub fn connect_lazy(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().connect_lazy(url)?;
        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a unit of work. The command layer queries and mutates records
    /// through the returned transaction and commits to save.
    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        Ok(self.pool.begin().await?)
    }
}

#[async_trait]
impl SqlExec for PgStore {
    async fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }
}

impl MigrationStore for PgStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn ensure_history(&self) -> Result<(), StoreError> {
        self.execute_raw(&history_ddl(Dialect::Postgres)).await
    }

    async fn applied_ids(&self) -> Result<HashSet<String>, StoreError> {
        let ids: Vec<String> = sqlx::query_scalar(&format!("SELECT id FROM {HISTORY_TABLE}"))
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn apply(
        &self,
        migration: &Migration,
        applied_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::raw_sql(migration.sql(Dialect::Postgres))
            .execute(tx.as_mut())
            .await?;
        sqlx::query(&format!(
            "INSERT INTO {HISTORY_TABLE} (id, applied_at) VALUES ($1, $2)"
        ))
        .bind(migration.id)
        .bind(applied_at)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> EntitySink<T> for PgStore {
    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {}", T::TABLE))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn write_batch(&self, rows: &[T]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        builder.push_values(rows, |mut values, row| row.bind(&mut values));
        builder.build().execute(&self.pool).await?;
        Ok(())
    }
}
