//! Entity model shared by the embedded and centralized stores.

use async_trait::async_trait;
use sqlx::query_builder::Separated;
use sqlx::Postgres;

use crate::error::StoreError;

mod models;

pub use models::{
    Afk, AutoCommand, BanTemplate, CommandAlias, DiscordUser, Giveaway, GuildConfig, MultiGreet,
    MutedUser, Poll, PollVote, Quote, Reminder, Suggestion, UnbanTimer, UnmuteTimer, UserXpStats,
    Warning, WarningPunishment,
};

/// A persisted entity collection that can be moved between stores.
///
/// An implementation describes one table: its name, its column list, how to
/// read one row from the embedded store, and how to bind one row into a
/// destination multi-row insert. Column order is shared by [`Entity::read`]
/// and [`Entity::bind`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Table name, identical in both stores.
    const TABLE: &'static str;

    /// Column list, in read and bind order.
    const COLUMNS: &'static [&'static str];

    /// Read one row from the embedded store.
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;

    /// Bind one row into a destination multi-row insert.
    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>);
}

/// Read side of a bulk transfer.
#[async_trait]
pub trait EntitySource<T: Entity>: Send + Sync {
    /// Read the complete collection into memory.
    async fn read_all(&self) -> Result<Vec<T>, StoreError>;
}

/// Write side of a bulk transfer.
#[async_trait]
pub trait EntitySink<T: Entity>: Send + Sync {
    /// Delete every row of the collection, returning the number removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Write one batch. A batch either commits fully or not at all.
    async fn write_batch(&self, rows: &[T]) -> Result<(), StoreError>;
}
