//! Core error types.

use thiserror::Error;

/// Errors raised by store handles.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Embedded source store error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Destination store error.
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A blocking store task was cancelled or panicked.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The destination connection string was absent or empty.
    #[error("destination connection string must be provided")]
    MissingDestination,

    /// The installation token was absent or empty.
    #[error("installation token must be provided to derive the source path")]
    MissingToken,

    /// The token's client-id segment did not decode as base64.
    #[error("installation token segment is not valid base64: {0}")]
    BadTokenSegment(#[from] base64::DecodeError),

    /// The decoded client id was not valid UTF-8.
    #[error("installation token segment does not decode to a client id")]
    BadClientId,

    /// A platform base directory could not be resolved.
    #[error("cannot resolve the {0} directory")]
    UnresolvedDirectory(&'static str),
}
