//! Migration configuration and source-path derivation.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ConfigError;

/// Default rows per transfer batch.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Default ceiling on concurrently in-flight batch writes.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 50;

/// Canonical length of the token's client-id segment, including padding.
const TOKEN_SEGMENT_LEN: usize = 28;

/// File name of the embedded store.
const SOURCE_DB_FILE: &str = "guilddb.db";

/// Top-level configuration for a migration run.
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// The manual migration gate. Must be flipped back off by the operator
    /// after a successful run, or the next start deletes and reloads the
    /// destination again.
    pub migrate_on_start: bool,

    /// Installation token. Its first segment encodes the client id used in
    /// the default source path.
    pub token: String,

    /// Number of deployment instances sharing this host.
    pub instances: u32,

    /// Explicit source database path, overriding derivation from the token.
    pub source_path: Option<PathBuf>,

    /// Destination PostgreSQL connection string.
    pub destination_url: String,

    /// Rows per transfer batch.
    pub batch_size: usize,

    /// Ceiling on concurrently in-flight batch writes.
    pub max_in_flight: usize,
}

impl MigrateConfig {
    /// Create a configuration with default tuning.
    pub fn new(token: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            migrate_on_start: false,
            token: token.into(),
            instances: 1,
            source_path: None,
            destination_url: destination_url.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Enable the migration gate.
    pub fn with_migrate_on_start(mut self, migrate: bool) -> Self {
        self.migrate_on_start = migrate;
        self
    }

    /// Set the number of deployment instances.
    pub fn with_instances(mut self, instances: u32) -> Self {
        self.instances = instances.max(1);
        self
    }

    /// Override the derived source database path.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Set the rows per transfer batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the in-flight batch ceiling.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Validate connection parameters. An empty destination is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination_url.trim().is_empty() {
            return Err(ConfigError::MissingDestination);
        }
        Ok(())
    }

    /// Resolve the path of the embedded source database.
    ///
    /// An explicit override wins. Multi-instance deployments share one file
    /// in the home directory; single-instance deployments get a per-client
    /// directory keyed by the id decoded from the installation token, under
    /// `~/.local/share` on Unix and the platform config directory elsewhere.
    pub fn source_db_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.source_path {
            return Ok(path.clone());
        }

        if self.instances > 1 {
            let home = dirs::home_dir().ok_or(ConfigError::UnresolvedDirectory("home"))?;
            return Ok(home.join(SOURCE_DB_FILE));
        }

        let client_id = client_id_from_token(&self.token)?;
        let base = if cfg!(unix) {
            dirs::home_dir()
                .ok_or(ConfigError::UnresolvedDirectory("home"))?
                .join(".local/share")
        } else {
            dirs::config_dir().ok_or(ConfigError::UnresolvedDirectory("config"))?
        };

        Ok(base
            .join("guilddb")
            .join(client_id)
            .join("data")
            .join(SOURCE_DB_FILE))
    }
}

/// Decode the client id from the first base64 segment of an installation
/// token.
///
/// The issuing platform strips base64 padding from the segment; it is padded
/// back out to the canonical 28 characters when its length is not a multiple
/// of four before decoding.
pub fn client_id_from_token(token: &str) -> Result<String, ConfigError> {
    let segment = token.split('.').next().unwrap_or("");
    if segment.is_empty() {
        return Err(ConfigError::MissingToken);
    }

    let mut segment = segment.to_string();
    if segment.len() < TOKEN_SEGMENT_LEN && segment.len() % 4 != 0 {
        let pad = TOKEN_SEGMENT_LEN - segment.len();
        segment.extend(std::iter::repeat('=').take(pad));
    }

    let decoded = STANDARD.decode(segment.as_bytes())?;
    String::from_utf8(decoded).map_err(|_| ConfigError::BadClientId)
}
