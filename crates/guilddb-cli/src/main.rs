//! GuildDB migration host.
//!
//! When the migrate flag is set the process blocks on the migration run
//! before it would serve anything else; a failed run aborts startup so the
//! host never serves partially migrated state.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guilddb_core::{MigrateConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_IN_FLIGHT};
use guilddb_migrate::MigrationOrchestrator;

/// Command-line arguments for the migration host.
#[derive(Parser, Debug)]
#[command(name = "guilddb")]
#[command(version, about = "GuildDB storage migration host", long_about = None)]
struct Args {
    /// Run the source-to-destination migration. Flip this back off after a
    /// successful run.
    #[arg(long)]
    migrate: bool,

    /// Installation token; its first segment locates the embedded store.
    #[arg(long, default_value = "")]
    token: String,

    /// Destination PostgreSQL connection string.
    #[arg(long, default_value = "")]
    destination_url: String,

    /// Number of deployment instances sharing this host.
    #[arg(long, default_value_t = 1)]
    instances: u32,

    /// Explicit path to the embedded source database, overriding derivation
    /// from the token.
    #[arg(long)]
    source_path: Option<PathBuf>,

    /// Rows per transfer batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Ceiling on concurrently in-flight batch writes.
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    max_in_flight: usize,
}

impl Args {
    /// Convert command-line arguments to a migration configuration.
    fn into_config(self) -> MigrateConfig {
        let mut config = MigrateConfig::new(self.token, self.destination_url)
            .with_migrate_on_start(self.migrate)
            .with_instances(self.instances)
            .with_batch_size(self.batch_size)
            .with_max_in_flight(self.max_in_flight);
        if let Some(path) = self.source_path {
            config = config.with_source_path(path);
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guilddb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting guilddb");

    let args = Args::parse();
    let config = args.into_config();

    if !config.migrate_on_start {
        tracing::info!("migrate flag is off, nothing to do");
        return ExitCode::SUCCESS;
    }

    let orchestrator = MigrationOrchestrator::new(config);

    tokio::select! {
        result = orchestrator.run() => match result {
            Ok(summary) => {
                tracing::info!(
                    collections = summary.reports.len(),
                    total_rows = summary.total_rows,
                    "migration finished"
                );
                ExitCode::SUCCESS
            }
            Err(error) => {
                tracing::error!(%error, "migration failed, aborting startup");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("shutdown signal received, abandoning migration run");
            ExitCode::FAILURE
        }
    }
}
