//! Top-level migration driver.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use guilddb_core::entity::{
    Afk, AutoCommand, BanTemplate, CommandAlias, DiscordUser, Giveaway, GuildConfig, MultiGreet,
    MutedUser, Poll, PollVote, Quote, Reminder, Suggestion, UnbanTimer, UnmuteTimer, UserXpStats,
    Warning, WarningPunishment,
};
use guilddb_core::{MigrateConfig, MigrationRecord, PgStore, SqliteStore};

use crate::constraint;
use crate::error::MigrateError;
use crate::hooks::HookRegistry;
use crate::migrator::SchemaMigrator;
use crate::transfer::{transfer, EntityDescriptor, TransferConfig, TransferReport};

/// Phase of a migration run.
///
/// A run moves strictly forward through these; `Failed` is reachable from
/// any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Applying schema migrations to both stores.
    SchemaSync,
    /// Constraint enforcement suspended on the destination.
    Suspended,
    /// Bulk-copying entity collections.
    Transferring,
    /// Constraint enforcement restored.
    Resumed,
    /// Post-migration hooks dispatched.
    Dispatched,
    /// Run complete.
    Done,
    /// Run aborted.
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::SchemaSync => "schema-sync",
            Phase::Suspended => "suspended",
            Phase::Transferring => "transferring",
            Phase::Resumed => "resumed",
            Phase::Dispatched => "dispatched",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct MigrationSummary {
    /// Migrations newly applied to the source store.
    pub applied_source: Vec<MigrationRecord>,
    /// Migrations newly applied to the destination store.
    pub applied_destination: Vec<MigrationRecord>,
    /// One report per transferred collection, in transfer order.
    pub reports: Vec<TransferReport>,
    /// Total rows written to the destination.
    pub total_rows: usize,
    /// Wall-clock duration of the whole run.
    pub duration: Duration,
}

/// Drives a full source-to-destination migration run.
///
/// One orchestrator run owns the destination exclusively; runs must be
/// serialized externally, which the host does by migrating at startup before
/// serving anything else.
pub struct MigrationOrchestrator {
    config: MigrateConfig,
    registry: HookRegistry,
}

impl MigrationOrchestrator {
    /// Build an orchestrator with the built-in hook registry.
    pub fn new(config: MigrateConfig) -> Self {
        Self {
            config,
            registry: HookRegistry::builtin(),
        }
    }

    /// Replace the hook registry.
    pub fn with_registry(mut self, registry: HookRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run the migration to completion.
    ///
    /// Blocks until every collection has been copied and every hook has run.
    /// After a successful run the operator must flip the migrate flag back
    /// off; the next start would otherwise delete and reload the destination
    /// again.
    pub async fn run(&self) -> Result<MigrationSummary, MigrateError> {
        let started = Instant::now();
        let mut phase = Phase::Idle;

        match self.drive(&mut phase, started).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                let failed_in = phase;
                phase = Phase::Failed;
                error!(%phase, %failed_in, error = %err, "migration run failed");
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        phase: &mut Phase,
        started: Instant,
    ) -> Result<MigrationSummary, MigrateError> {
        self.config.validate()?;
        let source_path = self.config.source_db_path()?;

        info!(source = %source_path.display(), "starting data migration");
        let source = SqliteStore::open(&source_path).await?;
        let destination =
            PgStore::connect(&self.config.destination_url, self.config.max_in_flight as u32)
                .await?;

        *phase = Phase::SchemaSync;
        let applied_source = SchemaMigrator::apply_migrations(&source).await?;
        let applied_destination = SchemaMigrator::apply_migrations(&destination).await?;

        *phase = Phase::Suspended;
        let guard = constraint::suspend(&destination)
            .await
            .map_err(MigrateError::Store)?;

        *phase = Phase::Transferring;
        let transfer_result = self.transfer_all(&source, &destination).await;

        // Enforcement comes back on whether the transfer phase succeeded or
        // not; only then does a transfer failure propagate.
        *phase = Phase::Resumed;
        guard.resume().await.map_err(MigrateError::Store)?;
        let reports = transfer_result?;

        *phase = Phase::Dispatched;
        self.registry
            .dispatch(&applied_destination, &destination)
            .await?;

        *phase = Phase::Done;
        let total_rows = reports.iter().map(|r| r.rows).sum();
        let summary = MigrationSummary {
            applied_source,
            applied_destination,
            reports,
            total_rows,
            duration: started.elapsed(),
        };
        info!(
            collections = summary.reports.len(),
            total_rows = summary.total_rows,
            duration_ms = summary.duration.as_millis() as u64,
            "data migration complete"
        );
        warn!(
            "copy complete; set the migrate flag to false before the next start, \
             or the destination will be deleted and reloaded again"
        );
        Ok(summary)
    }

    /// Transfer every collection, parents before children: the guild
    /// configuration root first, users next, then everything that references
    /// them, with poll votes after polls.
    async fn transfer_all(
        &self,
        source: &SqliteStore,
        destination: &PgStore,
    ) -> Result<Vec<TransferReport>, MigrateError> {
        let config = TransferConfig {
            batch_size: self.config.batch_size,
            max_in_flight: self.config.max_in_flight,
        };
        let mut reports = Vec::new();

        macro_rules! copy {
            ($ty:ty, $key:expr) => {
                reports.push(
                    transfer(source, destination, &EntityDescriptor::<$ty, _>::new($key), &config)
                        .await?,
                )
            };
        }

        copy!(GuildConfig, |g| g.guild_id);
        copy!(DiscordUser, |u| u.user_id);
        copy!(Afk, |a| a.id);
        copy!(AutoCommand, |a| a.id);
        copy!(BanTemplate, |b| b.id);
        copy!(CommandAlias, |c| c.id);
        copy!(Giveaway, |g| g.id);
        copy!(MultiGreet, |m| m.id);
        copy!(MutedUser, |m| m.id);
        copy!(Poll, |p| p.id);
        copy!(PollVote, |v| v.id);
        copy!(Quote, |q| q.id);
        copy!(Reminder, |r| r.id);
        copy!(Suggestion, |s| s.id);
        copy!(UnbanTimer, |t| t.id);
        copy!(UnmuteTimer, |t| t.id);
        // XP rows have composite identity, one row per user and guild.
        copy!(UserXpStats, |x| (x.user_id, x.guild_id));
        copy!(Warning, |w| w.id);
        copy!(WarningPunishment, |w| w.id);

        Ok(reports)
    }
}
