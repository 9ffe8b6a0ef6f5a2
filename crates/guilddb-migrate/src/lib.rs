//! GuildDB Migrate - the cross-database migration engine.
//!
//! Moves a deployment's persisted state from the embedded SQLite store into
//! the centralized PostgreSQL store: applies pending schema migrations to
//! both sides, suspends referential-integrity enforcement on the destination,
//! bulk-copies every entity collection in dependency order, re-enables
//! enforcement, and dispatches post-migration repair hooks.
//!
//! The engine runs once at host startup behind a manual configuration gate;
//! see [`orchestrator::MigrationOrchestrator`].

pub mod constraint;
pub mod error;
pub mod hooks;
pub mod migrator;
pub mod orchestrator;
pub mod transfer;

pub use constraint::{suspend, SuspendGuard};
pub use error::{HookDispatchError, HookFailure, MigrateError, SchemaMigrationError, TransferError};
pub use hooks::{HookRegistry, PostMigrationHook};
pub use migrator::SchemaMigrator;
pub use orchestrator::{MigrationOrchestrator, MigrationSummary, Phase};
pub use transfer::{transfer, EntityDescriptor, TransferConfig, TransferReport};
