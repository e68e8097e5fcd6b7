// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line surface.

use crate::db::DocumentStore;
use crate::error::{Result, SyncError};
use crate::services::SyncOrchestrator;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "scoutbook-sync",
    version = clap::crate_version!(),
    about = "Mirror Scoutbook roster and advancement data into Firestore"
)]
pub struct CliOpts {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Authenticate only; write nothing
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sync youth, adults and parents.
    SyncRoster,

    /// Sync advancement for a single scout.
    SyncScout {
        /// Scoutbook user ID of the scout
        user_id: String,
    },

    /// Sync unit calendar events.
    SyncEvents,

    /// Snapshot the unit dashboards.
    SyncDashboards,

    /// Roster, every scout, events, dashboards and calendars.
    SyncAll,
}

impl CliOpts {
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// The requested command; a bare invocation means a full sync.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::SyncAll)
    }
}

/// Crate log level for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Run a sync command and return its JSON summary.
pub async fn run_command<S: DocumentStore>(
    command: &Command,
    orchestrator: &SyncOrchestrator<S>,
) -> Result<Value> {
    match command {
        Command::SyncRoster => summarize(&orchestrator.sync_roster().await?),
        Command::SyncScout { user_id } => summarize(&orchestrator.sync_scout(user_id).await?),
        Command::SyncEvents => summarize(&orchestrator.sync_events().await?),
        Command::SyncDashboards => summarize(&orchestrator.sync_dashboards().await?),
        Command::SyncAll => summarize(&orchestrator.sync_all().await?),
    }
}

pub fn summarize<T: Serialize>(result: &T) -> Result<Value> {
    serde_json::to_value(result)
        .map_err(|e| SyncError::Internal(anyhow::anyhow!("Failed to encode summary: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_sync_all() {
        let opts = CliOpts::try_parse_from(["scoutbook-sync"]).unwrap();
        assert_eq!(opts.command(), Command::SyncAll);
        assert!(!opts.dry_run());
        assert_eq!(opts.verbose(), 0);
    }

    #[test]
    fn test_sync_scout_takes_user_id() {
        let opts = CliOpts::try_parse_from(["scoutbook-sync", "sync-scout", "12345"]).unwrap();
        assert_eq!(
            opts.command(),
            Command::SyncScout {
                user_id: "12345".to_string()
            }
        );

        assert!(CliOpts::try_parse_from(["scoutbook-sync", "sync-scout"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let opts =
            CliOpts::try_parse_from(["scoutbook-sync", "sync-events", "--dry-run", "-vv"]).unwrap();
        assert_eq!(opts.command(), Command::SyncEvents);
        assert!(opts.dry_run());
        assert_eq!(log_level(opts.verbose()), "trace");
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = CliOpts::try_parse_from(["scoutbook-sync", "sync-everything"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_help_is_not_an_error_exit() {
        let err = CliOpts::try_parse_from(["scoutbook-sync", "--help"]).unwrap_err();
        assert!(!err.use_stderr());
    }
}
