// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scoutbook-Sync command-line entry point.
//!
//! Logs go to stderr as JSON; stdout carries only the one-line result summary.

use anyhow::Context;
use clap::Parser;
use scoutbook_sync::{
    cli::{self, CliOpts},
    config::Config,
    db::FirestoreDb,
    services::{verify_credentials, ScoutbookClient, SyncOrchestrator},
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let opts = match CliOpts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(opts.verbose());

    match run(&opts).await {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = format!("{:#}", e);
            tracing::error!(error = %message, "Sync aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(opts: &CliOpts) -> anyhow::Result<serde_json::Value> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let client = ScoutbookClient::from_config(&config)?;

    if opts.dry_run() {
        let result = verify_credentials(&client).await?;
        return Ok(cli::summarize(&result)?);
    }

    let db = FirestoreDb::new(&config.storage_project_id)
        .await
        .context("Failed to connect to Firestore")?;
    tracing::info!(project = %config.storage_project_id, "Connected to Firestore");

    let orchestrator = SyncOrchestrator::new(&config, client, db);
    Ok(cli::run_command(&opts.command(), &orchestrator).await?)
}

/// Initialize structured JSON logging on stderr.
fn init_logging(verbose: u8) {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in [
        format!("scoutbook_sync={}", cli::log_level(verbose)),
        "info".to_string(),
    ] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry().with(filter).with(format).init();
}
