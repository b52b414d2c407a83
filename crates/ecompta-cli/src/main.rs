//! # ecompta CLI entry point
//!
//! Parses command-line arguments, loads the lifecycle configuration and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ecompta_cli::consent::{run_consent, ConsentArgs};
use ecompta_cli::exercise::{run_exercise, ExerciseArgs};
use ecompta_cli::period::{run_period, PeriodArgs};
use ecompta_cli::webhook::{run_webhook, WebhookArgs};
use ecompta_cli::workflow::{run_workflow, WorkflowArgs};
use ecompta_state::{LifecycleConfig, StatusGuard};

/// eCompta lifecycle CLI.
///
/// Applies guarded status transitions (period closing, exercise closing,
/// consent withdrawal, webhook retries, workflow runs) to JSON record
/// snapshots.
#[derive(Parser, Debug)]
#[command(name = "ecompta", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the lifecycle configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Financial period closing and locking.
    Period(PeriodArgs),

    /// Fiscal exercise bookkeeping and closing.
    Exercise(ExerciseArgs),

    /// Consent withdrawal.
    Consent(ConsentArgs),

    /// Webhook delivery and retry scheduling.
    Webhook(WebhookArgs),

    /// Workflow execution status changes.
    Workflow(WorkflowArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = match &cli.config {
        Some(path) => LifecycleConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LifecycleConfig::default(),
    };
    tracing::debug!(?config, "lifecycle config");
    let guard = StatusGuard::from_config(&config);

    match cli.command {
        Commands::Period(args) => run_period(&args, &guard),
        Commands::Exercise(args) => run_exercise(&args, &guard),
        Commands::Consent(args) => run_consent(&args, &guard),
        Commands::Webhook(args) => run_webhook(&args, &guard),
        Commands::Workflow(args) => run_workflow(&args, &guard),
    }
}
