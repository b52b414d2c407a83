//! # Webhook Subcommand
//!
//! Drives one webhook event through its delivery loop. Retry delays come
//! from the `webhook.retry_policy` section of the configuration file.
//!
//! - `process` — PENDING or due RETRY → PROCESSING.
//! - `complete` — PROCESSING → COMPLETED.
//! - `fail` — PROCESSING → RETRY, or FAILED once the retry budget is spent.
//! - `retry` — Schedule the next attempt directly.
//! - `status` — Show delivery state.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use ecompta_core::Timestamp;
use ecompta_state::{LifecycleStatus, StatusGuard, WebhookEvent, WebhookStatus};

use crate::{load_record, print_transitions, save_record, RecordArgs};

/// Arguments for the `ecompta webhook` subcommand.
#[derive(Args, Debug)]
pub struct WebhookArgs {
    #[command(subcommand)]
    pub command: WebhookCommand,
}

/// Webhook subcommands.
#[derive(Subcommand, Debug)]
pub enum WebhookCommand {
    /// Start a delivery attempt.
    Process {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Record a successful delivery.
    Complete {
        #[command(flatten)]
        record: RecordArgs,
        /// HTTP status code returned by the endpoint.
        #[arg(long)]
        code: u16,
        /// Response body.
        #[arg(long)]
        body: Option<String>,
        /// Round-trip time in milliseconds.
        #[arg(long, default_value_t = 0)]
        elapsed_ms: u64,
    },

    /// Record a failed delivery attempt.
    Fail {
        #[command(flatten)]
        record: RecordArgs,
        /// Error reported by the attempt.
        #[arg(long)]
        error: String,
    },

    /// Schedule the next delivery attempt.
    Retry {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Show current delivery state.
    Status {
        /// JSON snapshot of the event.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Execute the webhook subcommand.
pub fn run_webhook(args: &WebhookArgs, guard: &StatusGuard) -> Result<u8> {
    match &args.command {
        WebhookCommand::Process { record } => {
            let mut event: WebhookEvent = load_record(&record.file)?;
            event.begin_processing(record.now())?;
            save_record(&event, record.output())?;
            println!("OK: {} event processing", event.event_type);
            Ok(0)
        }

        WebhookCommand::Complete {
            record,
            code,
            body,
            elapsed_ms,
        } => {
            let mut event: WebhookEvent = load_record(&record.file)?;
            event.complete(*code, body.clone(), *elapsed_ms, record.now())?;
            save_record(&event, record.output())?;
            println!("OK: {} event delivered ({code})", event.event_type);
            Ok(0)
        }

        WebhookCommand::Fail { record, error } => {
            let mut event: WebhookEvent = load_record(&record.file)?;
            let outcome = guard.record_delivery_failure(&mut event, error.as_str(), record.now())?;
            save_record(&event, record.output())?;
            print_outcome(&event, outcome);
            Ok(0)
        }

        WebhookCommand::Retry { record } => {
            let mut event: WebhookEvent = load_record(&record.file)?;
            guard.schedule_retry(&mut event, record.now())?;
            save_record(&event, record.output())?;
            print_outcome(&event, event.state.name());
            Ok(0)
        }

        WebhookCommand::Status { file } => cmd_status(file),
    }
}

fn print_outcome(event: &WebhookEvent, outcome: &str) {
    match event.next_retry() {
        Some(next) => println!(
            "OK: {} event {outcome} ({}/{}), next attempt at {next}",
            event.event_type, event.retry_count, event.max_retries
        ),
        None => println!(
            "OK: {} event {outcome} ({}/{})",
            event.event_type, event.retry_count, event.max_retries
        ),
    }
}

fn cmd_status(file: &Path) -> Result<u8> {
    let event: WebhookEvent = load_record(file)?;

    println!("Webhook: {} from {} ({})", event.event_type, event.event_source, event.company_id);
    println!("  URL: {}", event.webhook_url);
    println!("  State: {}", event.state.name());
    println!("  Retries: {}/{}", event.retry_count, event.max_retries);
    match &event.state {
        WebhookStatus::Retry { next_retry, last_error } => {
            println!("  Next retry: {next_retry}");
            if let Some(error) = last_error {
                println!("  Last error: {error}");
            }
        }
        WebhookStatus::Completed {
            processed_at,
            response_code,
            processing_time_ms,
            ..
        } => println!("  Delivered: {processed_at} ({response_code}, {processing_time_ms} ms)"),
        WebhookStatus::Failed { failed_at, error } => println!("  Failed: {failed_at} ({error})"),
        WebhookStatus::Pending | WebhookStatus::Processing { .. } => {}
    }
    println!("  Due now: {}", event.is_due(Timestamp::now()));
    println!("  Updated: {}", event.updated_at);
    print_transitions(&event.transitions);

    Ok(0)
}
