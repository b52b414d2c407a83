//! # Workflow Subcommand
//!
//! Workflow execution status changes. `timeout` applies the run-time limit
//! from `workflow.timeout_secs` and leaves the snapshot untouched when the
//! limit has not been reached.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use ecompta_state::{LifecycleStatus, StatusGuard, WorkflowExecution, WorkflowStatus};

use crate::{load_record, print_transitions, save_record, RecordArgs};

/// Arguments for the `ecompta workflow` subcommand.
#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommand,
}

/// Workflow subcommands.
#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// Start a pending execution (PENDING → RUNNING).
    Start {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Mark a running execution as completed.
    Complete {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Mark a running execution as failed.
    Fail {
        #[command(flatten)]
        record: RecordArgs,
        /// Error message.
        #[arg(long)]
        error: String,
    },

    /// Cancel a pending or running execution.
    Cancel {
        #[command(flatten)]
        record: RecordArgs,
        /// Why the execution was cancelled.
        #[arg(long)]
        reason: String,
    },

    /// Time out a running execution past the configured limit.
    Timeout {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Show current execution state.
    Status {
        /// JSON snapshot of the execution.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Execute the workflow subcommand.
pub fn run_workflow(args: &WorkflowArgs, guard: &StatusGuard) -> Result<u8> {
    let (record, execution) = match &args.command {
        WorkflowCommand::Status { file } => return cmd_status(file),
        WorkflowCommand::Timeout { record } => {
            let mut execution: WorkflowExecution = load_record(&record.file)?;
            if !guard.enforce_timeout(&mut execution, record.now()) {
                println!("execution {} within limit ({})", execution.id, execution.state.name());
                return Ok(0);
            }
            (record, execution)
        }
        WorkflowCommand::Start { record } => {
            let mut execution: WorkflowExecution = load_record(&record.file)?;
            execution.start(record.now())?;
            (record, execution)
        }
        WorkflowCommand::Complete { record } => {
            let mut execution: WorkflowExecution = load_record(&record.file)?;
            execution.complete(record.now())?;
            (record, execution)
        }
        WorkflowCommand::Fail { record, error } => {
            let mut execution: WorkflowExecution = load_record(&record.file)?;
            execution.fail(error.as_str(), record.now())?;
            (record, execution)
        }
        WorkflowCommand::Cancel { record, reason } => {
            let mut execution: WorkflowExecution = load_record(&record.file)?;
            execution.cancel(reason.as_str(), record.now())?;
            (record, execution)
        }
    };

    save_record(&execution, record.output())?;
    println!(
        "OK: execution {} of {} is {}",
        execution.id,
        execution.workflow_name,
        execution.state.name()
    );
    Ok(0)
}

fn cmd_status(file: &Path) -> Result<u8> {
    let execution: WorkflowExecution = load_record(file)?;

    println!("Execution: {} ({})", execution.id, execution.company_id);
    println!("  Workflow: {}", execution.workflow_name);
    println!("  State: {}", execution.state.name());
    if let Some(user) = execution.triggered_by {
        println!("  Triggered by: {user}");
    }
    if let Some(started) = execution.started_at() {
        println!("  Started: {started}");
    }
    if let Some(finished) = execution.finished_at() {
        println!("  Finished: {finished}");
    }
    if let Some(duration) = execution.duration() {
        println!("  Duration: {}s", duration.num_seconds());
    }
    match &execution.state {
        WorkflowStatus::Failed { error, .. } => println!("  Error: {error}"),
        WorkflowStatus::Cancelled { reason, .. } => println!("  Reason: {reason}"),
        _ => {}
    }
    println!("  Updated: {}", execution.updated_at);
    print_transitions(&execution.transitions);

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ecompta_core::{CompanyId, Timestamp};
    use ecompta_state::RetryPolicy;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn write_execution(dir: &Path) -> PathBuf {
        let execution = WorkflowExecution::new("monthly_close", CompanyId(4), ts("2024-06-30T23:00:00Z"));
        let path = dir.join("execution.json");
        save_record(&execution, &path).unwrap();
        path
    }

    fn record(file: &Path, at: &str) -> RecordArgs {
        RecordArgs {
            file: file.to_path_buf(),
            out: None,
            at: Some(ts(at)),
        }
    }

    fn run(command: WorkflowCommand, guard: &StatusGuard) -> Result<u8> {
        run_workflow(&WorkflowArgs { command }, guard)
    }

    #[test]
    fn workflow_start_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_execution(dir.path());
        let guard = StatusGuard::default();

        run(WorkflowCommand::Start { record: record(&path, "2024-07-01T00:00:00Z") }, &guard).unwrap();
        run(WorkflowCommand::Complete { record: record(&path, "2024-07-01T00:05:00Z") }, &guard).unwrap();

        let execution: WorkflowExecution = load_record(&path).unwrap();
        assert_eq!(execution.state.name(), "COMPLETED");
        assert_eq!(execution.duration(), Some(Duration::minutes(5)));
    }

    #[test]
    fn workflow_complete_without_start_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_execution(dir.path());
        let err = run(
            WorkflowCommand::Complete { record: record(&path, "2024-07-01T00:05:00Z") },
            &StatusGuard::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PENDING"));
    }

    #[test]
    fn workflow_timeout_uses_configured_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_execution(dir.path());
        let guard = StatusGuard::new(RetryPolicy::default(), Duration::minutes(10));

        run(WorkflowCommand::Start { record: record(&path, "2024-07-01T00:00:00Z") }, &guard).unwrap();

        run(WorkflowCommand::Timeout { record: record(&path, "2024-07-01T00:09:00Z") }, &guard).unwrap();
        let execution: WorkflowExecution = load_record(&path).unwrap();
        assert_eq!(execution.state.name(), "RUNNING");

        run(WorkflowCommand::Timeout { record: record(&path, "2024-07-01T00:11:00Z") }, &guard).unwrap();
        let execution: WorkflowExecution = load_record(&path).unwrap();
        assert_eq!(execution.state.name(), "TIMEOUT");
    }

    #[test]
    fn workflow_cancel_then_fail_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_execution(dir.path());
        let guard = StatusGuard::default();

        run(
            WorkflowCommand::Cancel {
                record: record(&path, "2024-07-01T00:00:00Z"),
                reason: "superseded".to_string(),
            },
            &guard,
        )
        .unwrap();
        assert!(run(
            WorkflowCommand::Fail {
                record: record(&path, "2024-07-01T00:01:00Z"),
                error: "late".to_string(),
            },
            &guard,
        )
        .is_err());
    }
}
