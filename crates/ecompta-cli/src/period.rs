//! # Period Subcommand
//!
//! Financial period closing and locking.
//!
//! - `close` — OPEN → CLOSED.
//! - `lock` — OPEN or CLOSED → LOCKED, with a mandatory reason.
//! - `status` — Show the current state and transition log.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use ecompta_core::UserId;
use ecompta_state::{FinancialPeriod, LifecycleStatus, PeriodStatus, StatusGuard};

use crate::{load_record, print_transitions, save_record, RecordArgs};

/// Arguments for the `ecompta period` subcommand.
#[derive(Args, Debug)]
pub struct PeriodArgs {
    #[command(subcommand)]
    pub command: PeriodCommand,
}

/// Period subcommands.
#[derive(Subcommand, Debug)]
pub enum PeriodCommand {
    /// Close an open period (OPEN → CLOSED).
    Close {
        #[command(flatten)]
        record: RecordArgs,
        /// User closing the period.
        #[arg(long)]
        actor: u64,
    },

    /// Lock a period against any further change (→ LOCKED).
    Lock {
        #[command(flatten)]
        record: RecordArgs,
        /// User locking the period.
        #[arg(long)]
        actor: u64,
        /// Why the period is locked.
        #[arg(long)]
        reason: String,
    },

    /// Show current period state.
    Status {
        /// JSON snapshot of the period.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Execute the period subcommand.
pub fn run_period(args: &PeriodArgs, guard: &StatusGuard) -> Result<u8> {
    match &args.command {
        PeriodCommand::Close { record, actor } => {
            let mut period: FinancialPeriod = load_record(&record.file)?;
            guard.close_period(&mut period, UserId(*actor), record.now())?;
            save_record(&period, record.output())?;
            println!("OK: period {} closed", period.name);
            Ok(0)
        }

        PeriodCommand::Lock {
            record,
            actor,
            reason,
        } => {
            let mut period: FinancialPeriod = load_record(&record.file)?;
            period.lock(UserId(*actor), reason.as_str(), record.now())?;
            save_record(&period, record.output())?;
            println!("OK: period {} locked", period.name);
            Ok(0)
        }

        PeriodCommand::Status { file } => cmd_status(file, guard),
    }
}

fn cmd_status(file: &Path, guard: &StatusGuard) -> Result<u8> {
    let period: FinancialPeriod = load_record(file)?;

    println!("Period: {} ({})", period.name, period.company_id);
    println!("  State: {}", period.state);
    println!("  Range: {} .. {}", period.start_date, period.end_date);
    println!("  Standard: {} ({})", period.accounting_standard, period.country_code);
    println!("  Current: {}", period.is_current);
    println!("  Can close: {}", guard.can_close(&period));
    if let PeriodStatus::Locked {
        locked_at,
        locked_by,
        reason,
        ..
    } = &period.state
    {
        println!("  Locked: {locked_at} by {locked_by} ({reason})");
    }
    if let Some(closed_at) = period.closed_at() {
        println!("  Closed: {closed_at}");
    }
    println!("  Terminal: {}", period.state.is_terminal());
    println!("  Updated: {}", period.updated_at);
    print_transitions(&period.transitions);

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ecompta_core::{CompanyId, CountryCode, Timestamp};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn write_period(dir: &Path) -> PathBuf {
        let period = FinancialPeriod::open(
            CompanyId(3),
            "Exercice 2024",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            CountryCode::new("SN").unwrap(),
            "SYSCOHADA",
            ts("2024-01-01T00:00:00Z"),
        )
        .unwrap();
        let path = dir.join("period.json");
        save_record(&period, &path).unwrap();
        path
    }

    fn record(file: &Path, at: &str) -> RecordArgs {
        RecordArgs {
            file: file.to_path_buf(),
            out: None,
            at: Some(ts(at)),
        }
    }

    #[test]
    fn period_close_writes_closed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_period(dir.path());
        let args = PeriodArgs {
            command: PeriodCommand::Close {
                record: record(&path, "2025-01-10T09:00:00Z"),
                actor: 7,
            },
        };
        assert_eq!(run_period(&args, &StatusGuard::default()).unwrap(), 0);

        let period: FinancialPeriod = load_record(&path).unwrap();
        assert!(period.is_closed());
        assert_eq!(period.closed_at(), Some(ts("2025-01-10T09:00:00Z")));
        assert_eq!(period.updated_at, ts("2025-01-10T09:00:00Z"));
    }

    #[test]
    fn period_close_twice_fails_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_period(dir.path());
        let guard = StatusGuard::default();
        let close = PeriodArgs {
            command: PeriodCommand::Close {
                record: record(&path, "2025-01-10T09:00:00Z"),
                actor: 7,
            },
        };
        run_period(&close, &guard).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let again = PeriodArgs {
            command: PeriodCommand::Close {
                record: record(&path, "2025-01-11T09:00:00Z"),
                actor: 7,
            },
        };
        let err = run_period(&again, &guard).unwrap_err();
        assert!(err.to_string().contains("CLOSED"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn period_lock_to_separate_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_period(dir.path());
        let out = dir.path().join("locked.json");
        let args = PeriodArgs {
            command: PeriodCommand::Lock {
                record: RecordArgs {
                    out: Some(out.clone()),
                    ..record(&path, "2025-02-01T00:00:00Z")
                },
                actor: 1,
                reason: "tax audit".to_string(),
            },
        };
        run_period(&args, &StatusGuard::default()).unwrap();

        let original: FinancialPeriod = load_record(&path).unwrap();
        let locked: FinancialPeriod = load_record(&out).unwrap();
        assert!(!original.is_locked());
        assert!(locked.is_locked());
    }

    #[test]
    fn period_lock_requires_reason() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_period(dir.path());
        let args = PeriodArgs {
            command: PeriodCommand::Lock {
                record: record(&path, "2025-02-01T00:00:00Z"),
                actor: 1,
                reason: "  ".to_string(),
            },
        };
        assert!(run_period(&args, &StatusGuard::default()).is_err());
    }

    #[test]
    fn period_status_reads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_period(dir.path());
        let args = PeriodArgs {
            command: PeriodCommand::Status { file: path },
        };
        assert_eq!(run_period(&args, &StatusGuard::default()).unwrap(), 0);
    }
}
