//! # Exercise Subcommand
//!
//! Fiscal exercise bookkeeping and closing. `check` exits with code 2 when
//! the exercise cannot be closed yet, so scripts can gate on it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use ecompta_core::Timestamp;
use ecompta_state::{FiscalExercise, LifecycleStatus, StatusGuard};

use crate::{load_record, print_transitions, save_record, RecordArgs};

/// Arguments for the `ecompta exercise` subcommand.
#[derive(Args, Debug)]
pub struct ExerciseArgs {
    #[command(subcommand)]
    pub command: ExerciseCommand,
}

/// Exercise subcommands.
#[derive(Subcommand, Debug)]
pub enum ExerciseCommand {
    /// Start bookkeeping (OPEN → IN_PROGRESS).
    Begin {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Update the running receipt and expense totals.
    Totals {
        #[command(flatten)]
        record: RecordArgs,
        /// Total receipts.
        #[arg(long)]
        receipts: Decimal,
        /// Total expenses.
        #[arg(long)]
        expenses: Decimal,
    },

    /// Report whether the exercise can be closed on a given day.
    Check {
        /// JSON snapshot of the exercise.
        #[arg(long)]
        file: PathBuf,
        /// Business date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Close the exercise (→ CLOSED) once its last day has passed.
    Close {
        #[command(flatten)]
        record: RecordArgs,
        /// Business date (YYYY-MM-DD). Defaults to the date of `--at`.
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Show current exercise state.
    Status {
        /// JSON snapshot of the exercise.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Execute the exercise subcommand.
pub fn run_exercise(args: &ExerciseArgs, guard: &StatusGuard) -> Result<u8> {
    match &args.command {
        ExerciseCommand::Begin { record } => {
            let mut exercise: FiscalExercise = load_record(&record.file)?;
            exercise.begin(record.now())?;
            save_record(&exercise, record.output())?;
            println!("OK: exercise {} in progress", exercise.year);
            Ok(0)
        }

        ExerciseCommand::Totals {
            record,
            receipts,
            expenses,
        } => {
            let mut exercise: FiscalExercise = load_record(&record.file)?;
            exercise.record_totals(*receipts, *expenses, record.now())?;
            save_record(&exercise, record.output())?;
            println!(
                "OK: exercise {} net result {} {}",
                exercise.year,
                exercise.net_result(),
                exercise.currency
            );
            Ok(0)
        }

        ExerciseCommand::Check { file, today } => {
            let exercise: FiscalExercise = load_record(file)?;
            let today = today.unwrap_or_else(|| Timestamp::now().date());
            if guard.can_close_exercise(&exercise, today) {
                println!("exercise {} can be closed on {today}", exercise.year);
                Ok(0)
            } else {
                println!("exercise {} cannot be closed on {today}", exercise.year);
                Ok(2)
            }
        }

        ExerciseCommand::Close { record, today } => {
            let mut exercise: FiscalExercise = load_record(&record.file)?;
            let now = record.now();
            exercise.close(today.unwrap_or_else(|| now.date()), now)?;
            save_record(&exercise, record.output())?;
            println!("OK: exercise {} closed", exercise.year);
            Ok(0)
        }

        ExerciseCommand::Status { file } => cmd_status(file),
    }
}

fn cmd_status(file: &Path) -> Result<u8> {
    let exercise: FiscalExercise = load_record(file)?;
    let today = Timestamp::now().date();

    println!("Exercise: {} ({})", exercise.year, exercise.company_id);
    println!("  State: {}", exercise.state);
    println!("  Range: {} .. {}", exercise.start_date, exercise.end_date);
    println!("  Currency: {}", exercise.currency);
    println!("  Net result: {}", exercise.net_result());
    println!("  In progress today: {}", exercise.is_in_progress(today));
    println!("  Terminal: {}", exercise.state.is_terminal());
    println!("  Updated: {}", exercise.updated_at);
    print_transitions(&exercise.transitions);

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecompta_core::CompanyId;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_exercise(dir: &Path) -> PathBuf {
        let exercise = FiscalExercise::new(
            CompanyId(5),
            2023,
            date(2023, 1, 1),
            date(2023, 12, 31),
            ts("2023-01-01T00:00:00Z"),
        )
        .unwrap();
        let path = dir.join("exercise.json");
        save_record(&exercise, &path).unwrap();
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
    fn exercise_check_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_exercise(dir.path());
        let guard = StatusGuard::default();

        let before_end = ExerciseArgs {
            command: ExerciseCommand::Check {
                file: path.clone(),
                today: Some(date(2023, 12, 31)),
            },
        };
        assert_eq!(run_exercise(&before_end, &guard).unwrap(), 2);

        let after_end = ExerciseArgs {
            command: ExerciseCommand::Check {
                file: path,
                today: Some(date(2024, 1, 1)),
            },
        };
        assert_eq!(run_exercise(&after_end, &guard).unwrap(), 0);
    }

    #[test]
    fn exercise_full_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_exercise(dir.path());
        let guard = StatusGuard::default();

        let begin = ExerciseArgs {
            command: ExerciseCommand::Begin {
                record: record(&path, "2023-02-01T00:00:00Z"),
            },
        };
        run_exercise(&begin, &guard).unwrap();

        let totals = ExerciseArgs {
            command: ExerciseCommand::Totals {
                record: record(&path, "2023-12-31T18:00:00Z"),
                receipts: Decimal::new(1_250_000, 0),
                expenses: Decimal::new(980_500, 0),
            },
        };
        run_exercise(&totals, &guard).unwrap();

        let close = ExerciseArgs {
            command: ExerciseCommand::Close {
                record: record(&path, "2024-01-15T08:00:00Z"),
                today: None,
            },
        };
        run_exercise(&close, &guard).unwrap();

        let exercise: FiscalExercise = load_record(&path).unwrap();
        assert!(exercise.is_closed());
        assert_eq!(exercise.net_result(), Decimal::new(269_500, 0));
        assert_eq!(exercise.transitions.len(), 2);
    }

    #[test]
    fn exercise_close_before_end_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_exercise(dir.path());
        let close = ExerciseArgs {
            command: ExerciseCommand::Close {
                record: record(&path, "2024-01-15T08:00:00Z"),
                today: Some(date(2023, 6, 30)),
            },
        };
        assert!(run_exercise(&close, &StatusGuard::default()).is_err());
        let exercise: FiscalExercise = load_record(&path).unwrap();
        assert!(!exercise.is_closed());
    }
}
