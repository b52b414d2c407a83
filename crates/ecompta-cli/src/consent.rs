//! # Consent Subcommand
//!
//! Consent withdrawal. Withdrawal always succeeds; repeating it refreshes
//! the withdrawal date and method.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use ecompta_state::{ConsentMethod, ConsentRecord, LifecycleStatus, StatusGuard};

use crate::{load_record, print_transitions, save_record, RecordArgs};

/// Arguments for the `ecompta consent` subcommand.
#[derive(Args, Debug)]
pub struct ConsentArgs {
    #[command(subcommand)]
    pub command: ConsentCommand,
}

/// Consent subcommands.
#[derive(Subcommand, Debug)]
pub enum ConsentCommand {
    /// Withdraw a consent (→ WITHDRAWN).
    Withdraw {
        #[command(flatten)]
        record: RecordArgs,
        /// How the withdrawal was requested (web-form, email, paper, verbal, api).
        #[arg(long)]
        method: ConsentMethod,
        /// Client address of the request.
        #[arg(long)]
        ip: Option<String>,
    },

    /// Show current consent state.
    Status {
        /// JSON snapshot of the consent record.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Execute the consent subcommand.
pub fn run_consent(args: &ConsentArgs, guard: &StatusGuard) -> Result<u8> {
    match &args.command {
        ConsentCommand::Withdraw { record, method, ip } => {
            let mut consent: ConsentRecord = load_record(&record.file)?;
            guard.withdraw(&mut consent, *method, ip.clone(), record.now());
            save_record(&consent, record.output())?;
            println!("OK: consent of {} withdrawn", consent.email);
            Ok(0)
        }

        ConsentCommand::Status { file } => cmd_status(file),
    }
}

fn cmd_status(file: &Path) -> Result<u8> {
    let consent: ConsentRecord = load_record(file)?;

    println!("Consent: {} ({})", consent.email, consent.company_id);
    println!("  Type: {:?}", consent.consent_type);
    println!("  State: {}", consent.state.name());
    println!("  Active: {}", consent.is_active());
    println!("  Given: {}", consent.consent_given());
    if let Some(date) = consent.consent_date() {
        println!("  Consent date: {date}");
    }
    if let Some(date) = consent.withdrawal_date() {
        println!("  Withdrawal date: {date}");
    }
    println!("  Updated: {}", consent.updated_at);
    print_transitions(&consent.transitions);

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecompta_core::{CompanyId, Timestamp};
    use ecompta_state::ConsentType;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn consent_withdraw_twice_overwrites_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consent.json");
        let consent = ConsentRecord::record(
            CompanyId(2),
            "a.diallo@example.sn",
            ConsentType::Marketing,
            true,
            ConsentMethod::WebForm,
            Some("10.0.0.1".to_string()),
            ts("2024-01-01T00:00:00Z"),
        );
        save_record(&consent, &path).unwrap();
        let guard = StatusGuard::default();

        for at in ["2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z"] {
            let args = ConsentArgs {
                command: ConsentCommand::Withdraw {
                    record: RecordArgs {
                        file: path.clone(),
                        out: None,
                        at: Some(ts(at)),
                    },
                    method: ConsentMethod::Email,
                    ip: None,
                },
            };
            assert_eq!(run_consent(&args, &guard).unwrap(), 0);
        }

        let consent: ConsentRecord = load_record(&path).unwrap();
        assert!(!consent.is_active());
        assert!(!consent.consent_given());
        assert_eq!(consent.withdrawal_date(), Some(ts("2024-03-02T00:00:00Z")));
    }

    #[test]
    fn consent_status_on_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConsentArgs {
            command: ConsentCommand::Status {
                file: dir.path().join("nope.json"),
            },
        };
        assert!(run_consent(&args, &StatusGuard::default()).is_err());
    }
}
