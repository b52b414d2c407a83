//! # ecompta-cli — Lifecycle Transitions from the Command Line
//!
//! Provides the `ecompta` command-line interface. Each subcommand reads one
//! JSON record snapshot, applies a single guarded transition through
//! [`ecompta_state::StatusGuard`] or the record's own methods, and writes the
//! snapshot back.
//!
//! ## Subcommands
//!
//! - `ecompta period` — close, lock, status.
//! - `ecompta exercise` — begin, totals, check, close, status.
//! - `ecompta consent` — withdraw, status.
//! - `ecompta webhook` — process, complete, fail, retry, status.
//! - `ecompta workflow` — start, complete, fail, cancel, timeout, status.
//!
//! ```bash
//! ecompta period close --file period-2024.json --actor 7
//! ecompta -v --config lifecycle.yaml webhook retry --file event.json
//! ```
//!
//! Handlers return the process exit code. Business rules live in
//! `ecompta-state`; nothing here decides whether a transition is legal.

pub mod consent;
pub mod exercise;
pub mod period;
pub mod webhook;
pub mod workflow;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;

use ecompta_core::Timestamp;
use ecompta_state::TransitionRecord;

/// Snapshot location and effective time shared by every mutating action.
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// JSON snapshot of the record.
    #[arg(long)]
    pub file: PathBuf,

    /// Write the updated snapshot here instead of overwriting `--file`.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Effective time of the transition (RFC 3339, UTC). Defaults to now.
    #[arg(long)]
    pub at: Option<Timestamp>,
}

impl RecordArgs {
    /// The instant stamped on the record.
    pub fn now(&self) -> Timestamp {
        self.at.unwrap_or_else(Timestamp::now)
    }

    /// Where the updated snapshot is written.
    pub fn output(&self) -> &Path {
        self.out.as_deref().unwrap_or(&self.file)
    }
}

/// Read a record snapshot.
pub fn load_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read record: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse record: {}", path.display()))
}

/// Write a record snapshot as pretty-printed JSON.
pub fn save_record<T: Serialize>(record: &T, path: &Path) -> Result<()> {
    let mut json = serde_json::to_string_pretty(record)?;
    json.push('\n');
    std::fs::write(path, json)
        .with_context(|| format!("failed to write record: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "record written");
    Ok(())
}

/// Print the transition log in the indented form used by every `status` action.
pub fn print_transitions(transitions: &[TransitionRecord]) {
    println!("  Transitions: {}", transitions.len());
    for (i, t) in transitions.iter().enumerate() {
        let mut line = format!("    [{i}] {} → {} at {}", t.from, t.to, t.at);
        if let Some(actor) = t.actor {
            line.push_str(&format!(" by {actor}"));
        }
        if let Some(reason) = &t.reason {
            line.push_str(&format!(" ({reason})"));
        }
        println!("{line}");
    }
}
