//! # Workflow Execution Lifecycle
//!
//! One run of an automated workflow (document approval, report generation,
//! reconciliation, ...).
//!
//! ```text
//! Pending ──start()──▶ Running ──complete()──▶ Completed
//!    │                    ├──────fail()──────▶ Failed
//!    │                    ├────time_out()────▶ Timeout
//!    └─────cancel()───────┴─────cancel()─────▶ Cancelled
//! ```
//!
//! All four outcomes are terminal. Status is never assigned directly; every
//! change goes through a guarded transition.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use ecompta_core::{CompanyId, ExecutionId, Timestamp, UserId};

use crate::error::TransitionError;
use crate::record::{self, LifecycleStatus, TransitionRecord};

const ENTITY: &str = "workflow_execution";

/// Lifecycle state of a workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Queued, not started.
    Pending,
    /// Running.
    Running {
        /// When the run started.
        started_at: Timestamp,
    },
    /// Finished successfully.
    Completed {
        /// When the run started.
        started_at: Timestamp,
        /// When the run finished.
        finished_at: Timestamp,
    },
    /// Finished with an error.
    Failed {
        /// When the run started.
        started_at: Timestamp,
        /// When the failure was recorded.
        finished_at: Timestamp,
        /// Error reported by the step that failed.
        error: String,
    },
    /// Cancelled before or during the run.
    Cancelled {
        /// When the run started, if it did.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        started_at: Option<Timestamp>,
        /// When the cancellation was applied.
        finished_at: Timestamp,
        /// Why it was cancelled.
        reason: String,
    },
    /// Exceeded its time limit.
    Timeout {
        /// When the run started.
        started_at: Timestamp,
        /// When the timeout was detected.
        finished_at: Timestamp,
    },
}

impl LifecycleStatus for WorkflowStatus {
    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running { .. } => "RUNNING",
            Self::Completed { .. } => "COMPLETED",
            Self::Failed { .. } => "FAILED",
            Self::Cancelled { .. } => "CANCELLED",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running { .. })
    }
}

impl WorkflowStatus {
    fn started_at(&self) -> Option<Timestamp> {
        match self {
            Self::Pending => None,
            Self::Running { started_at }
            | Self::Completed { started_at, .. }
            | Self::Failed { started_at, .. }
            | Self::Timeout { started_at, .. } => Some(*started_at),
            Self::Cancelled { started_at, .. } => *started_at,
        }
    }

    fn finished_at(&self) -> Option<Timestamp> {
        match self {
            Self::Pending | Self::Running { .. } => None,
            Self::Completed { finished_at, .. }
            | Self::Failed { finished_at, .. }
            | Self::Cancelled { finished_at, .. }
            | Self::Timeout { finished_at, .. } => Some(*finished_at),
        }
    }
}

/// A single execution of a named workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Execution identifier.
    pub id: ExecutionId,
    /// Name of the workflow definition being executed.
    pub workflow_name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// User who triggered the run, for manual triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<UserId>,
    /// Current state.
    pub state: WorkflowStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Refreshed by every applied transition.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl WorkflowExecution {
    /// Queue a new `PENDING` execution.
    pub fn new(workflow_name: impl Into<String>, company_id: CompanyId, now: Timestamp) -> Self {
        Self {
            id: ExecutionId::new(),
            workflow_name: workflow_name.into(),
            company_id,
            triggered_by: None,
            state: WorkflowStatus::Pending,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        }
    }

    /// When the run started.
    pub fn started_at(&self) -> Option<Timestamp> {
        self.state.started_at()
    }

    /// When the run reached a terminal state.
    pub fn finished_at(&self) -> Option<Timestamp> {
        self.state.finished_at()
    }

    /// Wall time between start and finish, for finished runs that started.
    pub fn duration(&self) -> Option<Duration> {
        Some(self.finished_at()?.since(self.started_at()?))
    }

    /// PENDING → RUNNING.
    pub fn start(&mut self, now: Timestamp) -> Result<(), TransitionError> {
        if self.state != WorkflowStatus::Pending {
            return Err(self.reject("RUNNING", "only a PENDING execution can start"));
        }
        self.apply(WorkflowStatus::Running { started_at: now }, None, now);
        Ok(())
    }

    /// RUNNING → COMPLETED.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), TransitionError> {
        let started_at = self.require_running("COMPLETED")?;
        self.apply(
            WorkflowStatus::Completed {
                started_at,
                finished_at: now,
            },
            None,
            now,
        );
        Ok(())
    }

    /// RUNNING → FAILED with the reported error.
    pub fn fail(&mut self, error: impl Into<String>, now: Timestamp) -> Result<(), TransitionError> {
        let started_at = self.require_running("FAILED")?;
        let error = error.into();
        self.apply(
            WorkflowStatus::Failed {
                started_at,
                finished_at: now,
                error: error.clone(),
            },
            Some(error),
            now,
        );
        Ok(())
    }

    /// PENDING or RUNNING → CANCELLED.
    pub fn cancel(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(self.reject("CANCELLED", "execution already finished"));
        }
        let reason = reason.into();
        let started_at = self.state.started_at();
        self.apply(
            WorkflowStatus::Cancelled {
                started_at,
                finished_at: now,
                reason: reason.clone(),
            },
            Some(reason),
            now,
        );
        Ok(())
    }

    /// RUNNING → TIMEOUT.
    pub fn time_out(&mut self, now: Timestamp) -> Result<(), TransitionError> {
        let started_at = self.require_running("TIMEOUT")?;
        self.apply(
            WorkflowStatus::Timeout {
                started_at,
                finished_at: now,
            },
            None,
            now,
        );
        Ok(())
    }

    /// Enforce a run-time limit.
    ///
    /// A RUNNING execution that started more than `limit` before `now` is
    /// moved to TIMEOUT and `true` is returned. Any other execution is left
    /// untouched.
    pub fn check_timeout(&mut self, now: Timestamp, limit: Duration) -> bool {
        match self.state {
            WorkflowStatus::Running { started_at } if now.since(started_at) > limit => {
                self.apply(
                    WorkflowStatus::Timeout {
                        started_at,
                        finished_at: now,
                    },
                    Some(format!("exceeded {}s limit", limit.num_seconds())),
                    now,
                );
                true
            }
            _ => false,
        }
    }

    fn require_running(&self, to: &'static str) -> Result<Timestamp, TransitionError> {
        match self.state {
            WorkflowStatus::Running { started_at } => Ok(started_at),
            _ => Err(self.reject(to, "execution is not RUNNING")),
        }
    }

    fn reject(&self, to: &'static str, reason: &str) -> TransitionError {
        TransitionError::rejected(ENTITY, self.state.name(), to, reason)
    }

    fn apply(&mut self, to: WorkflowStatus, reason: Option<String>, now: Timestamp) {
        record::append(
            &mut self.transitions,
            ENTITY,
            self.state.name(),
            to.name(),
            now,
            self.triggered_by,
            reason,
        );
        self.state = to;
        self.updated_at = now;
    }
}
