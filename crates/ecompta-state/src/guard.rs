//! # Status Guard
//!
//! One entry point for the lifecycle preconditions that the service layer
//! checks before persisting a record: period closing, exercise closing,
//! consent withdrawal, webhook retry scheduling and workflow timeouts.
//!
//! The guard holds only configuration. It performs no I/O and keeps no
//! state between calls; the caller supplies a loaded record and persists
//! the result.

use chrono::{Duration, NaiveDate};

use ecompta_core::{Timestamp, UserId};

use crate::config::LifecycleConfig;
use crate::consent::{ConsentMethod, ConsentRecord};
use crate::error::TransitionError;
use crate::exercise::FiscalExercise;
use crate::period::FinancialPeriod;
use crate::record::LifecycleStatus;
use crate::webhook::{RetryPolicy, WebhookEvent};
use crate::workflow::WorkflowExecution;

/// Precondition checks and guarded transitions across record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusGuard {
    retry_policy: RetryPolicy,
    workflow_timeout: Duration,
}

impl Default for StatusGuard {
    fn default() -> Self {
        Self::from_config(&LifecycleConfig::default())
    }
}

impl StatusGuard {
    /// Build a guard from explicit settings.
    pub fn new(retry_policy: RetryPolicy, workflow_timeout: Duration) -> Self {
        Self {
            retry_policy,
            workflow_timeout,
        }
    }

    /// Build a guard from a loaded configuration.
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self::new(config.webhook.retry_policy, config.workflow.timeout())
    }

    /// The retry policy used by [`schedule_retry`](Self::schedule_retry).
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// True iff the period is `OPEN`.
    pub fn can_close(&self, period: &FinancialPeriod) -> bool {
        period.can_close()
    }

    /// Fallible form of [`can_close`](Self::can_close).
    pub fn ensure_can_close(&self, period: &FinancialPeriod) -> Result<(), TransitionError> {
        if self.can_close(period) {
            return Ok(());
        }
        Err(TransitionError::rejected(
            "financial_period",
            period.state.name(),
            "CLOSED",
            "only an OPEN period can be closed",
        ))
    }

    /// Close a period after checking [`can_close`](Self::can_close).
    pub fn close_period(
        &self,
        period: &mut FinancialPeriod,
        actor: UserId,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        self.ensure_can_close(period)?;
        period.close(actor, now)
    }

    /// True iff the exercise is not closed and `today` is after its last day.
    pub fn can_close_exercise(&self, exercise: &FiscalExercise, today: NaiveDate) -> bool {
        exercise.can_close(today)
    }

    /// Withdraw a consent. Never fails.
    pub fn withdraw(
        &self,
        consent: &mut ConsentRecord,
        method: ConsentMethod,
        ip_address: Option<String>,
        now: Timestamp,
    ) {
        consent.withdraw(method, ip_address, now);
    }

    /// Schedule the next delivery attempt using the configured policy.
    pub fn schedule_retry(&self, event: &mut WebhookEvent, now: Timestamp) -> Result<(), TransitionError> {
        event.schedule_retry(now, &self.retry_policy)
    }

    /// Record a failed delivery attempt using the configured policy.
    pub fn record_delivery_failure(
        &self,
        event: &mut WebhookEvent,
        error: impl Into<String>,
        now: Timestamp,
    ) -> Result<&'static str, TransitionError> {
        event.record_failure(error, now, &self.retry_policy)
    }

    /// Time out a RUNNING execution past the configured limit.
    pub fn enforce_timeout(&self, execution: &mut WorkflowExecution, now: Timestamp) -> bool {
        execution.check_timeout(now, self.workflow_timeout)
    }
}
