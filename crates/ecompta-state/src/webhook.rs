//! # Webhook Delivery Lifecycle
//!
//! Outbound webhook events queued for delivery to a tenant endpoint.
//!
//! ## States
//!
//! ```text
//! Pending ──begin_processing()──▶ Processing ──complete()──▶ Completed
//!                                   │   ▲
//!                 record_failure()  │   │ begin_processing() once due
//!                  (attempts left)  ▼   │
//!                                   Retry
//!                                   │
//!  record_failure() (no attempts left)
//!                                   ▼
//!                                 Failed
//! ```
//!
//! `retry_count` counts failed attempts and never exceeds `max_retries`: a
//! delivery is attempted at most `max_retries` times (at least once), and the
//! failure that brings the count to `max_retries` moves the event to Failed.
//! Completed and Failed are terminal.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use ecompta_core::{CompanyId, Timestamp};

use crate::error::TransitionError;
use crate::record::{self, LifecycleStatus, TransitionRecord};

const ENTITY: &str = "webhook_event";

/// Retries allowed when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before a retry when no policy is configured: five minutes.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 300;

/// Upper bound applied to any computed retry delay.
const MAX_DELAY_SECS: u64 = u32::MAX as u64;

// ─── Retry Policy ────────────────────────────────────────────────────

/// How long to wait before the next delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Same delay before every retry.
    Fixed {
        /// Delay in seconds.
        delay_secs: u64,
    },
    /// `base_secs * factor^(attempt - 1)`, capped at `max_secs`.
    Exponential {
        /// Delay before the first retry.
        base_secs: u64,
        /// Growth factor per attempt.
        factor: u32,
        /// Cap on any single delay.
        max_secs: u64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = match *self {
            Self::Fixed { delay_secs } => delay_secs,
            Self::Exponential {
                base_secs,
                factor,
                max_secs,
            } => {
                let exponent = attempt.saturating_sub(1);
                u64::from(factor)
                    .checked_pow(exponent)
                    .and_then(|growth| base_secs.checked_mul(growth))
                    .unwrap_or(u64::MAX)
                    .min(max_secs)
            }
        };
        // Bounded by MAX_DELAY_SECS, so the cast cannot wrap.
        Duration::seconds(secs.min(MAX_DELAY_SECS) as i64)
    }

    /// Check the policy parameters.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Fixed { .. } => Ok(()),
            Self::Exponential {
                base_secs,
                factor,
                max_secs,
            } => {
                if base_secs == 0 {
                    return Err("exponential base_secs must be positive".to_string());
                }
                if factor < 1 {
                    return Err("exponential factor must be at least 1".to_string());
                }
                if max_secs < base_secs {
                    return Err(format!(
                        "exponential max_secs ({max_secs}) is below base_secs ({base_secs})"
                    ));
                }
                Ok(())
            }
        }
    }
}

// ─── Webhook Status ──────────────────────────────────────────────────

/// Delivery state of a webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookStatus {
    /// Queued for a first attempt.
    Pending,
    /// An attempt is in flight.
    Processing {
        /// When the attempt started.
        started_at: Timestamp,
    },
    /// Delivered (terminal).
    Completed {
        /// When the delivery was acknowledged.
        processed_at: Timestamp,
        /// HTTP status code returned by the endpoint.
        response_code: u16,
        /// Response body, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_body: Option<String>,
        /// Round-trip time of the successful attempt.
        processing_time_ms: u64,
    },
    /// Gave up (terminal).
    Failed {
        /// When the final failure was recorded.
        failed_at: Timestamp,
        /// Error from the last attempt.
        error: String,
    },
    /// Waiting for the next attempt.
    Retry {
        /// Earliest time of the next attempt.
        next_retry: Timestamp,
        /// Error from the previous attempt, if one was reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },
}

impl LifecycleStatus for WebhookStatus {
    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing { .. } => "PROCESSING",
            Self::Completed { .. } => "COMPLETED",
            Self::Failed { .. } => "FAILED",
            Self::Retry { .. } => "RETRY",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

// ─── Webhook Event ───────────────────────────────────────────────────

/// An outbound webhook event and its delivery history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event type, e.g. `invoice.validated`.
    pub event_type: String,
    /// Subsystem that emitted the event.
    pub event_source: String,
    /// JSON body posted to the endpoint.
    pub payload: serde_json::Value,
    /// Destination URL.
    pub webhook_url: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Current delivery state.
    pub state: WebhookStatus,
    /// Failed attempts (and directly scheduled retries) so far.
    pub retry_count: u32,
    /// Retries allowed.
    pub max_retries: u32,
    /// Creation time.
    pub created_at: Timestamp,
    /// Refreshed by every applied transition.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl WebhookEvent {
    /// Queue a new `PENDING` event with the default retry budget.
    pub fn new(
        event_type: impl Into<String>,
        event_source: impl Into<String>,
        payload: serde_json::Value,
        webhook_url: impl Into<String>,
        company_id: CompanyId,
        now: Timestamp,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            event_source: event_source.into(),
            payload,
            webhook_url: webhook_url.into(),
            company_id,
            state: WebhookStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        }
    }

    /// Override the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Earliest time of the next attempt, while waiting to retry.
    pub fn next_retry(&self) -> Option<Timestamp> {
        match &self.state {
            WebhookStatus::Retry { next_retry, .. } => Some(*next_retry),
            _ => None,
        }
    }

    /// Whether retries remain.
    pub fn has_retries_left(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Whether a delivery attempt may start at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        match &self.state {
            WebhookStatus::Pending => true,
            WebhookStatus::Retry { next_retry, .. } => *next_retry <= now,
            _ => false,
        }
    }

    /// Start a delivery attempt (PENDING → PROCESSING, or RETRY → PROCESSING once due).
    pub fn begin_processing(&mut self, now: Timestamp) -> Result<(), TransitionError> {
        match &self.state {
            WebhookStatus::Pending => {}
            WebhookStatus::Retry { next_retry, .. } if *next_retry <= now => {}
            WebhookStatus::Retry { next_retry, .. } => {
                return Err(self.reject(
                    "PROCESSING",
                    format!("retry not due until {next_retry}"),
                ));
            }
            _ => {
                return Err(self.reject(
                    "PROCESSING",
                    "only PENDING or due RETRY events can be processed",
                ));
            }
        }
        self.apply(WebhookStatus::Processing { started_at: now }, None, now);
        Ok(())
    }

    /// Record a successful delivery (PROCESSING → COMPLETED).
    pub fn complete(
        &mut self,
        response_code: u16,
        response_body: Option<String>,
        processing_time_ms: u64,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        self.require_processing("COMPLETED")?;
        self.apply(
            WebhookStatus::Completed {
                processed_at: now,
                response_code,
                response_body,
                processing_time_ms,
            },
            None,
            now,
        );
        Ok(())
    }

    /// Record a failed attempt.
    ///
    /// The failure is counted first. While the count stays below
    /// `max_retries` a retry is scheduled (PROCESSING → RETRY); the failure
    /// that reaches `max_retries` gives up (PROCESSING → FAILED) with the
    /// final count stamped. Returns the resulting state name.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        now: Timestamp,
        policy: &RetryPolicy,
    ) -> Result<&'static str, TransitionError> {
        self.require_processing("FAILED")?;
        let error = error.into();
        let failures = self.retry_count.saturating_add(1);
        if failures < self.max_retries {
            self.retry(Some(error), now, policy)?;
        } else {
            self.retry_count = failures.min(self.max_retries);
            self.apply(
                WebhookStatus::Failed {
                    failed_at: now,
                    error: error.clone(),
                },
                Some(error),
                now,
            );
        }
        Ok(self.state.name())
    }

    /// Schedule a retry: increments `retry_count`, moves to RETRY and
    /// computes the next attempt time from `policy`.
    ///
    /// # Errors
    ///
    /// Fails without touching the record when the retry budget is exhausted
    /// or the event is already COMPLETED or FAILED.
    pub fn schedule_retry(&mut self, now: Timestamp, policy: &RetryPolicy) -> Result<(), TransitionError> {
        let last_error = match &self.state {
            WebhookStatus::Retry { last_error, .. } => last_error.clone(),
            _ => None,
        };
        self.retry(last_error, now, policy)
    }

    fn retry(
        &mut self,
        last_error: Option<String>,
        now: Timestamp,
        policy: &RetryPolicy,
    ) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(self.reject("RETRY", "event delivery already finished"));
        }
        if !self.has_retries_left() {
            return Err(self.reject(
                "RETRY",
                format!("retry budget exhausted ({}/{})", self.retry_count, self.max_retries),
            ));
        }
        let attempt = self.retry_count + 1;
        let next_retry = now
            .checked_add(policy.delay_for(attempt))
            .ok_or_else(|| self.reject("RETRY", "next retry time is out of range"))?;
        self.retry_count = attempt;
        let reason = last_error.clone();
        self.apply(
            WebhookStatus::Retry {
                next_retry,
                last_error,
            },
            reason,
            now,
        );
        Ok(())
    }

    fn require_processing(&self, to: &'static str) -> Result<(), TransitionError> {
        match self.state {
            WebhookStatus::Processing { .. } => Ok(()),
            _ => Err(self.reject(to, "no delivery attempt in progress")),
        }
    }

    fn reject(&self, to: &'static str, reason: impl Into<String>) -> TransitionError {
        TransitionError::rejected(ENTITY, self.state.name(), to, reason)
    }

    fn apply(&mut self, to: WebhookStatus, reason: Option<String>, now: Timestamp) {
        record::append(
            &mut self.transitions,
            ENTITY,
            self.state.name(),
            to.name(),
            now,
            None,
            reason,
        );
        self.state = to;
        self.updated_at = now;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
