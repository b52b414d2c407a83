//! # Financial Period Lifecycle
//!
//! A financial period is one accounting year (or sub-period) of a company.
//!
//! ## States
//!
//! ```text
//! Open ──close()──▶ Closed ──lock()──▶ Locked (terminal)
//!   │                                     ▲
//!   └─────────────────lock()──────────────┘
//! ```
//!
//! There is no reopen path. A locked period also keeps the close stamp it
//! had, if any, so the audit view of "who closed it" survives locking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ecompta_core::{CompanyId, CoreError, CountryCode, Timestamp, UserId};

use crate::error::TransitionError;
use crate::record::{self, LifecycleStatus, TransitionRecord};

const ENTITY: &str = "financial_period";

// ─── Period Status ───────────────────────────────────────────────────

/// Lifecycle state of a financial period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Entries may be posted.
    Open,
    /// Closed for posting; may still be locked.
    Closed {
        /// When the period was closed.
        closed_at: Timestamp,
        /// Who closed it.
        closed_by: UserId,
    },
    /// Permanently frozen (terminal).
    Locked {
        /// When the period was locked.
        locked_at: Timestamp,
        /// Who locked it.
        locked_by: UserId,
        /// Mandatory justification.
        reason: String,
        /// Close stamp carried over from `Closed`, if the period was closed first.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        closed_at: Option<Timestamp>,
        /// Closing user carried over from `Closed`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        closed_by: Option<UserId>,
    },
}

impl LifecycleStatus for PeriodStatus {
    fn name(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed { .. } => "CLOSED",
            Self::Locked { .. } => "LOCKED",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Financial Period ────────────────────────────────────────────────

/// A company's financial period with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name, e.g. "Exercice 2024".
    pub name: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Jurisdiction of the company.
    pub country_code: CountryCode,
    /// Accounting standard (e.g. "SYSCOHADA").
    pub accounting_standard: String,
    /// Whether this is the company's current period.
    pub is_current: bool,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Current lifecycle state.
    pub state: PeriodStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Refreshed by every applied transition.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl FinancialPeriod {
    /// Open a new period. New periods start `OPEN` and current.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `end_date` precedes `start_date`.
    pub fn open(
        company_id: CompanyId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        country_code: CountryCode,
        accounting_standard: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        if end_date < start_date {
            return Err(CoreError::Validation(format!(
                "period end {end_date} precedes start {start_date}"
            )));
        }
        Ok(Self {
            company_id,
            name: name.into(),
            start_date,
            end_date,
            country_code,
            accounting_standard: accounting_standard.into(),
            is_current: true,
            notes: None,
            state: PeriodStatus::Open,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        })
    }

    /// Whether the period can be closed (it is `OPEN`).
    pub fn can_close(&self) -> bool {
        matches!(self.state, PeriodStatus::Open)
    }

    /// Whether the period is `CLOSED` (and not yet locked).
    pub fn is_closed(&self) -> bool {
        matches!(self.state, PeriodStatus::Closed { .. })
    }

    /// Whether the period is `LOCKED`.
    pub fn is_locked(&self) -> bool {
        matches!(self.state, PeriodStatus::Locked { .. })
    }

    /// When the period was closed, including periods locked after closing.
    pub fn closed_at(&self) -> Option<Timestamp> {
        match &self.state {
            PeriodStatus::Open => None,
            PeriodStatus::Closed { closed_at, .. } => Some(*closed_at),
            PeriodStatus::Locked { closed_at, .. } => *closed_at,
        }
    }

    /// Whether `date` falls within the period (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Close the period (OPEN → CLOSED). The period stops being current.
    pub fn close(&mut self, actor: UserId, now: Timestamp) -> Result<(), TransitionError> {
        if !self.can_close() {
            return Err(TransitionError::rejected(
                ENTITY,
                self.state.name(),
                "CLOSED",
                "only an OPEN period can be closed",
            ));
        }
        self.is_current = false;
        self.apply(
            PeriodStatus::Closed {
                closed_at: now,
                closed_by: actor,
            },
            actor,
            None,
            now,
        );
        Ok(())
    }

    /// Lock the period (OPEN or CLOSED → LOCKED).
    ///
    /// Stamps the lock time, the locking user and the reason. A blank reason
    /// is rejected.
    pub fn lock(
        &mut self,
        actor: UserId,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        let reason = reason.into();
        let (closed_at, closed_by) = match &self.state {
            PeriodStatus::Open => (None, None),
            PeriodStatus::Closed {
                closed_at,
                closed_by,
            } => (Some(*closed_at), Some(*closed_by)),
            PeriodStatus::Locked { .. } => {
                return Err(TransitionError::rejected(
                    ENTITY,
                    self.state.name(),
                    "LOCKED",
                    "period is already locked",
                ));
            }
        };
        if reason.trim().is_empty() {
            return Err(TransitionError::rejected(
                ENTITY,
                self.state.name(),
                "LOCKED",
                "lock reason must not be empty",
            ));
        }
        self.is_current = false;
        self.apply(
            PeriodStatus::Locked {
                locked_at: now,
                locked_by: actor,
                reason: reason.clone(),
                closed_at,
                closed_by,
            },
            actor,
            Some(reason),
            now,
        );
        Ok(())
    }

    fn apply(&mut self, to: PeriodStatus, actor: UserId, reason: Option<String>, now: Timestamp) {
        record::append(
            &mut self.transitions,
            ENTITY,
            self.state.name(),
            to.name(),
            now,
            Some(actor),
            reason,
        );
        self.state = to;
        self.updated_at = now;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
