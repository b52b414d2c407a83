//! # Fiscal Exercise Lifecycle
//!
//! The accounting year of a small business under the simplified
//! (cash-basis) regime. Its closing rule is date-driven: an exercise can be
//! closed only once its last day is over.
//!
//! ```text
//! Open ──begin()──▶ InProgress ──close(today)──▶ Closed (terminal)
//!   │                                               ▲
//!   └──────────────────close(today)─────────────────┘
//! ```
//!
//! Once closed, the receipts/expenses totals are frozen.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecompta_core::{CompanyId, CoreError, CurrencyCode, Timestamp};

use crate::error::TransitionError;
use crate::record::{self, LifecycleStatus, TransitionRecord};

const ENTITY: &str = "fiscal_exercise";

/// Target label logged when a totals update is rejected.
const TOTALS_UPDATE: &str = "TOTALS";

/// Currency used when none is given: the West African CFA franc.
pub const DEFAULT_CURRENCY: &str = "XOF";

/// Lifecycle state of a fiscal exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseStatus {
    /// Created, bookkeeping not started.
    Open,
    /// Bookkeeping under way.
    InProgress,
    /// Closed (terminal).
    Closed {
        /// When the exercise was closed.
        closed_at: Timestamp,
    },
}

impl LifecycleStatus for ExerciseStatus {
    fn name(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Closed { .. } => "CLOSED",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

impl std::fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fiscal exercise with running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalExercise {
    /// Owning company.
    pub company_id: CompanyId,
    /// Exercise year (e.g. 2024).
    pub year: i32,
    /// First day of the exercise.
    pub start_date: NaiveDate,
    /// Last day of the exercise.
    pub end_date: NaiveDate,
    /// Reporting currency.
    pub currency: CurrencyCode,
    /// Total receipts booked so far.
    #[serde(default)]
    pub total_receipts: Option<Decimal>,
    /// Total expenses booked so far.
    #[serde(default)]
    pub total_expenses: Option<Decimal>,
    /// Free-form observations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    /// Current lifecycle state.
    pub state: ExerciseStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Refreshed by every applied transition.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl FiscalExercise {
    /// Create an `OPEN` exercise in the default currency.
    pub fn new(
        company_id: CompanyId,
        year: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        if end_date < start_date {
            return Err(CoreError::Validation(format!(
                "exercise end {end_date} precedes start {start_date}"
            )));
        }
        Ok(Self {
            company_id,
            year,
            start_date,
            end_date,
            currency: CurrencyCode::new(DEFAULT_CURRENCY)?,
            total_receipts: None,
            total_expenses: None,
            observations: None,
            state: ExerciseStatus::Open,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        })
    }

    /// Whether the exercise has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the exercise may be closed on `today`: not yet closed and
    /// `today` is strictly after the last day.
    pub fn can_close(&self, today: NaiveDate) -> bool {
        !self.is_closed() && today > self.end_date
    }

    /// Whether `today` lies strictly inside the exercise and it is not closed.
    pub fn is_in_progress(&self, today: NaiveDate) -> bool {
        !self.is_closed() && self.start_date < today && today < self.end_date
    }

    /// Receipts minus expenses, or zero until both totals are known.
    pub fn net_result(&self) -> Decimal {
        match (self.total_receipts, self.total_expenses) {
            (Some(receipts), Some(expenses)) => receipts - expenses,
            _ => Decimal::ZERO,
        }
    }

    /// Start bookkeeping (OPEN → IN_PROGRESS).
    pub fn begin(&mut self, now: Timestamp) -> Result<(), TransitionError> {
        if self.state != ExerciseStatus::Open {
            return Err(TransitionError::rejected(
                ENTITY,
                self.state.name(),
                "IN_PROGRESS",
                "only an OPEN exercise can begin",
            ));
        }
        self.apply(ExerciseStatus::InProgress, now);
        Ok(())
    }

    /// Close the exercise (OPEN or IN_PROGRESS → CLOSED).
    ///
    /// `today` is the business date used for the end-of-exercise check;
    /// `now` is the instant stamped on the record.
    pub fn close(&mut self, today: NaiveDate, now: Timestamp) -> Result<(), TransitionError> {
        if self.is_closed() {
            return Err(TransitionError::rejected(
                ENTITY,
                self.state.name(),
                "CLOSED",
                "exercise is already closed",
            ));
        }
        if today <= self.end_date {
            return Err(TransitionError::rejected(
                ENTITY,
                self.state.name(),
                "CLOSED",
                format!("exercise ends {}, cannot close on {today}", self.end_date),
            ));
        }
        self.apply(ExerciseStatus::Closed { closed_at: now }, now);
        Ok(())
    }

    /// Update the running totals. Rejected once the exercise is closed.
    pub fn record_totals(
        &mut self,
        total_receipts: Decimal,
        total_expenses: Decimal,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        if self.is_closed() {
            return Err(TransitionError::rejected(
                ENTITY,
                self.state.name(),
                TOTALS_UPDATE,
                "totals of a closed exercise are frozen",
            ));
        }
        self.total_receipts = Some(total_receipts);
        self.total_expenses = Some(total_expenses);
        self.updated_at = now;
        Ok(())
    }

    fn apply(&mut self, to: ExerciseStatus, now: Timestamp) {
        record::append(
            &mut self.transitions,
            ENTITY,
            self.state.name(),
            to.name(),
            now,
            None,
            None,
        );
        self.state = to;
        self.updated_at = now;
    }
}
