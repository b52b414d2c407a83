//! # ecompta-state — Record Lifecycle Machines
//!
//! Pure, synchronous state machines for the eCompta records whose status
//! matters: financial periods, fiscal exercises, consents, workflow
//! executions and webhook deliveries, plus currency rate refresh.
//!
//! ## State Machines
//!
//! - **Period** (`period.rs`): `Open → Closed → Locked`, with `Open → Locked`.
//! - **Exercise** (`exercise.rs`): `Open → InProgress → Closed`, closable only
//!   after its last day.
//! - **Consent** (`consent.rs`): `Given | Refused → Withdrawn`, withdrawal
//!   never fails.
//! - **Workflow** (`workflow.rs`): `Pending → Running → Completed | Failed |
//!   Cancelled | Timeout`.
//! - **Webhook** (`webhook.rs`): `Pending → Processing → Completed`, with a
//!   bounded `Retry` loop ending in `Failed`.
//!
//! [`StatusGuard`] gathers the preconditions behind one facade configured by
//! [`LifecycleConfig`].
//!
//! ## Design
//!
//! Each record carries a single tagged state enum whose variants own the
//! data that only exists in that state (a lock reason only exists on a
//! locked period, a withdrawal date only on a withdrawn consent). Flag views
//! such as `is_locked()` or `is_active()` are derived, never stored.
//!
//! Terminal states are monotonic. Failed transitions leave the record
//! untouched, `updated_at` and the transition log included.

pub mod config;
pub mod consent;
pub mod currency;
pub mod error;
pub mod exercise;
pub mod guard;
pub mod period;
pub mod record;
pub mod webhook;
pub mod workflow;

pub use config::{ConfigError, LifecycleConfig, WebhookConfig, WorkflowConfig};
pub use consent::{ConsentMethod, ConsentRecord, ConsentState, ConsentType};
pub use currency::{convert_amount, Currency, CurrencyError, ExchangeRate};
pub use error::TransitionError;
pub use exercise::{ExerciseStatus, FiscalExercise};
pub use guard::StatusGuard;
pub use period::{FinancialPeriod, PeriodStatus};
pub use record::{LifecycleStatus, TransitionRecord};
pub use webhook::{RetryPolicy, WebhookEvent, WebhookStatus};
pub use workflow::{WorkflowExecution, WorkflowStatus};
