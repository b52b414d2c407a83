//! # Transition Records
//!
//! Shared plumbing for the lifecycle machines: the [`LifecycleStatus`] trait
//! implemented by every status enum, and the append-only
//! [`TransitionRecord`] log each record carries.

use serde::{Deserialize, Serialize};

use ecompta_core::{Timestamp, UserId};

/// Implemented by every lifecycle status enum in this crate.
pub trait LifecycleStatus {
    /// Canonical upper-case name of the state (e.g. `"LOCKED"`).
    fn name(&self) -> &'static str;

    /// Whether no further transition is allowed out of this state.
    fn is_terminal(&self) -> bool;
}

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from: String,
    /// State after the transition.
    pub to: String,
    /// When the transition was applied.
    pub at: Timestamp,
    /// User who requested the transition, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,
    /// Free-text reason (lock reason, failure message, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Append a transition to `log` and emit a debug event.
pub(crate) fn append(
    log: &mut Vec<TransitionRecord>,
    entity: &'static str,
    from: &'static str,
    to: &'static str,
    at: Timestamp,
    actor: Option<UserId>,
    reason: Option<String>,
) {
    tracing::debug!(entity, from, to, %at, "transition applied");
    log.push(TransitionRecord {
        from: from.to_string(),
        to: to.to_string(),
        at,
        actor,
        reason,
    });
}
