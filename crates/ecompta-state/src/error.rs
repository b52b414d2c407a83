//! # Transition Errors
//!
//! Every guard in this crate fails with the same error kind:
//! [`TransitionError::InvalidTransition`]. It carries the entity kind, the
//! current state, the attempted target state, and the rejected precondition.
//! The caller decides whether to surface it to a user or log it; nothing
//! here retries.

use thiserror::Error;

/// A lifecycle transition was rejected because its precondition is false.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested transition is not legal from the current state.
    #[error("invalid {entity} transition: {from} -> {to}: {reason}")]
    InvalidTransition {
        /// Entity kind (e.g. `financial_period`).
        entity: &'static str,
        /// Current state name.
        from: String,
        /// Attempted target state name.
        to: String,
        /// Why the guard rejected the transition.
        reason: String,
    },
}

impl TransitionError {
    /// Build an [`InvalidTransition`](Self::InvalidTransition) and log the rejection.
    pub(crate) fn rejected(
        entity: &'static str,
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let (from, to, reason) = (from.into(), to.into(), reason.into());
        tracing::warn!(entity, %from, %to, %reason, "transition rejected");
        Self::InvalidTransition {
            entity,
            from,
            to,
            reason,
        }
    }

    /// The state the record was in when the transition was rejected.
    pub fn from_state(&self) -> &str {
        match self {
            Self::InvalidTransition { from, .. } => from,
        }
    }

    /// The state the caller tried to reach.
    pub fn to_state(&self) -> &str {
        match self {
            Self::InvalidTransition { to, .. } => to,
        }
    }
}
