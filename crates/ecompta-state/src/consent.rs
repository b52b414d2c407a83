//! # Consent Lifecycle
//!
//! Data-protection consent given (or refused) by a data subject, and its
//! withdrawal.
//!
//! ```text
//! Given ───withdraw()───▶ Withdrawn ◀──withdraw()──┐
//! Refused ──withdraw()──▶ Withdrawn ───────────────┘
//! ```
//!
//! Withdrawal is irreversible. `withdraw()` never fails: withdrawing an
//! already withdrawn consent keeps every flag unchanged but overwrites the
//! withdrawal date, method and address with the latest request.
//!
//! The legacy flag view (`is_active`, `consent_given`, `withdrawal_date`) is
//! derived from [`ConsentState`]; an active consent with a withdrawal date
//! cannot be represented.

use serde::{Deserialize, Serialize};

use ecompta_core::{CompanyId, Timestamp};

use crate::record::{self, LifecycleStatus, TransitionRecord};

const ENTITY: &str = "consent";

/// What the data subject consented to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentType {
    /// Processing required to run the accounting service.
    DataProcessing,
    /// Commercial communications.
    Marketing,
    /// Usage analytics.
    Analytics,
    /// Sharing with third parties (banks, tax portals).
    ThirdPartySharing,
    /// Non-essential cookies.
    Cookies,
}

/// How consent was given or withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentMethod {
    /// Checkbox or form in the web application.
    WebForm,
    /// Reply to an email.
    Email,
    /// Signed paper form.
    Paper,
    /// Recorded verbal consent.
    Verbal,
    /// Through the public API.
    Api,
}

impl ConsentMethod {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebForm => "WEB_FORM",
            Self::Email => "EMAIL",
            Self::Paper => "PAPER",
            Self::Verbal => "VERBAL",
            Self::Api => "API",
        }
    }
}

impl std::fmt::Display for ConsentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConsentMethod {
    type Err = String;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "WEB_FORM" => Ok(Self::WebForm),
            "EMAIL" => Ok(Self::Email),
            "PAPER" => Ok(Self::Paper),
            "VERBAL" => Ok(Self::Verbal),
            "API" => Ok(Self::Api),
            _ => Err(format!("unknown consent method: {s:?}")),
        }
    }
}

/// Lifecycle state of a consent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    /// Consent given and in force.
    Given {
        /// When consent was given.
        given_at: Timestamp,
        /// How it was given.
        method: ConsentMethod,
        /// Client address at the time, if captured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ip_address: Option<String>,
    },
    /// The subject explicitly declined.
    Refused {
        /// When the refusal was recorded.
        recorded_at: Timestamp,
        /// How it was recorded.
        method: ConsentMethod,
    },
    /// Consent withdrawn (terminal).
    Withdrawn {
        /// When the latest withdrawal request was applied.
        withdrawn_at: Timestamp,
        /// How it was withdrawn.
        method: ConsentMethod,
        /// Client address of the withdrawal request, if captured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ip_address: Option<String>,
    },
}

impl LifecycleStatus for ConsentState {
    fn name(&self) -> &'static str {
        match self {
            Self::Given { .. } => "GIVEN",
            Self::Refused { .. } => "REFUSED",
            Self::Withdrawn { .. } => "WITHDRAWN",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawn { .. })
    }
}

/// A consent record for one subject and one consent type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Company collecting the consent.
    pub company_id: CompanyId,
    /// Data subject.
    pub email: String,
    /// Scope of the consent.
    pub consent_type: ConsentType,
    /// Current state.
    pub state: ConsentState,
    /// Browser user agent at collection time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Refreshed by every applied transition.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl ConsentRecord {
    /// Record a consent decision. `consent_given == false` records a refusal.
    pub fn record(
        company_id: CompanyId,
        email: impl Into<String>,
        consent_type: ConsentType,
        consent_given: bool,
        method: ConsentMethod,
        ip_address: Option<String>,
        now: Timestamp,
    ) -> Self {
        let state = if consent_given {
            ConsentState::Given {
                given_at: now,
                method,
                ip_address,
            }
        } else {
            ConsentState::Refused {
                recorded_at: now,
                method,
            }
        };
        Self {
            company_id,
            email: email.into(),
            consent_type,
            state,
            user_agent: None,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        }
    }

    /// Consent is given and not withdrawn.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ConsentState::Given { .. })
    }

    /// Same as [`is_active`](Self::is_active); kept for the legacy flag name.
    pub fn consent_given(&self) -> bool {
        self.is_active()
    }

    /// When consent was given, if it currently is.
    pub fn consent_date(&self) -> Option<Timestamp> {
        match &self.state {
            ConsentState::Given { given_at, .. } => Some(*given_at),
            _ => None,
        }
    }

    /// When the consent was (last) withdrawn.
    pub fn withdrawal_date(&self) -> Option<Timestamp> {
        match &self.state {
            ConsentState::Withdrawn { withdrawn_at, .. } => Some(*withdrawn_at),
            _ => None,
        }
    }

    /// Withdraw consent. Always succeeds; see the module docs for repeats.
    pub fn withdraw(&mut self, method: ConsentMethod, ip_address: Option<String>, now: Timestamp) {
        let from = self.state.name();
        self.state = ConsentState::Withdrawn {
            withdrawn_at: now,
            method,
            ip_address,
        };
        self.updated_at = now;
        record::append(
            &mut self.transitions,
            ENTITY,
            from,
            "WITHDRAWN",
            now,
            None,
            Some(format!("withdrawn via {method}")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn make_consent(given: bool) -> ConsentRecord {
        ConsentRecord::record(
            CompanyId(3),
            "awa.diop@example.sn",
            ConsentType::Marketing,
            given,
            ConsentMethod::WebForm,
            Some("196.1.95.10".to_string()),
            ts("2024-02-01T10:00:00Z"),
        )
    }

    #[test]
    fn test_given_consent_is_active() {
        let c = make_consent(true);
        assert!(c.is_active());
        assert!(c.consent_given());
        assert_eq!(c.consent_date(), Some(ts("2024-02-01T10:00:00Z")));
        assert_eq!(c.withdrawal_date(), None);
    }

    #[test]
    fn test_refused_consent_is_inactive() {
        let c = make_consent(false);
        assert!(!c.is_active());
        assert_eq!(c.state.name(), "REFUSED");
        assert_eq!(c.withdrawal_date(), None);
    }

    #[test]
    fn test_withdraw_clears_flags_and_stamps_date() {
        let mut c = make_consent(true);
        let now = ts("2024-05-01T08:30:00Z");
        c.withdraw(ConsentMethod::Email, None, now);
        assert!(!c.is_active());
        assert!(!c.consent_given());
        assert_eq!(c.withdrawal_date(), Some(now));
        assert_eq!(c.updated_at, now);
        assert!(c.state.is_terminal());
        assert_eq!(c.transitions[0].from, "GIVEN");
    }

    #[test]
    fn test_second_withdrawal_overwrites_date_and_method() {
        let mut c = make_consent(true);
        c.withdraw(ConsentMethod::Email, None, ts("2024-05-01T08:30:00Z"));
        let later = ts("2024-05-03T12:00:00Z");
        c.withdraw(ConsentMethod::Api, Some("10.0.0.1".into()), later);

        assert!(!c.is_active());
        assert!(!c.consent_given());
        assert_eq!(c.withdrawal_date(), Some(later));
        match &c.state {
            ConsentState::Withdrawn { method, ip_address, .. } => {
                assert_eq!(*method, ConsentMethod::Api);
                assert_eq!(ip_address.as_deref(), Some("10.0.0.1"));
            }
            other => panic!("expected WITHDRAWN, got {}", other.name()),
        }
        assert_eq!(c.transitions.len(), 2);
        assert_eq!(c.transitions[1].from, "WITHDRAWN");
    }

    #[test]
    fn test_withdraw_refused_consent() {
        let mut c = make_consent(false);
        c.withdraw(ConsentMethod::Paper, None, ts("2024-03-01T00:00:00Z"));
        assert_eq!(c.state.name(), "WITHDRAWN");
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("web-form".parse::<ConsentMethod>().unwrap(), ConsentMethod::WebForm);
        assert_eq!("EMAIL".parse::<ConsentMethod>().unwrap(), ConsentMethod::Email);
        assert!("fax".parse::<ConsentMethod>().is_err());
    }

    #[test]
    fn test_serialization_shape() {
        let mut c = make_consent(true);
        c.withdraw(ConsentMethod::Verbal, None, ts("2024-05-01T08:30:00Z"));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["consent_type"], "MARKETING");
        assert_eq!(json["state"]["status"], "WITHDRAWN");
        assert_eq!(json["state"]["method"], "VERBAL");
        let parsed: ConsentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, c);
    }
}
