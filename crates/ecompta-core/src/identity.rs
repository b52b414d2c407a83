//! # Record Identity Newtypes
//!
//! Identifiers and validated codes shared by the lifecycle records.
//! A `CompanyId` cannot be passed where a `UserId` is expected even though
//! both wrap the same numeric database key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Tenant (company) that owns a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub u64);

/// Platform user acting on a record (closing a period, locking it, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Unique identifier for a single workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    /// Generate a new random execution identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "company:{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "execution:{}", self.0)
    }
}

// ─── Validated codes ─────────────────────────────────────────────────

/// Country code of a company's jurisdiction (ISO 3166 alpha-2 or alpha-3).
///
/// Upper-case ASCII letters only, two or three characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Validate and wrap a country code.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if !(2..=3).contains(&code.len()) || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(CoreError::Validation(format!(
                "country code must be 2-3 upper-case letters, got {code:?}"
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ISO 4217 currency code (e.g. `XOF`, `EUR`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and wrap a currency code. Exactly three upper-case letters.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(CoreError::Validation(format!(
                "currency code must be 3 upper-case letters, got {code:?}"
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_code_conversions {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_code_conversions!(CountryCode);
string_code_conversions!(CurrencyCode);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_display() {
        assert_eq!(CompanyId(42).to_string(), "company:42");
        assert_eq!(UserId(7).to_string(), "user:7");
        assert!(ExecutionId::new().to_string().starts_with("execution:"));
    }

    #[test]
    fn test_execution_ids_are_unique() {
        assert_ne!(ExecutionId::new(), ExecutionId::new());
    }

    #[test]
    fn test_country_code_validation() {
        assert!(CountryCode::new("SN").is_ok());
        assert!(CountryCode::new("CIV").is_ok());
        assert!(CountryCode::new("sn").is_err());
        assert!(CountryCode::new("S").is_err());
        assert!(CountryCode::new("SENE").is_err());
    }

    #[test]
    fn test_currency_code_validation() {
        assert_eq!(CurrencyCode::new("XOF").unwrap().as_str(), "XOF");
        assert!(CurrencyCode::new("xof").is_err());
        assert!(CurrencyCode::new("EU").is_err());
        assert!(CurrencyCode::new("EUR1").is_err());
    }

    #[test]
    fn test_codes_validate_on_deserialize() {
        let ok: CurrencyCode = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(ok.to_string(), "EUR");
        assert!(serde_json::from_str::<CurrencyCode>("\"eur\"").is_err());
        assert!(serde_json::from_str::<CountryCode>("\"\"").is_err());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&CompanyId(12)).unwrap(), "12");
        let id: UserId = serde_json::from_str("99").unwrap();
        assert_eq!(id, UserId(99));
    }

    proptest! {
        #[test]
        fn currency_code_accepts_any_three_upper_letters(code in "[A-Z]{3}") {
            prop_assert!(CurrencyCode::new(code.clone()).is_ok());
            let currency = CurrencyCode::new(code.clone()).unwrap();
            prop_assert_eq!(currency.as_str(), code.as_str());
        }

        #[test]
        fn currency_code_rejects_lowercase(code in "[a-z]{3}") {
            prop_assert!(CurrencyCode::new(code).is_err());
        }
    }
}
