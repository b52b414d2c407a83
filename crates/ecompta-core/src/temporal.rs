//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, the instant type carried by every lifecycle record
//! (`created_at`, `updated_at`, close/lock/withdrawal stamps, retry
//! deadlines).
//!
//! Timestamps are UTC and truncated to whole seconds. Non-UTC inputs are
//! rejected by the strict parser; [`Timestamp::parse_lenient()`] converts
//! offsets for data ingested from other systems.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an ISO8601 string, rejecting non-UTC offsets.
///
/// Deserialization goes through [`Timestamp::parse()`] as well, so records
/// loaded from disk obey the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string with a `Z` suffix.
    ///
    /// Explicit offsets, `+00:00` included, are rejected.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        Self::parse_lenient(s)
    }

    /// Parse a timestamp from an RFC 3339 string, accepting any offset and
    /// converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, CoreError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("unix timestamp out of range: {secs}")))
    }

    /// Midnight UTC at the start of `date`.
    pub fn start_of_day(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// The calendar date of this instant in UTC.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Add a duration, returning `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0
            .checked_add_signed(duration)
            .map(|dt| Self(truncate_to_seconds(dt)))
    }

    /// Signed duration elapsed from `earlier` to `self`.
    pub fn since(&self, earlier: Timestamp) -> Duration {
        self.0.signed_duration_since(earlier.0)
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl std::str::FromStr for Timestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_iso8601()
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(ts.to_iso8601(), "2024-01-15T12:30:45Z");
    }

    #[test]
    fn test_parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(ts.to_string(), "2024-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_offsets_rejected() {
        assert!(Timestamp::parse("2024-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2024-01-15T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("2024-01-15").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn test_parse_lenient_converts_offset() {
        let ts = Timestamp::parse_lenient("2024-01-15T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2024-01-15T12:00:00Z");
    }

    #[test]
    fn test_from_str_uses_strict_parser() {
        let ts: Timestamp = "2024-03-01T08:00:00Z".parse().unwrap();
        assert_eq!(ts.epoch_secs(), 1_709_280_000);
        assert!("2024-03-01T08:00:00+01:00".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_start_of_day_and_date() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let ts = Timestamp::start_of_day(day);
        assert_eq!(ts.to_iso8601(), "2024-01-02T00:00:00Z");
        assert_eq!(ts.date(), day);
    }

    #[test]
    fn test_checked_add_and_since() {
        let ts = Timestamp::parse("2024-01-15T12:00:00Z").unwrap();
        let later = ts.checked_add(Duration::minutes(5)).unwrap();
        assert_eq!(later.to_iso8601(), "2024-01-15T12:05:00Z");
        assert_eq!(later.since(ts), Duration::minutes(5));
        assert_eq!(ts.since(later), Duration::minutes(-5));
    }

    #[test]
    fn test_checked_add_overflow_is_none() {
        let ts = Timestamp::from_utc(DateTime::<Utc>::MAX_UTC);
        assert!(ts.checked_add(Duration::days(1)).is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2024-01-15T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-15T12:00:00Z\"");
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }

    #[test]
    fn test_deserialize_rejects_offsets() {
        assert!(serde_json::from_str::<Timestamp>("\"2024-01-01T17:00:00+05:00\"").is_err());
        assert!(serde_json::from_str::<Timestamp>("\"2024-01-01T12:00:00+00:00\"").is_err());
        assert!(serde_json::from_str::<Timestamp>("\"2024-01-01\"").is_err());
    }

    #[test]
    fn test_deserialize_truncates_subseconds() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-01T12:00:00.750Z\"").unwrap();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert_eq!(ts.to_iso8601(), "2024-01-01T12:00:00Z");
    }
}
