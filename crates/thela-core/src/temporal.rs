//! # Temporal Types: UTC-Only Timestamps
//!
//! `Timestamp` is a UTC instant truncated to whole seconds. It serializes
//! as `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! ## Invariant
//!
//! Hash-covered dates (`bill_date`, `uploaded_at`, hop timestamps) must
//! produce identical canonical bytes when a record is hashed at append time
//! and re-hashed at verify time. PostgreSQL stores microseconds and other
//! backends may store less, so sub-second precision is dropped at
//! construction rather than at hashing.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A UTC timestamp with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 timestamp. Any offset is accepted and converted
    /// to UTC; sub-seconds are dropped.
    ///
    /// Callers send bill dates from browsers and phones in local time, so
    /// offsets are normalized here instead of being rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: secs.to_string(),
                reason: "out of range".to_string(),
            })
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc
            .with_ymd_and_hms(2025, 3, 9, 6, 30, 45)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_iso8601(), "2025-03-09T06:30:45Z");
    }

    #[test]
    fn parse_normalizes_offset_to_utc() {
        let ts = Timestamp::parse("2025-03-09T12:00:00+05:30").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-03-09T06:30:00Z");
    }

    #[test]
    fn parse_drops_subseconds() {
        let ts = Timestamp::parse("2025-03-09T06:30:00.123456Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-03-09T06:30:00Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
        assert!(Timestamp::parse("2025-03-09").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn serde_uses_iso8601_z() {
        let ts = Timestamp::parse("2025-03-09T06:30:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#""2025-03-09T06:30:00Z""#);
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn epoch_roundtrip_and_ordering() {
        let a = Timestamp::parse("2025-03-09T06:30:00Z").unwrap();
        let b = Timestamp::from_epoch_secs(a.epoch_secs() + 1).unwrap();
        assert!(a < b);
        assert_eq!(Timestamp::from_epoch_secs(a.epoch_secs()).unwrap(), a);
    }
}
