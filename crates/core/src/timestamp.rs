//! Canonical timestamp type
//!
//! Temporal fields cross the wire as strings in exactly one format,
//! [`CANONICAL_FORMAT`], with microsecond precision and no zone suffix
//! (all times are UTC):
//!
//! ```text
//! 2012-10-29T13:42:11.000000
//! ```
//!
//! [`Timestamp`] serializes to that string and parses back from it, so a
//! timestamp that leaves the conductor can be fed to an update operation
//! and arrive at the store unchanged.
//!
//! ```
//! use conductor_core::Timestamp;
//!
//! let ts = Timestamp::parse_canonical("2012-10-29T13:42:11.250000").unwrap();
//! assert_eq!(ts.to_canonical(), "2012-10-29T13:42:11.250000");
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The one wire format for temporal values.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Error returned when a string is not in [`CANONICAL_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp '{input}': expected format {CANONICAL_FORMAT}")]
pub struct TimestampParseError {
    /// The rejected input
    pub input: String,
}

/// UTC timestamp with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Create a timestamp for the current moment, truncated to microseconds.
    pub fn now() -> Self {
        Self::from_naive(Utc::now().naive_utc())
    }

    /// Wrap a naive UTC datetime, truncating anything below a microsecond.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        let micros = dt.and_utc().timestamp_micros();
        Timestamp(
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|d| d.naive_utc())
                .unwrap_or(dt),
        )
    }

    /// Create a timestamp from microseconds since the Unix epoch.
    pub fn from_micros(micros: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp_micros(micros).map(|d| Timestamp(d.naive_utc()))
    }

    /// Microseconds since the Unix epoch.
    pub fn as_micros(&self) -> i64 {
        self.0.and_utc().timestamp_micros()
    }

    /// The underlying naive UTC datetime.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Parse a string in [`CANONICAL_FORMAT`].
    pub fn parse_canonical(s: &str) -> Result<Self, TimestampParseError> {
        NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT)
            .map(Self::from_naive)
            .map_err(|_| TimestampParseError {
                input: s.to_string(),
            })
    }

    /// Render in [`CANONICAL_FORMAT`].
    pub fn to_canonical(&self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }

    /// The timestamp `duration` earlier, saturating at the representable minimum.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| self.0.checked_sub_signed(d))
            .map(Timestamp)
            .unwrap_or(Timestamp(NaiveDateTime::MIN))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self::from_naive(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse_canonical(&s).map_err(de::Error::custom)
    }
}
