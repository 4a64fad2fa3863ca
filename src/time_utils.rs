//! Time utility functions
//!
//! Heartbeat timestamps are kept as `DateTime<Utc>` and travel over the wire
//! as floating-point Unix seconds.

use chrono::{DateTime, Utc};
use serde::Serializer;

/// Convert a timestamp to Unix seconds with microsecond precision
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use pairing_registry::time_utils::unix_seconds;
///
/// let t = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
/// assert_eq!(unix_seconds(&t), 1_700_000_000.5);
/// ```
pub fn unix_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

/// Serde helper for `#[serde(serialize_with = ...)]` on heartbeat fields
pub fn serialize_unix_seconds<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(unix_seconds(time))
}
