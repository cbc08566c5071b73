//! Timestamp value object for temporal data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp for order submission, fills and expiry windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a new Timestamp from a DateTime<Utc>.
    #[must_use]
    pub const fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner DateTime<Utc>.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Get the Unix timestamp in milliseconds.
    #[must_use]
    pub fn unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Calculate duration since another timestamp.
    #[must_use]
    pub fn duration_since(&self, other: Self) -> Duration {
        self.0 - other.0
    }

    /// Shift this timestamp by a signed duration.
    #[must_use]
    pub fn plus(&self, delta: Duration) -> Self {
        Self(self.0 + delta)
    }

    /// True when `now - self` is strictly greater than `window`.
    #[must_use]
    pub fn is_older_than(&self, window: Duration, now: Self) -> bool {
        now.duration_since(*self) > window
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ordering() {
        let a = Timestamp::now();
        let b = a.plus(Duration::milliseconds(5));
        assert!(a < b);
        assert_eq!(b.duration_since(a), Duration::milliseconds(5));
    }

    #[test]
    fn older_than_is_strict() {
        let t0 = Timestamp::now();
        let window = Duration::seconds(30);
        assert!(!t0.is_older_than(window, t0.plus(Duration::seconds(30))));
        assert!(t0.is_older_than(window, t0.plus(Duration::milliseconds(30_001))));
    }
}
