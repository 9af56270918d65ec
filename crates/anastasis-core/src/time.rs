//! Absolute timestamps, stored as microseconds per spec.md §6
//! ("all timestamps stored as microsecond absolute").

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Microsecond-resolution absolute Unix timestamp.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// A timestamp that never expires (used for forever-valid challenge
    /// codes under payment-plugin-managed methods, see spec.md §4.4).
    pub const NEVER: Timestamp = Timestamp(i64::MAX);

    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_micros())
    }

    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    pub fn is_past(&self, now: Timestamp) -> bool {
        *self < now
    }

    pub fn is_future(&self, now: Timestamp) -> bool {
        *self > now
    }
}

/// A relative duration, also microsecond-resolution.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Duration(pub i64);

impl Duration {
    pub fn from_secs(secs: i64) -> Self {
        Duration(secs.saturating_mul(1_000_000))
    }

    pub fn from_hours(hours: i64) -> Self {
        Self::from_secs(hours * 3600)
    }

    pub fn from_days(days: i64) -> Self {
        Self::from_secs(days * 86_400)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.0))
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;
    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_sub(rhs.0))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;
    fn sub(self, rhs: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(rhs.0))
    }
}
