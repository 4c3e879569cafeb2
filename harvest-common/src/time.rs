//! Utilities to deal with the agent's time types.
//!
//! All harvest bookkeeping happens in whole microseconds. Timestamps are relative to an arbitrary
//! but fixed epoch (usually the UNIX epoch), and the sampling code never reads a global clock on
//! its own: the current time is always passed in explicitly.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of microseconds in a second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// A point in time, in microseconds since the epoch.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from the given number of microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Creates a timestamp from the given number of full seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MICROS_PER_SEC))
    }

    /// Creates a timestamp from the given system time.
    ///
    /// Times before the UNIX epoch are clamped to [`Timestamp::ZERO`].
    pub fn from_system(time: SystemTime) -> Self {
        let micros = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();

        Self(u64::try_from(micros).unwrap_or(u64::MAX))
    }

    /// Returns the current timestamp.
    ///
    /// Note that the system time is subject to skew, so subsequent calls may go backwards.
    #[inline]
    pub fn now() -> Self {
        Self::from_system(SystemTime::now())
    }

    /// Returns the number of microseconds since the epoch.
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Returns the fractional number of seconds since the epoch.
    ///
    /// # Example
    ///
    /// ```
    /// use harvest_common::Timestamp;
    ///
    /// assert_eq!(Timestamp::from_micros(1_500_000).as_secs_f64(), 1.5);
    /// ```
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SEC as f64
    }

    /// Adds a span to this timestamp, returning `None` on overflow.
    pub fn checked_add(self, delta: TimeDelta) -> Option<Self> {
        self.0.checked_add(delta.0).map(Self)
    }

    /// Adds a span to this timestamp, clamping at the maximum representable time.
    pub fn saturating_add(self, delta: TimeDelta) -> Self {
        Self(self.0.saturating_add(delta.0))
    }

    /// Returns the span elapsed since `earlier`, or a zero span if `earlier` is in the future.
    pub fn saturating_sub(self, earlier: Self) -> TimeDelta {
        TimeDelta(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for Timestamp {
    fn from(micros: u64) -> Self {
        Self(micros)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Self)
    }
}

/// A non-negative span of time, in microseconds.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimeDelta(u64);

impl TimeDelta {
    /// The empty span.
    pub const ZERO: Self = Self(0);

    /// Creates a span from the given number of microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Creates a span from the given number of full seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MICROS_PER_SEC))
    }

    /// Returns the length of this span in microseconds.
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Returns `true` if this span has zero length.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeDelta({}us)", self.0)
    }
}

impl From<u64> for TimeDelta {
    fn from(micros: u64) -> Self {
        Self(micros)
    }
}

impl From<TimeDelta> for Duration {
    fn from(delta: TimeDelta) -> Self {
        Duration::from_micros(delta.0)
    }
}

impl From<Duration> for TimeDelta {
    fn from(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
    }
}

impl Serialize for TimeDelta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for TimeDelta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Self)
    }
}
