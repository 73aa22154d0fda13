//! Time units for RPC deadlines.

use crate::error::LinkError;
use std::str::FromStr;
use std::time::Duration;

/// Sub-second units an RPC deadline can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    Milliseconds,
    #[default]
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Units per second.
    pub fn per_second(&self) -> u64 {
        match self {
            TimeUnit::Milliseconds => 1_000,
            TimeUnit::Microseconds => 1_000_000,
            TimeUnit::Nanoseconds => 1_000_000_000,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "µs",
            TimeUnit::Nanoseconds => "ns",
        }
    }

    /// Expresses a duration in this unit, saturating at `u64::MAX`.
    pub fn of(&self, duration: Duration) -> u64 {
        let value = match self {
            TimeUnit::Milliseconds => duration.as_millis(),
            TimeUnit::Microseconds => duration.as_micros(),
            TimeUnit::Nanoseconds => duration.as_nanos(),
        };
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}

impl FromStr for TimeUnit {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ms" => Ok(TimeUnit::Milliseconds),
            "µs" | "us" => Ok(TimeUnit::Microseconds),
            "ns" => Ok(TimeUnit::Nanoseconds),
            other => Err(LinkError::InvalidTimeUnit(other.to_string())),
        }
    }
}

/// Converts a whole number of seconds to `unit`.
pub fn timeout_value(seconds: u64, unit: TimeUnit) -> u64 {
    seconds.saturating_mul(unit.per_second())
}
