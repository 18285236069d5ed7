//! Time-related utilities with clock abstraction for testability.
//!
//! Timestamps are Unix milliseconds. Display uses Indochina Time (UTC+7),
//! the local time of the hospitals the registration form is used in.

use chrono::{DateTime, FixedOffset, Utc};

/// Indochina Time offset (UTC+7)
pub const ICT: FixedOffset = match FixedOffset::east_opt(7 * 3600) {
    Some(offset) => offset,
    None => panic!("invalid ICT offset"),
};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

fn to_ict(timestamp_millis: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis).map(|dt| dt.with_timezone(&ICT))
}

/// Convert Unix timestamp (milliseconds) to an ICT wall-clock time (`HH:MM:SS`)
///
/// Falls back to the raw number when the timestamp is out of range.
pub fn timestamp_to_ict_clock(timestamp_millis: i64) -> String {
    to_ict(timestamp_millis)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_millis.to_string())
}
