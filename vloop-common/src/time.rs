//! Timestamp and time-of-day utilities
//!
//! Schedule windows are expressed as wall-clock times of day (`HH:MM`) and are
//! evaluated against the local clock. The [`Clock`] trait lets the sequencer be
//! driven by a fixed clock in tests.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local, NaiveTime, Timelike, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Parse a time-of-day field.
///
/// An empty (or whitespace-only) string means "not set" and yields `None`.
/// Accepts `HH:MM` and `HH:MM:SS`; seconds are kept but never affect
/// minute-resolution schedule checks.
pub fn parse_time_of_day(value: &str) -> Result<Option<NaiveTime>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("invalid time of day '{}': {}", value, e)))
}

/// Format a time of day as `HH:MM`
pub fn format_time_of_day(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Minutes since midnight (`hour * 60 + minute`)
pub fn minutes_of_day(time: &NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Source of the current local wall-clock time
pub trait Clock: Send + Sync {
    /// Current local time of day
    fn local_time(&self) -> NaiveTime;
}

/// Clock backed by the system local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Manually advanced clock
///
/// Clones share the same underlying time, so a test can hold one handle and
/// move time while the sequencer reads through another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<RwLock<NaiveTime>>,
}

impl FixedClock {
    /// Create a clock frozen at `time`
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time: Arc::new(RwLock::new(time)),
        }
    }

    /// Create a clock frozen at `hour:minute`
    ///
    /// Out-of-range values fall back to midnight.
    pub fn at(hour: u32, minute: u32) -> Self {
        Self::new(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN))
    }

    /// Move the clock to a new time of day
    pub fn set(&self, time: NaiveTime) {
        match self.time.write() {
            Ok(mut guard) => *guard = time,
            Err(poisoned) => *poisoned.into_inner() = time,
        }
    }
}

impl Clock for FixedClock {
    fn local_time(&self) -> NaiveTime {
        match self.time.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_millis_to_duration_one_second() {
        let duration = millis_to_duration(1000);
        assert_eq!(duration, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_empty_is_unset() {
        assert_eq!(parse_time_of_day("").unwrap(), None);
        assert_eq!(parse_time_of_day("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_hh_mm() {
        let t = parse_time_of_day("22:05").unwrap().unwrap();
        assert_eq!(minutes_of_day(&t), 22 * 60 + 5);
        assert_eq!(format_time_of_day(&t), "22:05");
    }

    #[test]
    fn test_parse_with_seconds() {
        let t = parse_time_of_day("07:30:59").unwrap().unwrap();
        assert_eq!(minutes_of_day(&t), 7 * 60 + 30);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("noon").is_err());
    }

    #[test]
    fn test_fixed_clock_shared_between_clones() {
        let clock = FixedClock::at(9, 0);
        let reader = clock.clone();
        clock.set(NaiveTime::from_hms_opt(18, 15, 0).unwrap());
        assert_eq!(minutes_of_day(&reader.local_time()), 18 * 60 + 15);
    }

    #[test]
    fn test_fixed_clock_out_of_range_is_midnight() {
        let clock = FixedClock::at(24, 0);
        assert_eq!(clock.local_time(), NaiveTime::MIN);
    }
}
