//! Timetable clock handling.
//!
//! Schedules use seconds since midnight of the service day. Trips that run
//! past midnight carry times greater than 86400 (e.g. 00:10 the next day is
//! 87000), so comparisons along a trip stay well-defined without any date
//! bookkeeping.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds-of-day clock time for timetables and journeys.
///
/// Values past 86400 represent service running into the next day and order
/// naturally after every same-day time.
///
/// # Examples
///
/// ```
/// use journey_planner::domain::TransitTime;
///
/// let t = TransitTime::parse_hhmm("08:30").unwrap();
/// assert_eq!(t.seconds(), 8 * 3600 + 30 * 60);
/// assert_eq!(t.to_string(), "08:30");
///
/// // Past-midnight times display with the raw hour.
/// let late = TransitTime::from_seconds(24 * 3600 + 600);
/// assert_eq!(late.to_string(), "24:10");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitTime(u32);

impl TransitTime {
    /// Create a time from raw seconds-of-day.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// Hours up to 47 are accepted so that past-midnight schedule entries
    /// ("24:10", "25:03") parse directly.
    ///
    /// # Examples
    ///
    /// ```
    /// use journey_planner::domain::TransitTime;
    ///
    /// assert!(TransitTime::parse_hhmm("00:00").is_ok());
    /// assert!(TransitTime::parse_hhmm("23:59").is_ok());
    /// assert!(TransitTime::parse_hhmm("24:10").is_ok());
    ///
    /// assert!(TransitTime::parse_hhmm("830").is_err());
    /// assert!(TransitTime::parse_hhmm("08:60").is_err());
    /// assert!(TransitTime::parse_hhmm("48:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 47 {
            return Err(TimeError::new("hour must be 0-47"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self(hour * 3600 + minute * 60))
    }

    /// Raw seconds-of-day.
    pub fn seconds(self) -> u32 {
        self.0
    }

    /// Hour component. May exceed 23 for past-midnight times.
    pub fn hour(self) -> u32 {
        self.0 / 3600
    }

    /// Minute component (0-59).
    pub fn minute(self) -> u32 {
        (self.0 % 3600) / 60
    }

    /// True if this time lies past the service-day midnight boundary.
    pub fn is_past_midnight(self) -> bool {
        self.0 >= 86_400
    }

    /// Seconds elapsed since `earlier`, saturating at zero.
    pub fn seconds_since(self, earlier: TransitTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<u32> for TransitTime {
    type Output = Self;

    fn add(self, seconds: u32) -> Self::Output {
        Self(self.0.saturating_add(seconds))
    }
}

impl Ord for TransitTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for TransitTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransitTime({:02}:{:02}:{:02})",
            self.hour(),
            self.minute(),
            self.0 % 60
        )
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        let t = TransitTime::parse_hhmm("00:00").unwrap();
        assert_eq!(t.seconds(), 0);

        let t = TransitTime::parse_hhmm("23:59").unwrap();
        assert_eq!(t.hour(), 23);
        assert_eq!(t.minute(), 59);

        let t = TransitTime::parse_hhmm("14:30").unwrap();
        assert_eq!(t.seconds(), 14 * 3600 + 30 * 60);
    }

    #[test]
    fn parse_past_midnight() {
        let t = TransitTime::parse_hhmm("24:10").unwrap();
        assert_eq!(t.seconds(), 24 * 3600 + 600);
        assert!(t.is_past_midnight());
    }

    #[test]
    fn parse_invalid_format() {
        assert!(TransitTime::parse_hhmm("1430").is_err());
        assert!(TransitTime::parse_hhmm("14:3").is_err());
        assert!(TransitTime::parse_hhmm("14:300").is_err());
        assert!(TransitTime::parse_hhmm("14-30").is_err());
        assert!(TransitTime::parse_hhmm("ab:cd").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(TransitTime::parse_hhmm("48:00").is_err());
        assert!(TransitTime::parse_hhmm("12:60").is_err());
        assert!(TransitTime::parse_hhmm("12:99").is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(TransitTime::parse_hhmm("00:00").unwrap().to_string(), "00:00");
        assert_eq!(TransitTime::parse_hhmm("09:05").unwrap().to_string(), "09:05");
        assert_eq!(TransitTime::from_seconds(86_400 + 600).to_string(), "24:10");
    }

    #[test]
    fn ordering_across_midnight() {
        let before = TransitTime::parse_hhmm("23:55").unwrap();
        let after = TransitTime::from_seconds(86_400 + 600); // 00:10 next day

        assert!(before < after);
        assert_eq!(after.seconds_since(before), 900);
    }

    #[test]
    fn add_seconds() {
        let t = TransitTime::parse_hhmm("08:30").unwrap();
        assert_eq!(t + 90, TransitTime::from_seconds(8 * 3600 + 30 * 60 + 90));

        // Crossing midnight keeps counting.
        let late = TransitTime::parse_hhmm("23:59").unwrap();
        assert!((late + 120).is_past_midnight());
    }

    #[test]
    fn seconds_since_saturates() {
        let a = TransitTime::from_seconds(100);
        let b = TransitTime::from_seconds(300);
        assert_eq!(b.seconds_since(a), 200);
        assert_eq!(a.seconds_since(b), 0);
    }
}
