//! Half-open time intervals and instant parsing.
//!
//! Every slot in the engine is a [`TimeInterval`] `[start, end)`: the start
//! instant is included, the end instant is not. Two intervals that merely
//! touch (`a.end == b.start`) never overlap, so back-to-back bookings are
//! always allowed.
//!
//! Inputs arrive either as RFC 3339 strings with an explicit offset or as
//! naive wall-clock strings that are interpreted in the calendar's IANA
//! timezone. A wall-clock time that does not exist (DST spring-forward gap)
//! or exists twice (DST fall-back) is rejected rather than guessed.

use std::fmt;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Naive wall-clock formats accepted by [`parse_instant`].
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A non-empty half-open interval `[start, end)` of UTC instants.
///
/// The invariant `start < end` is enforced by every constructor, including
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = BookingError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(iv: TimeInterval) -> Self {
        RawInterval {
            start: iv.start,
            end: iv.end,
        }
    }
}

impl TimeInterval {
    /// Build an interval, rejecting empty or inverted bounds.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidInterval`] when `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(BookingError::InvalidInterval(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(TimeInterval { start, end })
    }

    /// Build an interval from a start instant and a positive length.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Result<Self> {
        let end = start.checked_add_signed(length).ok_or_else(|| {
            BookingError::InvalidInterval(format!(
                "{} + {}m is out of range",
                start.to_rfc3339(),
                length.num_minutes()
            ))
        })?;
        TimeInterval::new(start, end)
    }

    /// Parse both bounds with [`parse_instant`] and check ordering.
    ///
    /// # Examples
    ///
    /// ```
    /// use booking_engine::TimeInterval;
    ///
    /// let tz: chrono_tz::Tz = "Europe/Warsaw".parse().unwrap();
    /// let iv = TimeInterval::parse("2026-03-02T09:00", "2026-03-02T10:00", &tz).unwrap();
    /// assert_eq!(iv.start().to_rfc3339(), "2026-03-02T08:00:00+00:00");
    /// assert_eq!(iv.duration_minutes(), 60);
    /// ```
    pub fn parse(start: &str, end: &str, tz: &Tz) -> Result<Self> {
        let start = parse_instant(start, tz)?;
        let end = parse_instant(end, tz)?;
        TimeInterval::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Half-open overlap: `self.start < other.end && self.end > other.start`.
    ///
    /// Touching endpoints are not an overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when the intervals share exactly one endpoint and nothing else.
    pub fn is_adjacent(&self, other: &TimeInterval) -> bool {
        self.end == other.start || self.start == other.end
    }

    /// True when `other` lies entirely within `self`.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when `instant` falls in `[start, end)`.
    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Parse a datetime string into a UTC instant.
///
/// Accepts RFC 3339 with an explicit offset (`2026-03-02T09:00:00+01:00`,
/// `2026-03-02T08:00:00Z`), or a naive local datetime (`2026-03-02T09:00`,
/// `2026-03-02 09:00:00`) which is interpreted in `tz`.
///
/// # Errors
///
/// Returns [`BookingError::InvalidInterval`] if the string matches no
/// accepted format, or if the local time is nonexistent or ambiguous in `tz`.
pub fn parse_instant(s: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return Err(BookingError::InvalidInterval("empty datetime".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| BookingError::InvalidInterval(format!("cannot parse datetime '{s}'")))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(BookingError::InvalidInterval(format!(
            "'{s}' does not exist in {}",
            tz.name()
        ))),
        LocalResult::Ambiguous(_, _) => Err(BookingError::InvalidInterval(format!(
            "'{s}' is ambiguous in {}",
            tz.name()
        ))),
    }
}
