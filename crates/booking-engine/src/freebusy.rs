//! Free-slot computation within a booking window.
//!
//! Busy intervals are clipped to the window, sorted and merged (touching
//! intervals merge into one block), and the gaps between blocks are the free
//! slots. Gaps follow the same half-open convention as the validator, so any
//! slot returned here is accepted by [`validate`](crate::validate).

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{BookingError, Result};
use crate::interval::TimeInterval;

/// A free gap in the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeSlot {
    #[serde(flatten)]
    pub slot: TimeInterval,
    pub duration_minutes: i64,
}

impl From<TimeInterval> for FreeSlot {
    fn from(slot: TimeInterval) -> Self {
        FreeSlot {
            slot,
            duration_minutes: slot.duration_minutes(),
        }
    }
}

/// Find gaps of at least `min_duration` inside `window`.
///
/// `busy` may be unsorted and may overlap itself or extend past the window.
/// A non-positive `min_duration` returns every gap.
pub fn find_free_slots(
    window: &TimeInterval,
    busy: &[TimeInterval],
    min_duration: Duration,
) -> Vec<FreeSlot> {
    let mut free = Vec::new();
    let mut cursor = window.start();

    for block in merge_busy(window, busy) {
        if block.start() > cursor {
            push_gap(&mut free, cursor, block.start(), min_duration);
        }
        cursor = cursor.max(block.end());
    }
    if window.end() > cursor {
        push_gap(&mut free, cursor, window.end(), min_duration);
    }

    free
}

/// Earliest interval of exactly `duration` inside `window` that overlaps
/// nothing in `busy`.
pub fn first_available(
    window: &TimeInterval,
    busy: &[TimeInterval],
    duration: Duration,
) -> Option<TimeInterval> {
    if duration <= Duration::zero() {
        return None;
    }
    find_free_slots(window, busy, duration)
        .first()
        .and_then(|gap| TimeInterval::starting_at(gap.slot.start(), duration).ok())
}

/// Bookable start times on a fixed grid.
///
/// Walks `window` in steps of `step` from its start and keeps each
/// `[t, t + duration)` that fits inside the window and overlaps nothing in
/// `busy`.
pub fn bookable_slots(
    window: &TimeInterval,
    busy: &[TimeInterval],
    duration: Duration,
    step: Duration,
) -> Vec<TimeInterval> {
    if duration <= Duration::zero() || step <= Duration::zero() {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut t = window.start();
    while let Ok(candidate) = TimeInterval::starting_at(t, duration) {
        if candidate.end() > window.end() {
            break;
        }
        if !busy.iter().any(|b| candidate.overlaps(b)) {
            slots.push(candidate);
        }
        match t.checked_add_signed(step) {
            Some(next) => t = next,
            None => break,
        }
    }
    slots
}

/// The opening-hours window of `date` in `tz`.
///
/// # Errors
///
/// Returns [`BookingError::InvalidInterval`] if `close` is not after `open`,
/// or if either wall-clock time is nonexistent or ambiguous on that date.
pub fn business_day_window(
    date: NaiveDate,
    open: NaiveTime,
    close: NaiveTime,
    tz: &Tz,
) -> Result<TimeInterval> {
    let local = |time: NaiveTime| match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        _ => Err(BookingError::InvalidInterval(format!(
            "{date} {time} is not a unique local time in {}",
            tz.name()
        ))),
    };
    TimeInterval::new(local(open)?, local(close)?)
}

/// Clip to `window`, sort, and merge overlapping or touching intervals.
fn merge_busy(window: &TimeInterval, busy: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut clipped: Vec<TimeInterval> = busy
        .iter()
        .filter(|b| b.overlaps(window))
        .filter_map(|b| {
            TimeInterval::new(b.start().max(window.start()), b.end().min(window.end())).ok()
        })
        .collect();
    clipped.sort();

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(clipped.len());
    for b in clipped {
        match merged.last_mut() {
            Some(last) if b.start() <= last.end() => {
                if b.end() > last.end() {
                    // start < end holds: last.start <= b.start < b.end
                    if let Ok(joined) = TimeInterval::new(last.start(), b.end()) {
                        *last = joined;
                    }
                }
            }
            _ => merged.push(b),
        }
    }
    merged
}

fn push_gap(
    free: &mut Vec<FreeSlot>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_duration: Duration,
) {
    if end - start < min_duration {
        return;
    }
    if let Ok(gap) = TimeInterval::new(start, end) {
        free.push(gap.into());
    }
}
