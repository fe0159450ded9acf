//! Booking validation and conflict detection.
//!
//! A proposal is accepted when it is a well-formed half-open interval that
//! overlaps nothing in the caller's snapshot of the calendar. Everything here
//! is a pure function of its arguments: the same proposal against the same
//! snapshot always yields the same answer, and nothing is mutated.
//!
//! The snapshot is advisory. Two callers holding the same snapshot can both
//! be told "accepted"; the authoritative check happens again under a lock in
//! [`ledger`](crate::ledger) before anything is committed.
//!
//! # Rules
//!
//! 1. **Well-formedness**: both bounds parse and `start < end`, otherwise
//!    [`BookingError::InvalidInterval`].
//! 2. **Overlap**: `proposed` conflicts with `e` iff
//!    `proposed.start < e.end && proposed.end > e.start`. Touching endpoints
//!    are not a conflict. The first conflict in snapshot order is reported as
//!    [`BookingError::SlotConflict`].
//! 3. **Duration derivation**: with no explicit end, `end = start +
//!    service.duration`. The service must resolve to a positive duration,
//!    otherwise [`BookingError::UnknownService`]. The service is checked
//!    before the interval, so an unknown service is reported even when the
//!    interval is also bad.

use chrono_tz::Tz;

use crate::booking::{Booking, BookingDraft, BookingId, BookingRequest};
use crate::error::{BookingError, Result};
use crate::interval::{parse_instant, TimeInterval};
use crate::service::{resolve_duration, ServiceCatalog, ServiceId};

/// Per-calendar settings that shape how requests are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarContext {
    /// Zone used for naive wall-clock inputs.
    pub timezone: Tz,
    /// Service used when a request leaves it unspecified.
    pub default_service: ServiceId,
}

impl Default for CalendarContext {
    fn default() -> Self {
        CalendarContext {
            timezone: Tz::UTC,
            default_service: ServiceId(1),
        }
    }
}

/// Existing bookings on one calendar, as seen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    entries: Vec<(Option<BookingId>, TimeInterval)>,
}

impl ConflictSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_intervals(intervals: &[TimeInterval]) -> Self {
        intervals.iter().copied().collect()
    }

    pub fn from_bookings(bookings: &[Booking]) -> Self {
        ConflictSet {
            entries: bookings.iter().map(|b| (Some(b.id), b.slot)).collect(),
        }
    }

    pub fn push(&mut self, id: Option<BookingId>, slot: TimeInterval) {
        self.entries.push((id, slot));
    }

    /// The same set without the booking `id`, so a booking being moved is
    /// not reported as conflicting with its own current slot.
    pub fn excluding(&self, id: BookingId) -> ConflictSet {
        ConflictSet {
            entries: self
                .entries
                .iter()
                .filter(|(eid, _)| *eid != Some(id))
                .copied()
                .collect(),
        }
    }

    pub fn intervals(&self) -> impl Iterator<Item = &TimeInterval> {
        self.entries.iter().map(|(_, iv)| iv)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry overlapping `proposed`, in snapshot order.
    pub fn first_conflict(&self, proposed: &TimeInterval) -> Option<(Option<BookingId>, TimeInterval)> {
        self.entries
            .iter()
            .find(|(_, existing)| proposed.overlaps(existing))
            .copied()
    }

    /// Every entry overlapping `proposed`, in snapshot order.
    pub fn all_conflicts(&self, proposed: &TimeInterval) -> Vec<(Option<BookingId>, TimeInterval)> {
        self.entries
            .iter()
            .filter(|(_, existing)| proposed.overlaps(existing))
            .copied()
            .collect()
    }

    /// Check `proposed` against this set (rule 2).
    pub fn check(&self, proposed: &TimeInterval) -> Result<TimeInterval> {
        match self.first_conflict(proposed) {
            Some((booking_id, conflicting)) => {
                tracing::debug!(
                    %proposed,
                    %conflicting,
                    booking_id = booking_id.map(|id| id.0),
                    "slot conflict"
                );
                Err(BookingError::SlotConflict {
                    proposed: *proposed,
                    conflicting,
                    booking_id,
                })
            }
            None => Ok(*proposed),
        }
    }
}

impl FromIterator<TimeInterval> for ConflictSet {
    fn from_iter<I: IntoIterator<Item = TimeInterval>>(iter: I) -> Self {
        ConflictSet {
            entries: iter.into_iter().map(|iv| (None, iv)).collect(),
        }
    }
}

/// Validate a proposed interval against existing ones.
///
/// Returns the interval to persist when it overlaps nothing in `existing`.
///
/// # Errors
///
/// Returns [`BookingError::SlotConflict`] carrying the first overlapping
/// interval. Well-formedness is guaranteed by [`TimeInterval`] itself.
///
/// # Examples
///
/// ```
/// use booking_engine::{validate, TimeInterval};
///
/// let tz = chrono_tz::Tz::UTC;
/// let existing = [TimeInterval::parse("2026-03-02T09:00", "2026-03-02T10:00", &tz).unwrap()];
///
/// // Back-to-back is fine
/// let next = TimeInterval::parse("2026-03-02T10:00", "2026-03-02T11:00", &tz).unwrap();
/// assert!(validate(&next, &existing).is_ok());
///
/// // Overlap is not
/// let clash = TimeInterval::parse("2026-03-02T09:30", "2026-03-02T10:30", &tz).unwrap();
/// assert!(validate(&clash, &existing).is_err());
/// ```
pub fn validate(proposed: &TimeInterval, existing: &[TimeInterval]) -> Result<TimeInterval> {
    ConflictSet::from_intervals(existing).check(proposed)
}

/// Validate a proposal given as raw strings.
///
/// Parse failures and inverted bounds are both reported as
/// [`BookingError::InvalidInterval`].
pub fn validate_str(
    start: &str,
    end: &str,
    existing: &[TimeInterval],
    tz: &Tz,
) -> Result<TimeInterval> {
    let proposed = TimeInterval::parse(start, end, tz).inspect_err(|e| {
        tracing::debug!(start, end, error = %e, "rejected malformed interval");
    })?;
    validate(&proposed, existing)
}

/// First interval in `existing` that overlaps `proposed`.
pub fn find_conflict<'a>(
    proposed: &TimeInterval,
    existing: &'a [TimeInterval],
) -> Option<&'a TimeInterval> {
    existing.iter().find(|e| proposed.overlaps(e))
}

/// Every interval in `existing` that overlaps `proposed`, in input order.
pub fn find_conflicts<'a>(
    proposed: &TimeInterval,
    existing: &'a [TimeInterval],
) -> Vec<&'a TimeInterval> {
    existing.iter().filter(|e| proposed.overlaps(e)).collect()
}

/// Turn a start, optional end and service into a concrete interval (rule 3,
/// then rule 1).
///
/// The service is resolved first, so an unknown service wins over a
/// malformed interval.
pub fn resolve_slot<C: ServiceCatalog + ?Sized>(
    start: &str,
    end: Option<&str>,
    service: ServiceId,
    catalog: &C,
    tz: &Tz,
) -> Result<TimeInterval> {
    let duration = resolve_duration(catalog, service).inspect_err(|_| {
        tracing::debug!(service = %service, "unknown service");
    })?;

    match end {
        Some(end) => TimeInterval::parse(start, end, tz),
        None => TimeInterval::starting_at(parse_instant(start, tz)?, duration),
    }
}

/// Validate a complete booking request against a snapshot.
///
/// Applies the unspecified-service default from `ctx`, derives the end from
/// the service duration when absent, then checks for conflicts. Returns a
/// draft ready to hand to a [`BookingLedger`](crate::ledger::BookingLedger).
pub fn validate_request<C: ServiceCatalog + ?Sized>(
    request: &BookingRequest,
    catalog: &C,
    conflicts: &ConflictSet,
    ctx: &CalendarContext,
) -> Result<BookingDraft> {
    let service = request
        .service
        .unwrap_or(ServiceId::UNSPECIFIED)
        .or_default_to(ctx.default_service);

    let slot = resolve_slot(
        &request.start,
        request.end.as_deref(),
        service,
        catalog,
        &ctx.timezone,
    )?;
    let slot = conflicts.check(&slot)?;

    Ok(BookingDraft {
        owner: request.owner,
        contact: request.contact.clone(),
        service,
        slot,
    })
}

/// Validate moving booking `id` to `proposed`.
///
/// The booking's own current slot is ignored, so shifting a booking within
/// its existing time is allowed.
pub fn validate_reschedule(
    id: BookingId,
    proposed: &TimeInterval,
    conflicts: &ConflictSet,
) -> Result<TimeInterval> {
    conflicts.excluding(id).check(proposed)
}
