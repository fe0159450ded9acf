//! The authoritative booking store.
//!
//! Validation against a caller's snapshot is only advisory: two callers can
//! read the same snapshot, both see a free slot and both try to commit it.
//! A [`BookingLedger`] closes that race by re-running the conflict check
//! against its own current contents inside the same critical section that
//! performs the write. Whoever commits second gets
//! [`BookingError::SlotConflict`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::booking::{Amendment, Booking, BookingDraft, BookingId};
use crate::error::LedgerError;
use crate::interval::TimeInterval;
use crate::validator::ConflictSet;

/// A store that validates every write under mutual exclusion.
pub trait BookingLedger {
    /// Current bookings, ordered by start time.
    fn snapshot(&self) -> Vec<Booking>;

    /// Commit a new booking if its slot is still free.
    fn create(&self, draft: BookingDraft) -> Result<Booking, LedgerError>;

    /// Apply `change` to booking `id` if its new slot is free of every
    /// other booking.
    fn amend(&self, id: BookingId, change: Amendment) -> Result<Booking, LedgerError>;

    /// Move booking `id` to `slot` if no other booking occupies it.
    fn reschedule(&self, id: BookingId, slot: TimeInterval) -> Result<Booking, LedgerError> {
        self.amend(id, Amendment::move_to(slot))
    }

    /// Remove booking `id`, returning what was removed.
    fn cancel(&self, id: BookingId) -> Result<Booking, LedgerError>;
}

#[derive(Debug)]
struct LedgerState {
    /// `None` once the id space is used up.
    next_id: Option<u64>,
    bookings: Vec<Booking>,
}

impl Default for LedgerState {
    fn default() -> Self {
        LedgerState {
            next_id: Some(1),
            bookings: Vec::new(),
        }
    }
}

impl LedgerState {
    fn position(&self, id: BookingId) -> Result<usize, LedgerError> {
        self.bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or(LedgerError::NotFound(id))
    }
}

/// A [`BookingLedger`] held in process memory behind a [`Mutex`].
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with previously persisted bookings.
    ///
    /// New ids continue after the highest id present. Existing bookings are
    /// taken as-is, even if they overlap each other. If the highest id is
    /// `u64::MAX`, every later [`BookingLedger::create`] fails with
    /// [`LedgerError::IdsExhausted`].
    pub fn from_bookings(bookings: Vec<Booking>) -> Self {
        let next_id = bookings
            .iter()
            .map(|b| b.id.0)
            .max()
            .map_or(Some(1), |max| max.checked_add(1));
        InMemoryLedger {
            state: Mutex::new(LedgerState { next_id, bookings }),
        }
    }

    /// Consume the ledger, returning bookings ordered by start time.
    pub fn into_bookings(self) -> Vec<Booking> {
        let mut bookings = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .bookings;
        sort_by_start(&mut bookings);
        bookings
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // Every mutation is a single push/assign/remove, so state behind a
        // poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BookingLedger for InMemoryLedger {
    fn snapshot(&self) -> Vec<Booking> {
        let mut bookings = self.lock().bookings.clone();
        sort_by_start(&mut bookings);
        bookings
    }

    fn create(&self, draft: BookingDraft) -> Result<Booking, LedgerError> {
        let mut state = self.lock();
        ConflictSet::from_bookings(&state.bookings).check(&draft.slot)?;

        let next = state.next_id.ok_or(LedgerError::IdsExhausted)?;
        let id = BookingId(next.max(1));
        state.next_id = id.0.checked_add(1);
        let booking = draft.with_id(id);
        state.bookings.push(booking.clone());

        tracing::debug!(id = id.0, slot = %booking.slot, "booking committed");
        Ok(booking)
    }

    fn amend(&self, id: BookingId, change: Amendment) -> Result<Booking, LedgerError> {
        let mut state = self.lock();
        let idx = state.position(id)?;
        ConflictSet::from_bookings(&state.bookings)
            .excluding(id)
            .check(&change.slot)?;

        let booking = &mut state.bookings[idx];
        let previous = booking.slot;
        booking.slot = change.slot;
        if let Some(service) = change.service {
            booking.service = service;
        }
        if let Some(contact) = change.contact {
            booking.contact = contact;
        }

        tracing::debug!(id = id.0, from = %previous, to = %booking.slot, "booking amended");
        Ok(booking.clone())
    }

    fn cancel(&self, id: BookingId) -> Result<Booking, LedgerError> {
        let mut state = self.lock();
        let idx = state.position(id)?;
        let removed = state.bookings.remove(idx);

        tracing::debug!(id = id.0, slot = %removed.slot, "booking cancelled");
        Ok(removed)
    }
}

fn sort_by_start(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| a.slot.cmp(&b.slot).then(a.id.cmp(&b.id)));
}
