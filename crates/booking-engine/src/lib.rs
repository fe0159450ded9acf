//! # booking-engine
//!
//! Deterministic booking validation for a single-resource appointment
//! calendar.
//!
//! The engine decides whether a proposed appointment is well-formed and free,
//! derives its end from the booked service when needed, finds free slots, and
//! provides a ledger that re-checks every write under a lock so that two
//! callers working from the same snapshot cannot both take one slot.
//!
//! All intervals are half-open `[start, end)`: back-to-back bookings never
//! conflict.
//!
//! ## Modules
//!
//! - [`interval`]: `TimeInterval` and timezone-aware instant parsing
//! - [`service`]: Service catalog seam and duration lookup
//! - [`booking`]: Bookings, requests and viewer-dependent redaction
//! - [`validator`]: Well-formedness, overlap and duration rules
//! - [`freebusy`]: Free gaps and bookable slots within opening hours
//! - [`ledger`]: Authoritative store with locked read-check-write
//! - [`error`]: Error types

pub mod booking;
pub mod error;
pub mod freebusy;
pub mod interval;
pub mod ledger;
pub mod service;
pub mod validator;

pub use booking::{
    Amendment, Booking, BookingDraft, BookingId, BookingRequest, Contact, UserId, Viewer,
};
pub use error::{BookingError, LedgerError};
pub use freebusy::{
    bookable_slots, business_day_window, find_free_slots, first_available, FreeSlot,
};
pub use interval::{parse_instant, TimeInterval};
pub use ledger::{BookingLedger, InMemoryLedger};
pub use service::{resolve_duration, InMemoryCatalog, Service, ServiceCatalog, ServiceId};
pub use validator::{
    find_conflict, find_conflicts, resolve_slot, validate, validate_request,
    validate_reschedule, validate_str, CalendarContext, ConflictSet,
};
