//! Error types for booking-engine operations.

use thiserror::Error;

use crate::booking::BookingId;
use crate::interval::TimeInterval;
use crate::service::ServiceId;

/// Why a proposed booking was rejected.
///
/// All three kinds are expected, caller-recoverable outcomes; none of them
/// represent a fault in the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Slot conflict: {proposed} overlaps existing booking {conflicting}")]
    SlotConflict {
        proposed: TimeInterval,
        conflicting: TimeInterval,
        booking_id: Option<BookingId>,
    },

    #[error("Unknown service: {0}")]
    UnknownService(ServiceId),
}

impl BookingError {
    /// Stable machine-readable code for API and UI mapping.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidInterval(_) => "invalid_interval",
            BookingError::SlotConflict { .. } => "slot_conflict",
            BookingError::UnknownService(_) => "unknown_service",
        }
    }

    /// The interval that caused a [`BookingError::SlotConflict`], if any.
    pub fn conflicting_interval(&self) -> Option<&TimeInterval> {
        match self {
            BookingError::SlotConflict { conflicting, .. } => Some(conflicting),
            _ => None,
        }
    }
}

/// Errors raised by a [`BookingLedger`](crate::ledger::BookingLedger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Rejected(#[from] BookingError),

    #[error("Booking not found: {0}")]
    NotFound(BookingId),

    #[error("No booking ids left")]
    IdsExhausted,
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Rejected(e) => e.code(),
            LedgerError::NotFound(_) => "not_found",
            LedgerError::IdsExhausted => "ids_exhausted",
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
