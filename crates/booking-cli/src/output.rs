//! JSON shapes printed on stdout.

use anyhow::{Context, Result};
use booking_engine::{Booking, BookingError, BookingId, LedgerError, TimeInterval};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Accepted<'a> {
    status: &'static str,
    #[serde(flatten)]
    slot: TimeInterval,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking: Option<&'a Booking>,
}

impl<'a> Accepted<'a> {
    pub fn slot(slot: TimeInterval) -> Self {
        Accepted {
            status: "accepted",
            slot,
            booking: None,
        }
    }

    pub fn booking(booking: &'a Booking) -> Self {
        Accepted {
            status: "accepted",
            slot: booking.slot,
            booking: Some(booking),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Rejected {
    status: &'static str,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflict: Option<TimeInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking_id: Option<BookingId>,
}

impl From<&BookingError> for Rejected {
    fn from(err: &BookingError) -> Self {
        let booking_id = match err {
            BookingError::SlotConflict { booking_id, .. } => *booking_id,
            _ => None,
        };
        Rejected {
            status: "rejected",
            code: err.code(),
            message: err.to_string(),
            conflict: err.conflicting_interval().copied(),
            booking_id,
        }
    }
}

impl From<&LedgerError> for Rejected {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::Rejected(inner) => inner.into(),
            LedgerError::NotFound(id) => Rejected {
                status: "rejected",
                code: err.code(),
                message: err.to_string(),
                conflict: None,
                booking_id: Some(*id),
            },
            LedgerError::IdsExhausted => Rejected {
                status: "rejected",
                code: err.code(),
                message: err.to_string(),
                conflict: None,
                booking_id: None,
            },
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
