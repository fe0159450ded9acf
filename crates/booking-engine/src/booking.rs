//! Bookings, contact details and viewer-dependent redaction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interval::TimeInterval;
use crate::service::ServiceId;

/// Opaque booking identity, assigned by the persistence side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a registered user who may own bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Contact metadata. Never consulted by conflict logic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// An accepted booking on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    pub contact: Contact,
    pub service: ServiceId,
    pub slot: TimeInterval,
}

/// A validated booking that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub owner: Option<UserId>,
    pub contact: Contact,
    pub service: ServiceId,
    pub slot: TimeInterval,
}

impl BookingDraft {
    pub fn with_id(self, id: BookingId) -> Booking {
        Booking {
            id,
            owner: self.owner,
            contact: self.contact,
            service: self.service,
            slot: self.slot,
        }
    }
}

/// Changes to an existing booking. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amendment {
    pub slot: TimeInterval,
    pub service: Option<ServiceId>,
    pub contact: Option<Contact>,
}

impl Amendment {
    /// Move to `slot`, leaving everything else as it is.
    pub fn move_to(slot: TimeInterval) -> Self {
        Amendment {
            slot,
            service: None,
            contact: None,
        }
    }
}

/// Everything a caller supplies to propose a booking, gathered up front
/// and validated in one pass.
///
/// `start`/`end` are unparsed strings so that parse failures surface as
/// [`BookingError::InvalidInterval`](crate::BookingError::InvalidInterval)
/// from the validator. Without `end`, the end is derived from the service
/// duration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub owner: Option<UserId>,
    pub contact: Contact,
    #[serde(default)]
    pub service: Option<ServiceId>,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

/// Who is looking at the calendar.
///
/// Passed explicitly to anything whose output depends on the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
    /// Anonymous visitor: sees only which slots are taken.
    #[default]
    Guest,
    /// Logged-in user: sees their own bookings in full.
    Member(UserId),
    /// Administrator: sees everything.
    Admin,
}

impl Viewer {
    fn can_see(&self, booking: &Booking) -> bool {
        match self {
            Viewer::Admin => true,
            Viewer::Member(user) => booking.owner == Some(*user),
            Viewer::Guest => false,
        }
    }
}

impl Booking {
    /// Copy of this booking as `viewer` is allowed to see it.
    ///
    /// Hidden bookings keep their id and slot; contact details, owner and
    /// service are masked.
    pub fn redacted_for(&self, viewer: &Viewer) -> Booking {
        if viewer.can_see(self) {
            return self.clone();
        }
        Booking {
            id: self.id,
            owner: None,
            contact: Contact {
                name: "Taken".to_string(),
                surname: String::new(),
                email: "Hidden".to_string(),
                phone: Some("Hidden".to_string()),
            },
            service: ServiceId::UNSPECIFIED,
            slot: self.slot,
        }
    }
}
