//! Service catalog: named appointment categories and their durations.
//!
//! The engine never owns the catalog. Callers hand in anything that
//! implements [`ServiceCatalog`]; [`InMemoryCatalog`] is the simple
//! configuration-backed implementation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Identifier of a service in the external catalog.
///
/// `ServiceId(0)` is the "unspecified" sentinel used by older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u32);

impl ServiceId {
    pub const UNSPECIFIED: ServiceId = ServiceId(0);

    pub fn is_unspecified(self) -> bool {
        self == ServiceId::UNSPECIFIED
    }

    /// Replace the unspecified sentinel with `default`.
    pub fn or_default_to(self, default: ServiceId) -> ServiceId {
        if self.is_unspecified() {
            default
        } else {
            self
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named appointment category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: i64,
}

impl Service {
    /// `duration_minutes` as a [`Duration`], or `None` when it does not fit.
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_minutes(self.duration_minutes)
    }
}

/// Lookup seam for the external service catalog.
pub trait ServiceCatalog {
    /// Resolve a service id, or `None` if the catalog does not know it.
    fn lookup(&self, id: ServiceId) -> Option<Service>;
}

/// A catalog held in memory, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    services: BTreeMap<ServiceId, Service>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a service. Returns the previous entry for that id.
    pub fn insert(&mut self, service: Service) -> Option<Service> {
        self.services.insert(service.id, service)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl FromIterator<Service> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Service>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for service in iter {
            catalog.insert(service);
        }
        catalog
    }
}

impl ServiceCatalog for InMemoryCatalog {
    fn lookup(&self, id: ServiceId) -> Option<Service> {
        self.services.get(&id).cloned()
    }
}

/// Resolve the duration of a service.
///
/// # Errors
///
/// Returns [`BookingError::UnknownService`] if the catalog has no entry for
/// `id`, or if the entry's duration is not positive or out of range.
pub fn resolve_duration<C: ServiceCatalog + ?Sized>(catalog: &C, id: ServiceId) -> Result<Duration> {
    let Some(service) = catalog.lookup(id) else {
        return Err(BookingError::UnknownService(id));
    };
    match service.duration() {
        Some(duration) if duration > Duration::zero() => Ok(duration),
        _ => {
            tracing::debug!(
                service = %id,
                duration_minutes = service.duration_minutes,
                "service has no usable duration"
            );
            Err(BookingError::UnknownService(id))
        }
    }
}
