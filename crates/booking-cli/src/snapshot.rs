//! JSON persistence of the bookings list.

use std::path::Path;

use anyhow::{Context, Result};
use booking_engine::Booking;

/// Read the bookings file. A missing file is an empty calendar.
pub fn load(path: &Path) -> Result<Vec<Booking>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no bookings file yet");
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bookings file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid bookings file: {}", path.display()))
}

/// Write the bookings file via a sibling temp file and rename.
pub fn save(path: &Path, bookings: &[Booking]) -> Result<()> {
    let json = serde_json::to_string_pretty(bookings).context("Failed to serialize bookings")?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json + "\n")
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = bookings.len(), "bookings saved");
    Ok(())
}
