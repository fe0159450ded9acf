use std::path::Path;

use anyhow::{bail, Context, Result};
use booking_engine::{CalendarContext, InMemoryCatalog, Service, ServiceCatalog, ServiceId};
use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::Deserialize;

/// On-disk shape of `booking.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// IANA timezone for wall-clock inputs
    #[serde(default = "default_timezone")]
    timezone: String,

    /// Service used when a request names none (or service 0)
    #[serde(default = "default_service")]
    default_service: u32,

    /// Opening hours, "HH:MM"
    #[serde(default = "default_open")]
    open: String,
    #[serde(default = "default_close")]
    close: String,

    /// Grid for suggested start times
    #[serde(default = "default_slot_step")]
    slot_step_minutes: i64,

    #[serde(default)]
    services: Vec<Service>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_service() -> u32 {
    1
}

fn default_open() -> String {
    "09:00".to_string()
}

fn default_close() -> String {
    "17:00".to_string()
}

fn default_slot_step() -> i64 {
    30
}

/// Validated configuration.
#[derive(Debug)]
pub struct Config {
    pub calendar: CalendarContext,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_step: Duration,
    pub catalog: InMemoryCatalog,
}

/// Load and validate the config file at `path`.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!(
            "Config file not found at {}\n\n\
            Create it with at least one service:\n\n\
            timezone = \"Europe/Warsaw\"\n\
            [[services]]\n\
            id = 1\n\
            name = \"Consultation\"\n\
            duration_minutes = 60",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}

fn parse(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content).context("Failed to parse TOML")?;

    let timezone: Tz = raw
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown timezone '{}'", raw.timezone))?;

    let open = parse_clock(&raw.open).context("invalid 'open'")?;
    let close = parse_clock(&raw.close).context("invalid 'close'")?;
    if close <= open {
        bail!("'close' ({}) must be after 'open' ({})", raw.close, raw.open);
    }

    let slot_step = positive_minutes(raw.slot_step_minutes)
        .context("'slot_step_minutes' must be a positive number of minutes")?;

    for service in &raw.services {
        if positive_minutes(service.duration_minutes).is_none() {
            bail!(
                "service {} ('{}') must have a positive duration_minutes within range",
                service.id,
                service.name
            );
        }
    }
    let catalog: InMemoryCatalog = raw.services.into_iter().collect();

    let default_service = ServiceId(raw.default_service);
    if catalog.lookup(default_service).is_none() {
        tracing::warn!(
            service = %default_service,
            "default_service is not in the catalog; requests without a service will be rejected"
        );
    }

    Ok(Config {
        calendar: CalendarContext {
            timezone,
            default_service,
        },
        open,
        close,
        slot_step,
        catalog,
    })
}

/// A positive length of at most a year.
fn positive_minutes(minutes: i64) -> Option<Duration> {
    Duration::try_minutes(minutes)
        .filter(|d| *d > Duration::zero() && *d <= Duration::days(366))
}

fn parse_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .with_context(|| format!("expected HH:MM, got '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.calendar.timezone, Tz::UTC);
        assert_eq!(cfg.calendar.default_service, ServiceId(1));
        assert_eq!(cfg.open, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(cfg.close, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(cfg.slot_step, Duration::minutes(30));
        assert!(cfg.catalog.is_empty());
    }

    #[test]
    fn test_services_loaded() {
        let cfg = parse(
            r#"
            timezone = "Europe/Warsaw"
            [[services]]
            id = 1
            name = "Consultation"
            duration_minutes = 60
            [[services]]
            id = 2
            name = "Follow-up"
            duration_minutes = 20
            "#,
        )
        .unwrap();
        assert_eq!(cfg.catalog.len(), 2);
        assert_eq!(
            cfg.catalog.lookup(ServiceId(2)).unwrap().duration_minutes,
            20
        );
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let err = parse(r#"timezone = "Mars/Olympus""#).unwrap_err();
        assert!(format!("{err:#}").contains("Mars/Olympus"));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let err = parse(
            r#"
            [[services]]
            id = 1
            name = "Zero"
            duration_minutes = 0
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("positive duration_minutes"));
    }

    #[test]
    fn test_out_of_range_duration_rejected() {
        let err = parse(
            r#"
            [[services]]
            id = 1
            name = "Forever"
            duration_minutes = 9223372036854775807
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("within range"));
    }

    #[test]
    fn test_slot_step_bounds() {
        assert!(parse("slot_step_minutes = 0").is_err());
        let err = parse("slot_step_minutes = 1000000000000").unwrap_err();
        assert!(format!("{err:#}").contains("slot_step_minutes"));
        assert_eq!(
            parse("slot_step_minutes = 15").unwrap().slot_step,
            Duration::minutes(15)
        );
    }

    #[test]
    fn test_inverted_hours_rejected() {
        let err = parse("open = \"18:00\"\nclose = \"09:00\"").unwrap_err();
        assert!(format!("{err:#}").contains("must be after"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse("colour = \"blue\"").is_err());
    }
}
