mod config;
mod logging;
mod output;
mod snapshot;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use booking_engine::{
    bookable_slots, business_day_window, find_free_slots, parse_instant, resolve_duration,
    resolve_slot, validate_request, Amendment, Booking, BookingId, BookingLedger, BookingRequest,
    ConflictSet, Contact, FreeSlot, InMemoryLedger, LedgerError, ServiceId, TimeInterval, UserId,
    Viewer,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use config::Config;
use output::{print_json, Accepted, Rejected};

/// Exit code for a rejected proposal or unknown booking.
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "booking")]
#[command(about = "Check, book and reschedule appointments on a single calendar")]
struct Cli {
    /// Calendar configuration (timezone, opening hours, services)
    #[arg(long, global = true, default_value = "booking.toml")]
    config: PathBuf,

    /// Bookings file (JSON array); created on first booking
    #[arg(long, global = true, default_value = "bookings.json")]
    bookings: PathBuf,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured services
    Services,
    /// Check whether a slot can be booked, without booking it
    Check {
        /// Start (RFC 3339, or "YYYY-MM-DDTHH:MM" in the calendar timezone)
        #[arg(short, long)]
        start: String,

        /// End; derived from the service duration when omitted
        #[arg(short, long)]
        end: Option<String>,

        /// Service id (defaults to the configured default service)
        #[arg(long)]
        service: Option<u32>,
    },
    /// Book a slot
    Book {
        #[arg(long)]
        name: String,

        #[arg(long)]
        surname: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        /// Registered user who owns the booking
        #[arg(long)]
        owner: Option<u64>,

        #[arg(short, long)]
        start: String,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(long)]
        service: Option<u32>,
    },
    /// Move an existing booking, optionally changing its service or contact
    Reschedule(RescheduleArgs),
    /// Cancel a booking
    Cancel {
        #[arg(long)]
        id: u64,
    },
    /// Show free time on a day
    Free {
        /// Calendar date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Only show gaps long enough for this service
        #[arg(long)]
        service: Option<u32>,
    },
    /// List bookings as a given viewer sees them
    List {
        /// guest, admin, or member:<user id>
        #[arg(long = "as", default_value = "guest", value_parser = parse_viewer)]
        viewer: Viewer,
    },
}

#[derive(Args)]
struct RescheduleArgs {
    #[arg(long)]
    id: u64,

    #[arg(short, long)]
    start: String,

    /// New end; derived from the service, or keeps the current length
    #[arg(short, long)]
    end: Option<String>,

    /// New service; the end is re-derived from its duration
    #[arg(long)]
    service: Option<u32>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    surname: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,
}

impl RescheduleArgs {
    /// `current` with any contact fields given on the command line replaced.
    fn contact(&self, current: &Contact) -> Option<Contact> {
        if self.name.is_none()
            && self.surname.is_none()
            && self.email.is_none()
            && self.phone.is_none()
        {
            return None;
        }
        Some(Contact {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            surname: self.surname.clone().unwrap_or_else(|| current.surname.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            phone: self.phone.clone().or_else(|| current.phone.clone()),
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = config::load(&cli.config)?;
    tracing::debug!(config = %cli.config.display(), services = cfg.catalog.len(), "config loaded");

    match cli.command {
        Commands::Services => cmd_services(&cfg),
        Commands::Check {
            start,
            end,
            service,
        } => cmd_check(&cfg, &cli.bookings, &start, end.as_deref(), service),
        Commands::Book {
            name,
            surname,
            email,
            phone,
            owner,
            start,
            end,
            service,
        } => {
            let request = BookingRequest {
                owner: owner.map(UserId),
                contact: Contact {
                    name,
                    surname,
                    email,
                    phone,
                },
                service: service.map(ServiceId),
                start,
                end,
            };
            cmd_book(&cfg, &cli.bookings, &request)
        }
        Commands::Reschedule(args) => cmd_reschedule(&cfg, &cli.bookings, &args),
        Commands::Cancel { id } => cmd_cancel(&cli.bookings, BookingId(id)),
        Commands::Free { date, service } => cmd_free(&cfg, &cli.bookings, date, service),
        Commands::List { viewer } => cmd_list(&cli.bookings, &viewer),
    }
}

fn cmd_services(cfg: &Config) -> Result<ExitCode> {
    let services: Vec<_> = cfg.catalog.iter().collect();
    print_json(&services)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(
    cfg: &Config,
    bookings_path: &Path,
    start: &str,
    end: Option<&str>,
    service: Option<u32>,
) -> Result<ExitCode> {
    let bookings = snapshot::load(bookings_path)?;
    let conflicts = ConflictSet::from_bookings(&bookings);
    let service = service
        .map(ServiceId)
        .unwrap_or(ServiceId::UNSPECIFIED)
        .or_default_to(cfg.calendar.default_service);

    let result = resolve_slot(start, end, service, &cfg.catalog, &cfg.calendar.timezone)
        .and_then(|slot| conflicts.check(&slot));

    match result {
        Ok(slot) => {
            print_json(&Accepted::slot(slot))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => reject(Rejected::from(&e)),
    }
}

fn cmd_book(cfg: &Config, bookings_path: &Path, request: &BookingRequest) -> Result<ExitCode> {
    let ledger = InMemoryLedger::from_bookings(snapshot::load(bookings_path)?);

    let conflicts = ConflictSet::from_bookings(&ledger.snapshot());
    let draft = match validate_request(request, &cfg.catalog, &conflicts, &cfg.calendar) {
        Ok(draft) => draft,
        Err(e) => return reject(Rejected::from(&e)),
    };

    let booking = match ledger.create(draft) {
        Ok(booking) => booking,
        Err(e) => return reject(Rejected::from(&e)),
    };
    tracing::info!(id = booking.id.0, slot = %booking.slot, "booked");

    snapshot::save(bookings_path, &ledger.into_bookings())?;
    print_json(&Accepted::booking(&booking))?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_reschedule(cfg: &Config, bookings_path: &Path, args: &RescheduleArgs) -> Result<ExitCode> {
    let id = BookingId(args.id);
    let ledger = InMemoryLedger::from_bookings(snapshot::load(bookings_path)?);
    let Some(current) = ledger.snapshot().into_iter().find(|b| b.id == id) else {
        return reject(Rejected::from(&LedgerError::NotFound(id)));
    };

    let tz = &cfg.calendar.timezone;
    let service = args
        .service
        .map(|s| ServiceId(s).or_default_to(cfg.calendar.default_service));
    let proposed = match (service, args.end.as_deref()) {
        (Some(service), end) => resolve_slot(&args.start, end, service, &cfg.catalog, tz),
        (None, Some(end)) => TimeInterval::parse(&args.start, end, tz),
        (None, None) => parse_instant(&args.start, tz)
            .and_then(|s| TimeInterval::starting_at(s, current.slot.duration())),
    };
    let slot = match proposed {
        Ok(slot) => slot,
        Err(e) => return reject(Rejected::from(&e)),
    };

    let change = Amendment {
        slot,
        service,
        contact: args.contact(&current.contact),
    };
    let booking = match ledger.amend(id, change) {
        Ok(booking) => booking,
        Err(e) => return reject(Rejected::from(&e)),
    };
    tracing::info!(id = id.0, from = %current.slot, to = %booking.slot, "rescheduled");

    snapshot::save(bookings_path, &ledger.into_bookings())?;
    print_json(&Accepted::booking(&booking))?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_cancel(bookings_path: &Path, id: BookingId) -> Result<ExitCode> {
    let ledger = InMemoryLedger::from_bookings(snapshot::load(bookings_path)?);
    let removed = match ledger.cancel(id) {
        Ok(removed) => removed,
        Err(e) => return reject(Rejected::from(&e)),
    };
    tracing::info!(id = id.0, slot = %removed.slot, "cancelled");

    snapshot::save(bookings_path, &ledger.into_bookings())?;
    print_json(&CancelOutput {
        status: "cancelled",
        booking: &removed,
    })?;
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct CancelOutput<'a> {
    status: &'static str,
    booking: &'a Booking,
}

#[derive(Serialize)]
struct FreeOutput {
    window: TimeInterval,
    free: Vec<FreeSlot>,
    bookable: Vec<TimeInterval>,
}

fn cmd_free(
    cfg: &Config,
    bookings_path: &Path,
    date: NaiveDate,
    service: Option<u32>,
) -> Result<ExitCode> {
    let tz = &cfg.calendar.timezone;
    let window = business_day_window(date, cfg.open, cfg.close, tz)
        .with_context(|| format!("Cannot build opening hours for {date}"))?;

    let service = service
        .map(ServiceId)
        .unwrap_or(ServiceId::UNSPECIFIED)
        .or_default_to(cfg.calendar.default_service);
    let duration = match resolve_duration(&cfg.catalog, service) {
        Ok(d) => d,
        Err(e) => return reject(Rejected::from(&e)),
    };

    let busy: Vec<TimeInterval> = snapshot::load(bookings_path)?
        .iter()
        .map(|b| b.slot)
        .collect();

    print_json(&FreeOutput {
        window,
        free: find_free_slots(&window, &busy, duration),
        bookable: bookable_slots(&window, &busy, duration, cfg.slot_step),
    })?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(bookings_path: &Path, viewer: &Viewer) -> Result<ExitCode> {
    let ledger = InMemoryLedger::from_bookings(snapshot::load(bookings_path)?);
    let visible: Vec<_> = ledger
        .snapshot()
        .iter()
        .map(|b| b.redacted_for(viewer))
        .collect();
    print_json(&visible)?;
    Ok(ExitCode::SUCCESS)
}

fn reject(rejected: Rejected) -> Result<ExitCode> {
    print_json(&rejected)?;
    Ok(ExitCode::from(EXIT_REJECTED))
}

fn parse_viewer(s: &str) -> std::result::Result<Viewer, String> {
    match s {
        "guest" => Ok(Viewer::Guest),
        "admin" => Ok(Viewer::Admin),
        _ => s
            .strip_prefix("member:")
            .and_then(|id| id.parse().ok())
            .map(|id| Viewer::Member(UserId(id)))
            .ok_or_else(|| format!("expected guest, admin or member:<id>, got '{s}'")),
    }
}
