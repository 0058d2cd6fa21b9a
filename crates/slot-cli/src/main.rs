//! `slots` CLI — resolve availability and manage bookings in a JSON calendar
//! snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # First week with a free 45-minute slot, starting from the current week
//! slots resolve --snapshot calendar.json --business salon --duration 45
//!
//! # Only one staff member, from a given week, as JSON
//! slots resolve --snapshot calendar.json --business salon --duration 45 \
//!   --staff alice --week 2026-11-02 --json
//!
//! # Book a slot (staff picked at random when --staff is omitted)
//! slots book --snapshot calendar.json --business salon --service cut \
//!   --date 2026-11-02 --time 09:30 --first-name Marie --last-name Dupont \
//!   --email marie@example.fr --phone "06 12 34 56 78"
//!
//! # Print pending confirmation messages, then record them as sent
//! slots notify --snapshot calendar.json --id <APPOINTMENT_ID> --mark-sent
//!
//! # Cancel
//! slots cancel --snapshot calendar.json --id <APPOINTMENT_ID>
//!
//! # An appointment and the client's other appointments, newest first
//! slots history --snapshot calendar.json --id <APPOINTMENT_ID>
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::booking::{select_slot, ClientDetails, NewAppointment, RandomPicker, StaffPicker};
use slot_engine::calendar::{
    parse_time, Appointment, AppointmentStatus, Service, StaffId, StaffMember,
};
use slot_engine::clock::{Clock, SystemClock};
use slot_engine::config::EngineConfig;
use slot_engine::notify::{
    cancellation_notices, french_date, pending_confirmations, BookingDetails, FrenchTemplates,
    Notification,
};
use slot_engine::resolve::{resolve_availability, AvailabilityQuery, Resolution};
use slot_engine::scan::AvailabilityNotice;
use slot_engine::source::{AppointmentStore, CalendarSource, MemoryCalendar};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Appointment availability and booking over a JSON calendar snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config file (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local wall-clock time to use as "now" (YYYY-MM-DDTHH:MM)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Log engine decisions to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first week with bookable slots
    Resolve {
        /// Calendar snapshot file
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        business: String,
        /// Service duration in minutes
        #[arg(long)]
        duration: u32,
        /// Only consider this staff member
        #[arg(long)]
        staff: Option<String>,
        /// Any date in the week to start from (defaults to today)
        #[arg(long)]
        week: Option<NaiveDate>,
        /// Override the configured scan bound
        #[arg(long)]
        max_weeks: Option<u32>,
        /// Override the configured slot step
        #[arg(long)]
        step: Option<u32>,
        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },
    /// Book a slot and write it to the snapshot
    Book {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        business: String,
        /// Service id
        #[arg(long)]
        service: String,
        #[arg(long)]
        date: NaiveDate,
        /// Start time (HH:MM)
        #[arg(long)]
        time: String,
        /// Staff member to book with; picked at random among eligible staff if omitted
        #[arg(long)]
        staff: Option<String>,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Seed for the random staff pick
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Cancel a future appointment
    Cancel {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Show an appointment and the client's other appointments
    History {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Print confirmation messages not yet sent for an appointment
    Notify {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        id: String,
        /// Link included in the client email
        #[arg(long)]
        manage_url: Option<String>,
        /// Record the printed messages as sent in the snapshot
        #[arg(long)]
        mark_sent: bool,
        /// Print messages as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let now = match cli.now.as_deref() {
        Some(raw) => parse_now(raw)?,
        None => SystemClock::from_config(&config)?.now(),
    };

    match cli.command {
        Commands::Resolve {
            snapshot,
            business,
            duration,
            staff,
            week,
            max_weeks,
            step,
            json,
        } => {
            let mut config = config;
            if let Some(max_weeks) = max_weeks {
                config.max_weeks_to_scan = max_weeks;
            }
            if let Some(step) = step {
                config.slot_step_minutes = step;
            }

            let calendar = load_snapshot(&snapshot)?;
            let start_week = week.unwrap_or(now.date());
            let mut query = AvailabilityQuery::new(&business, duration, start_week);
            query.staff_preference = staff.as_deref().map(StaffId::new);

            let resolution = resolve_availability(&calendar, &query, now, &config)
                .context("Failed to resolve availability")?;

            if json {
                let out = serde_json::to_string_pretty(&ResolutionOutput::from(&resolution))?;
                println!("{}", out);
            } else {
                print_resolution(&resolution);
            }
        }
        Commands::Book {
            snapshot,
            business,
            service,
            date,
            time,
            staff,
            first_name,
            last_name,
            email,
            phone,
            seed,
        } => {
            let calendar = load_snapshot(&snapshot)?;
            let service = calendar
                .services(&business)?
                .into_iter()
                .find(|s| s.id == service)
                .with_context(|| {
                    format!("Unknown service '{}' for business '{}'", service, business)
                })?;
            let time = parse_time(&time)?;
            let preference = staff.as_deref().map(StaffId::new);

            // The preference is applied when picking, not when resolving.
            let query = AvailabilityQuery::new(&business, service.duration.total_minutes(), date);
            let resolution = resolve_availability(&calendar, &query, now, &config)
                .context("Failed to resolve availability")?;

            let Some(slot) = resolution.slot(date, time) else {
                bail!("No availability on {} at {}", date, time.format("%H:%M"));
            };

            let mut seeded;
            let mut random;
            let picker: &mut dyn StaffPicker = match seed {
                Some(seed) => {
                    seeded = RandomPicker::seeded(seed);
                    &mut seeded
                }
                None => {
                    random = RandomPicker::new();
                    &mut random
                }
            };
            let Some(selection) = select_slot(date, slot, preference.as_ref(), picker) else {
                bail!(
                    "Requested staff is not available on {} at {}",
                    date,
                    time.format("%H:%M")
                );
            };

            let client = ClientDetails {
                first_name,
                last_name,
                email,
                phone,
            };
            let new = NewAppointment::from_selection(&business, &service, &selection, client)?;
            let appointment = calendar.create_appointment(new)?;
            calendar.save(&snapshot)?;

            info!(id = %appointment.id, staff_id = %appointment.staff_id, "booked");
            println!(
                "Booked {} with {} on {} at {}",
                appointment.id,
                appointment.staff_id,
                french_date(appointment.start.date()),
                appointment.start.format("%H:%M")
            );
        }
        Commands::Cancel { snapshot, id } => {
            let calendar = load_snapshot(&snapshot)?;
            let appointment = calendar.cancel_appointment(&id, now)?;
            calendar.save(&snapshot)?;

            println!("Cancelled {}", appointment.id);
            let context = NotificationContext::load(&calendar, &appointment)?;
            let details = context.details(&appointment, None);
            cancellation_notices(&details, &FrenchTemplates)
                .iter()
                .for_each(print_notification);
        }
        Commands::History { snapshot, id } => {
            let calendar = load_snapshot(&snapshot)?;
            let Some(appointment) = calendar.appointment(&id)? else {
                bail!("Unknown appointment '{}'", id);
            };
            let history = calendar.client_history(&id)?;

            let context = NotificationContext::load(&calendar, &appointment)?;
            println!("{}", context.summary(&appointment));
            if history.is_empty() {
                println!("No other appointments for this client");
            } else {
                println!();
                println!("Historique");
                for past in &history {
                    let context = NotificationContext::load(&calendar, past)?;
                    println!("  {}", context.summary(past));
                }
            }
        }
        Commands::Notify {
            snapshot,
            id,
            manage_url,
            mark_sent,
            json,
        } => {
            let calendar = load_snapshot(&snapshot)?;
            let Some(appointment) = calendar.appointment(&id)? else {
                bail!("Unknown appointment '{}'", id);
            };

            let context = NotificationContext::load(&calendar, &appointment)?;
            let details = context.details(&appointment, manage_url.as_deref());
            let pending = pending_confirmations(&details, &FrenchTemplates);

            if json {
                println!("{}", serde_json::to_string_pretty(&pending)?);
            } else if pending.is_empty() {
                println!("Nothing to send for {}", appointment.id);
            } else {
                pending.iter().for_each(print_notification);
            }

            if mark_sent && !pending.is_empty() {
                for notification in &pending {
                    calendar.mark_notified(&appointment.id, notification.kind)?;
                }
                calendar.save(&snapshot)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_now(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("Invalid --now '{}', expected YYYY-MM-DDTHH:MM", raw))
}

fn load_snapshot(path: &Path) -> Result<MemoryCalendar> {
    MemoryCalendar::from_path(path)
        .with_context(|| format!("Failed to load snapshot: {}", path.display()))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionOutput<'a> {
    #[serde(flatten)]
    resolution: &'a Resolution,
    notice: AvailabilityNotice,
}

impl<'a> From<&'a Resolution> for ResolutionOutput<'a> {
    fn from(resolution: &'a Resolution) -> Self {
        Self {
            resolution,
            notice: resolution.notice(),
        }
    }
}

fn print_resolution(resolution: &Resolution) {
    println!("Semaine du {}", french_date(resolution.resolved_week_start));
    if let Some(message) = resolution.notice().message() {
        println!("{}", message);
    }
    for (date, slots) in &resolution.slots_by_date {
        if slots.is_empty() {
            continue;
        }
        println!();
        println!("{}", french_date(*date));
        for slot in slots {
            let staff: Vec<String> = slot
                .available_staff
                .iter()
                .map(|s| s.display_name())
                .collect();
            println!("  {}  {}", slot.time.format("%H:%M"), staff.join(", "));
        }
    }
}

fn print_notification(notification: &Notification) {
    println!();
    println!("--- {:?} -> {}", notification.kind, notification.to);
    if let Some(subject) = &notification.subject {
        println!("Subject: {}", subject);
    }
    println!("{}", notification.body);
}

// ---------------------------------------------------------------------------
// Notification lookups
// ---------------------------------------------------------------------------

/// Records a template may mention, looked up once per command.
struct NotificationContext {
    business_name: String,
    admin_email: Option<String>,
    service: Option<Service>,
    staff: Option<StaffMember>,
}

impl NotificationContext {
    fn load(calendar: &MemoryCalendar, appointment: &Appointment) -> Result<Self> {
        let business = calendar.business(&appointment.business_id)?.unwrap_or_default();
        let service = calendar
            .services(&appointment.business_id)?
            .into_iter()
            .find(|s| s.id == appointment.service_id);
        let staff = calendar
            .staff_roster(&appointment.business_id)?
            .into_iter()
            .find(|s| s.id == appointment.staff_id);
        Ok(Self {
            business_name: business.name,
            admin_email: business.admin_email,
            service,
            staff,
        })
    }

    /// One line: id, date and time, service, staff and status.
    fn summary(&self, appointment: &Appointment) -> String {
        let status = match appointment.status {
            AppointmentStatus::Confirmed => "confirmé",
            AppointmentStatus::Cancelled => "annulé",
        };
        format!(
            "{}  {} à {}  {}  {}  {}",
            appointment.id,
            french_date(appointment.start.date()),
            appointment.start.format("%H:%M"),
            self.service.as_ref().map_or("Service inconnu", |s| s.title.as_str()),
            self.staff.as_ref().map(StaffMember::display_name).unwrap_or_default(),
            status
        )
    }

    fn details<'a>(
        &'a self,
        appointment: &'a Appointment,
        manage_url: Option<&'a str>,
    ) -> BookingDetails<'a> {
        BookingDetails {
            appointment,
            business_name: &self.business_name,
            admin_email: self.admin_email.as_deref(),
            service: self.service.as_ref(),
            staff: self.staff.as_ref(),
            manage_url,
        }
    }
}
