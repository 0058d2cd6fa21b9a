//! # slot-engine
//!
//! Availability resolution for appointment booking.
//!
//! Given a service duration and a starting week, the engine reconciles four
//! independent calendars (business hours, per-staff hours, break periods and
//! vacation periods) against already-booked appointments and the current time,
//! and returns the bookable start times of the first week that has any, along
//! with the staff able to serve each one.
//!
//! All times are wall-clock times in the business's local zone; the engine is
//! pure and takes "now" as an explicit input.
//!
//! ## Modules
//!
//! - [`interval`] — Half-open ranges and the shared overlap test
//! - [`calendar`] — Hours tables, breaks, vacations, staff, services, appointments
//! - [`slots`] — Candidate start times on a fixed grid for one date
//! - [`eligibility`] — Which staff can serve a candidate slot
//! - [`week`] — Per-date slot lists across a 7-day window
//! - [`scan`] — Forward week scan, notices and week navigation
//! - [`resolve`] — Entry point over a [`source::CalendarSource`]
//! - [`source`] — Data collaborator traits and an in-memory implementation
//! - [`booking`] — Staff selection, new appointments, cancellation
//! - [`notify`] — Confirmation and cancellation message rendering
//! - [`config`] / [`clock`] — Engine settings and the source of "now"
//! - [`error`] — Error types

pub mod booking;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod interval;
pub mod notify;
pub mod resolve;
pub mod scan;
pub mod slots;
pub mod source;
pub mod week;

pub use booking::{select_slot, BookingError, ClientDetails, NewAppointment, SlotSelection};
pub use calendar::{
    Appointment, AppointmentStatus, DayHours, OperatingHours, Service, StaffId, StaffMember,
    TimeSlot, VacationPeriod,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::EngineError;
pub use interval::{overlaps, TimeRange};
pub use resolve::{resolve_availability, AvailabilityQuery, Resolution};
pub use scan::{find_availability, AvailabilityNotice, WeekCursor};
pub use source::{AppointmentStore, CalendarSnapshot, CalendarSource, MemoryCalendar, SourceError};
pub use week::{compute_week, WeekAvailability};
