//! Turning a chosen slot into an appointment, and cancelling one.
//!
//! The engine only answers "eligible as of the moment of reading". The
//! no-double-booking guarantee lives in the appointment store, which calls
//! [`ensure_slot_free`] again under its own lock before writing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{
    hhmm, Appointment, AppointmentStatus, Service, StaffId, StaffMember, TimeSlot,
};
use crate::interval::TimeRange;
use crate::notify::NotificationLog;
use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Slot no longer available for staff {staff_id} at {start}")]
    SlotUnavailable {
        staff_id: StaffId,
        start: NaiveDateTime,
    },

    #[error("Appointment cannot be cancelled: {0}")]
    NotCancellable(String),

    #[error("Invalid client details: {0}")]
    InvalidClient(String),

    #[error("Unknown appointment: {0}")]
    UnknownAppointment(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// The slot the end client picked, with the staff member who will serve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSelection {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub staff_id: StaffId,
}

impl SlotSelection {
    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Chooses one staff member among those eligible for a slot when the client
/// expressed no preference.
pub trait StaffPicker {
    fn pick<'a>(&mut self, candidates: &'a [StaffMember]) -> Option<&'a StaffMember>;
}

/// Always the first eligible staff member. Deterministic, for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstEligible;

impl StaffPicker for FirstEligible {
    fn pick<'a>(&mut self, candidates: &'a [StaffMember]) -> Option<&'a StaffMember> {
        candidates.first()
    }
}

/// Uniformly random choice.
#[derive(Debug, Clone)]
pub struct RandomPicker<R = ThreadRng> {
    rng: R,
}

impl RandomPicker<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomPicker<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPicker<StdRng> {
    /// Reproducible sequence of picks.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> StaffPicker for RandomPicker<R> {
    fn pick<'a>(&mut self, candidates: &'a [StaffMember]) -> Option<&'a StaffMember> {
        candidates.choose(&mut self.rng)
    }
}

/// Resolve who serves `slot`.
///
/// With a preference, returns it only if that staff member is eligible for the
/// slot. Without one, delegates to `picker`. Returns `None` for a slot nobody
/// can serve.
pub fn select_slot(
    date: NaiveDate,
    slot: &TimeSlot,
    preference: Option<&StaffId>,
    picker: &mut dyn StaffPicker,
) -> Option<SlotSelection> {
    let staff = match preference {
        Some(id) => slot.available_staff.iter().find(|s| &s.id == id)?,
        None => picker.pick(&slot.available_staff)?,
    };
    Some(SlotSelection {
        date,
        time: slot.time,
        staff_id: staff.id.clone(),
    })
}

/// Contact details typed into the booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl ClientDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        let fields = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(BookingError::InvalidClient(format!("{} is required", name)));
        }
        if !self.email.contains('@') {
            return Err(BookingError::InvalidClient(format!(
                "'{}' is not an email address",
                self.email
            )));
        }
        Ok(())
    }
}

/// An appointment about to be written by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub business_id: String,
    pub service_id: String,
    pub staff_id: StaffId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub client: ClientDetails,
}

impl NewAppointment {
    /// Build a confirmed booking from a selection; `end = start + duration`.
    pub fn from_selection(
        business_id: &str,
        service: &Service,
        selection: &SlotSelection,
        client: ClientDetails,
    ) -> Result<Self, BookingError> {
        client.validate()?;
        let start = selection.start();
        Ok(Self {
            business_id: business_id.to_string(),
            service_id: service.id.clone(),
            staff_id: selection.staff_id.clone(),
            start,
            end: start + service.duration.as_duration(),
            client,
        })
    }

    pub fn range(&self) -> TimeRange<NaiveDateTime> {
        TimeRange::new(self.start, self.end)
    }

    pub fn into_appointment(self, id: String) -> Appointment {
        Appointment {
            id,
            business_id: self.business_id,
            staff_id: self.staff_id,
            service_id: self.service_id,
            start: self.start,
            end: self.end,
            status: AppointmentStatus::Confirmed,
            client: Some(self.client),
            notifications: NotificationLog::default(),
        }
    }
}

/// Fail if `staff_id` already has a confirmed appointment overlapping `range`.
pub fn ensure_slot_free(
    appointments: &[Appointment],
    staff_id: &StaffId,
    range: &TimeRange<NaiveDateTime>,
) -> Result<(), BookingError> {
    if appointments.iter().any(|a| a.blocks(staff_id, range)) {
        return Err(BookingError::SlotUnavailable {
            staff_id: staff_id.clone(),
            start: range.start,
        });
    }
    Ok(())
}

impl Appointment {
    /// Confirmed and not yet started.
    pub fn is_cancellable(&self, now: NaiveDateTime) -> bool {
        self.is_confirmed() && self.start > now
    }

    pub fn cancel(&mut self, now: NaiveDateTime) -> Result<(), BookingError> {
        if !self.is_confirmed() {
            return Err(BookingError::NotCancellable("already cancelled".to_string()));
        }
        if self.start <= now {
            return Err(BookingError::NotCancellable(
                "appointment has already started".to_string(),
            ));
        }
        self.status = AppointmentStatus::Cancelled;
        Ok(())
    }
}
