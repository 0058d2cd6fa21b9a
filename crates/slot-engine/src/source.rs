//! The data-store seam: reads the engine needs, writes the booking flow needs,
//! and an in-memory implementation backed by a JSON snapshot.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::booking::{ensure_slot_free, BookingError, NewAppointment};
use crate::calendar::{
    Appointment, OperatingHours, Service, StaffId, StaffMember, VacationKind, VacationPeriod,
};
use crate::notify::NotificationKind;

/// Failure reported by a data collaborator. Passed through unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Calendar source unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Read access to raw calendar records.
///
/// Implementations may fetch from anywhere; the engine does not retry.
pub trait CalendarSource {
    fn business_hours(&self, business_id: &str) -> Result<Option<OperatingHours>, SourceError>;

    fn staff_roster(&self, business_id: &str) -> Result<Vec<StaffMember>, SourceError>;

    fn staff_hours(&self, staff_id: &StaffId) -> Result<Option<OperatingHours>, SourceError>;

    /// Business-wide vacations for `business_id` plus staff vacations for
    /// `staff_ids`.
    fn vacation_periods(
        &self,
        business_id: &str,
        staff_ids: &[StaffId],
    ) -> Result<Vec<VacationPeriod>, SourceError>;

    /// Appointments of any status. Narrowing to a date range is optional.
    fn appointments(&self, business_id: &str) -> Result<Vec<Appointment>, SourceError>;

    fn services(&self, business_id: &str) -> Result<Vec<Service>, SourceError>;
}

/// Write access used by the booking flow.
pub trait AppointmentStore {
    /// Persist a new confirmed appointment.
    ///
    /// Must re-check, atomically with the write, that the staff member has no
    /// overlapping confirmed appointment.
    fn create_appointment(&self, new: NewAppointment) -> Result<Appointment, BookingError>;

    fn cancel_appointment(
        &self,
        id: &str,
        now: NaiveDateTime,
    ) -> Result<Appointment, BookingError>;

    fn appointment(&self, id: &str) -> Result<Option<Appointment>, SourceError>;

    fn mark_notified(&self, id: &str, kind: NotificationKind) -> Result<(), BookingError>;

    /// The client's other appointments at the same business, newest first.
    ///
    /// Clients are matched by email. Both confirmed and cancelled appointments
    /// are listed; an appointment without client details has no history.
    fn client_history(&self, id: &str) -> Result<Vec<Appointment>, BookingError>;
}

// ---------------------------------------------------------------------------
// Snapshot format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<OperatingHours>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub business_id: String,
    #[serde(flatten)]
    pub member: StaffMember,
}

/// Every record of one or more businesses, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarSnapshot {
    pub businesses: BTreeMap<String, BusinessRecord>,
    pub staff: Vec<RosterEntry>,
    pub staff_hours: BTreeMap<StaffId, OperatingHours>,
    pub vacations: Vec<VacationPeriod>,
    pub services: Vec<Service>,
    pub appointments: Vec<Appointment>,
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// A [`CalendarSource`] and [`AppointmentStore`] over a snapshot held in memory.
///
/// Writes take the lock for the whole check-then-insert, so two concurrent
/// bookings of the same staff and time cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    snapshot: Mutex<CalendarSnapshot>,
}

impl MemoryCalendar {
    pub fn new(snapshot: CalendarSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let snapshot: CalendarSnapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::Unavailable(format!("Invalid snapshot JSON: {}", e)))?;
        Ok(Self::new(snapshot))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SourceError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn snapshot(&self) -> Result<CalendarSnapshot, SourceError> {
        Ok(self.lock()?.clone())
    }

    pub fn to_json(&self) -> Result<String, SourceError> {
        serde_json::to_string_pretty(&*self.lock()?)
            .map_err(|e| SourceError::Unavailable(format!("Serialization error: {}", e)))
    }

    /// Write the snapshot atomically (temp file in the same directory, then rename).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SourceError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let io_err = |e: std::io::Error| {
            SourceError::Unavailable(format!("Failed to write {}: {}", path.display(), e))
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn business(&self, business_id: &str) -> Result<Option<BusinessRecord>, SourceError> {
        Ok(self.lock()?.businesses.get(business_id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, CalendarSnapshot>, SourceError> {
        self.snapshot
            .lock()
            .map_err(|_| SourceError::Unavailable("calendar lock poisoned".to_string()))
    }
}

impl CalendarSource for MemoryCalendar {
    fn business_hours(&self, business_id: &str) -> Result<Option<OperatingHours>, SourceError> {
        Ok(self
            .lock()?
            .businesses
            .get(business_id)
            .and_then(|b| b.business_hours.clone()))
    }

    fn staff_roster(&self, business_id: &str) -> Result<Vec<StaffMember>, SourceError> {
        Ok(self
            .lock()?
            .staff
            .iter()
            .filter(|entry| entry.business_id == business_id)
            .map(|entry| entry.member.clone())
            .collect())
    }

    fn staff_hours(&self, staff_id: &StaffId) -> Result<Option<OperatingHours>, SourceError> {
        Ok(self.lock()?.staff_hours.get(staff_id).cloned())
    }

    fn vacation_periods(
        &self,
        business_id: &str,
        staff_ids: &[StaffId],
    ) -> Result<Vec<VacationPeriod>, SourceError> {
        Ok(self
            .lock()?
            .vacations
            .iter()
            .filter(|v| match v.kind {
                VacationKind::Business => v.entity_id == business_id,
                VacationKind::Staff => staff_ids.iter().any(|id| id.as_str() == v.entity_id),
            })
            .cloned()
            .collect())
    }

    fn appointments(&self, business_id: &str) -> Result<Vec<Appointment>, SourceError> {
        Ok(self
            .lock()?
            .appointments
            .iter()
            .filter(|a| a.business_id == business_id)
            .cloned()
            .collect())
    }

    fn services(&self, business_id: &str) -> Result<Vec<Service>, SourceError> {
        Ok(self
            .lock()?
            .services
            .iter()
            .filter(|s| s.business_id == business_id)
            .cloned()
            .collect())
    }
}

impl AppointmentStore for MemoryCalendar {
    fn create_appointment(&self, new: NewAppointment) -> Result<Appointment, BookingError> {
        let mut snapshot = self.lock()?;
        ensure_slot_free(&snapshot.appointments, &new.staff_id, &new.range())?;

        let appointment = new.into_appointment(Uuid::new_v4().to_string());
        debug!(
            id = %appointment.id,
            staff_id = %appointment.staff_id,
            start = %appointment.start,
            "appointment created"
        );
        snapshot.appointments.push(appointment.clone());
        Ok(appointment)
    }

    fn cancel_appointment(
        &self,
        id: &str,
        now: NaiveDateTime,
    ) -> Result<Appointment, BookingError> {
        let mut snapshot = self.lock()?;
        let appointment = snapshot
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| BookingError::UnknownAppointment(id.to_string()))?;
        appointment.cancel(now)?;
        debug!(id, "appointment cancelled");
        Ok(appointment.clone())
    }

    fn appointment(&self, id: &str) -> Result<Option<Appointment>, SourceError> {
        Ok(self.lock()?.appointments.iter().find(|a| a.id == id).cloned())
    }

    fn mark_notified(&self, id: &str, kind: NotificationKind) -> Result<(), BookingError> {
        let mut snapshot = self.lock()?;
        let appointment = snapshot
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| BookingError::UnknownAppointment(id.to_string()))?;
        appointment.notifications.mark_sent(kind);
        Ok(())
    }

    fn client_history(&self, id: &str) -> Result<Vec<Appointment>, BookingError> {
        let snapshot = self.lock()?;
        let current = snapshot
            .appointments
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| BookingError::UnknownAppointment(id.to_string()))?;
        let Some(email) = current.client.as_ref().map(|c| c.email.as_str()) else {
            return Ok(Vec::new());
        };

        let mut history: Vec<Appointment> = snapshot
            .appointments
            .iter()
            .filter(|a| a.id != current.id && a.business_id == current.business_id)
            .filter(|a| a.client.as_ref().is_some_and(|c| c.email == email))
            .cloned()
            .collect();
        history.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(history)
    }
}
