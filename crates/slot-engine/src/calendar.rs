//! Calendar value objects: operating hours, breaks, vacations, staff and
//! appointments.
//!
//! All times are wall-clock times in the business's single local zone, so the
//! engine works on `chrono::Naive*` values throughout. Hours tables keep their
//! `"HH:mm"` strings as stored; they are parsed per day by
//! [`DayHours::schedule_on`] so that one malformed entry only affects its own
//! weekday. A closing time of `"24:00"` means midnight at the end of the day.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::booking::ClientDetails;
use crate::error::{EngineError, Result};
use crate::interval::TimeRange;
use crate::notify::NotificationLog;

/// Parse an `"HH:mm"` time-of-day string.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| EngineError::InvalidTime(format!("'{}': {}", value, e)))
}

/// Anchor an `"HH:mm"` string on `date`. `"24:00"` is midnight at the end of
/// that day, so a business can close at midnight.
pub fn time_on(date: NaiveDate, value: &str) -> Result<NaiveDateTime> {
    if value.trim() == "24:00" {
        return Ok((date + Duration::days(1)).and_time(NaiveTime::MIN));
    }
    Ok(date.and_time(parse_time(value)?))
}

/// Lower-case English weekday name used as the key of an hours table.
pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Serde adapter writing a `NaiveTime` as `"HH:mm"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// Opaque staff identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StaffId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: StaffId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl StaffMember {
    pub fn new(id: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: StaffId::new(id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

// ---------------------------------------------------------------------------
// Hours
// ---------------------------------------------------------------------------

/// A recurring break inside one weekday, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BreakPeriod {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            label: None,
        }
    }
}

/// One weekday entry of an hours table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    pub is_open: bool,
    #[serde(default)]
    pub open_time: String,
    #[serde(default)]
    pub close_time: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub break_periods: Vec<BreakPeriod>,
}

impl DayHours {
    pub fn open(open_time: &str, close_time: &str) -> Self {
        Self {
            is_open: true,
            open_time: open_time.to_string(),
            close_time: close_time.to_string(),
            break_periods: Vec::new(),
        }
    }

    pub fn closed() -> Self {
        Self {
            is_open: false,
            open_time: String::new(),
            close_time: String::new(),
            break_periods: Vec::new(),
        }
    }

    pub fn with_break(mut self, start: &str, end: &str) -> Self {
        self.break_periods.push(BreakPeriod::new(start, end));
        self
    }

    /// Anchor this entry on a concrete date.
    ///
    /// Returns `Ok(None)` when the day is closed. A malformed time string fails
    /// the whole day. Inverted breaks (`end <= start`) are skipped with a warning.
    pub fn schedule_on(&self, date: NaiveDate) -> Result<Option<DaySchedule>> {
        if !self.is_open {
            return Ok(None);
        }

        let open = time_on(date, &self.open_time)?;
        let close = time_on(date, &self.close_time)?;

        let mut breaks = Vec::with_capacity(self.break_periods.len());
        for period in &self.break_periods {
            let range = TimeRange::new(
                time_on(date, &period.start)?,
                time_on(date, &period.end)?,
            );
            if range.is_empty() {
                warn!(
                    %date,
                    start = %period.start,
                    end = %period.end,
                    "ignoring break period that ends before it starts"
                );
                continue;
            }
            breaks.push(range);
        }

        Ok(Some(DaySchedule {
            date,
            open,
            close,
            breaks,
        }))
    }
}

/// A weekday → hours table, one per business and one per staff member.
///
/// Serialized as `{"hours": {"monday": {...}, ...}}`. A weekday with no entry
/// is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    #[serde(default)]
    pub hours: BTreeMap<String, DayHours>,
}

impl OperatingHours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, weekday: Weekday, day: DayHours) -> Self {
        self.hours.insert(weekday_key(weekday).to_string(), day);
        self
    }

    /// Same hours Monday through Friday, weekend closed.
    pub fn weekdays(day: DayHours) -> Self {
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .into_iter()
            .fold(Self::new(), |hours, weekday| hours.with_day(weekday, day.clone()))
    }

    /// Same hours every day of the week.
    pub fn every_day(day: DayHours) -> Self {
        let mut weekday = Weekday::Mon;
        let mut hours = Self::new();
        for _ in 0..7 {
            hours = hours.with_day(weekday, day.clone());
            weekday = weekday.succ();
        }
        hours
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DayHours> {
        let key = weekday_key(weekday);
        self.hours.get(key).or_else(|| {
            self.hours
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Resolve the entry for `date`'s weekday. See [`DayHours::schedule_on`].
    pub fn schedule_on(&self, date: NaiveDate) -> Result<Option<DaySchedule>> {
        match self.day(date.weekday()) {
            Some(day) => day.schedule_on(date),
            None => Ok(None),
        }
    }
}

/// Parsed hours for one entity on one concrete date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub open: NaiveDateTime,
    pub close: NaiveDateTime,
    pub breaks: Vec<TimeRange<NaiveDateTime>>,
}

impl DaySchedule {
    pub fn hours(&self) -> TimeRange<NaiveDateTime> {
        TimeRange::new(self.open, self.close)
    }

    pub fn on_break(&self, slot: &TimeRange<NaiveDateTime>) -> bool {
        self.breaks.iter().any(|b| b.overlaps(slot))
    }

    /// The slot lies within opening hours and touches no break.
    ///
    /// This is the one predicate behind both the business-level and the
    /// staff-level checks.
    pub fn admits(&self, slot: &TimeRange<NaiveDateTime>) -> bool {
        self.hours().contains(slot) && !self.on_break(slot)
    }
}

// ---------------------------------------------------------------------------
// Vacations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VacationKind {
    Business,
    Staff,
}

/// Whole-day unavailability, inclusive of both `start_date` and `end_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationPeriod {
    #[serde(default)]
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: VacationKind,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl VacationPeriod {
    pub fn business(business_id: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            start_date,
            end_date,
            kind: VacationKind::Business,
            entity_id: business_id.to_string(),
            title: None,
        }
    }

    pub fn staff(staff_id: &StaffId, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            start_date,
            end_date,
            kind: VacationKind::Staff,
            entity_id: staff_id.as_str().to_string(),
            title: None,
        }
    }

    /// `date` lies in `[start_of_day(start_date), end_of_day(end_date)]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Business vacations apply to every staff member; staff vacations only to
    /// the staff member they name.
    pub fn applies_to(&self, staff_id: &StaffId) -> bool {
        match self.kind {
            VacationKind::Business => true,
            VacationKind::Staff => self.entity_id == staff_id.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// Services and appointments
// ---------------------------------------------------------------------------

/// Length of a bookable service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDuration {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
}

impl ServiceDuration {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    pub fn from_minutes(total: u32) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.total_minutes()))
    }
}

/// `"1h 30min"`, `"45min"`, `"2h"`.
impl fmt::Display for ServiceDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = Self::from_minutes(self.total_minutes());
        match (normalized.hours, normalized.minutes) {
            (0, m) => write!(f, "{}min", m),
            (h, 0) => write!(f, "{}h", h),
            (h, m) => write!(f, "{}h {}min", h, m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    pub duration: ServiceDuration,
    #[serde(default)]
    pub business_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

/// A booked appointment. Only confirmed appointments constrain availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub business_id: String,
    pub staff_id: StaffId,
    #[serde(default)]
    pub service_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientDetails>,
    #[serde(default)]
    pub notifications: NotificationLog,
}

impl Appointment {
    /// A bare confirmed booking, enough for availability computations.
    pub fn confirmed(staff_id: &StaffId, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: String::new(),
            business_id: String::new(),
            staff_id: staff_id.clone(),
            service_id: String::new(),
            start,
            end,
            status: AppointmentStatus::Confirmed,
            client: None,
            notifications: NotificationLog::default(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }

    pub fn range(&self) -> TimeRange<NaiveDateTime> {
        TimeRange::new(self.start, self.end)
    }

    /// A confirmed appointment for `staff_id` overlapping `slot`.
    pub fn blocks(&self, staff_id: &StaffId, slot: &TimeRange<NaiveDateTime>) -> bool {
        self.is_confirmed() && &self.staff_id == staff_id && self.range().overlaps(slot)
    }
}

/// One bookable start time and the staff who can serve it.
///
/// Never surfaced with an empty `available_staff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub available_staff: Vec<StaffMember>,
}

impl TimeSlot {
    pub fn offers(&self, staff_id: &StaffId) -> bool {
        self.available_staff.iter().any(|s| &s.id == staff_id)
    }
}
