//! The single entry point: fetch one business's calendars and scan for the
//! first week with bookable slots.
//!
//! Every input is explicit. Callers that recompute on user interaction (new
//! staff preference, next week) issue a fresh [`AvailabilityQuery`] and use
//! [`Resolution::is_for`] to drop results of superseded queries.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{StaffId, TimeSlot};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::scan::{find_availability, AvailabilityNotice, WeekScan};
use crate::source::CalendarSource;
use crate::week::{CalendarData, SlotRules, WeekAvailability};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub business_id: String,
    pub service_duration_minutes: u32,
    /// Any date inside the week to start from.
    pub week_start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_preference: Option<StaffId>,
}

impl AvailabilityQuery {
    pub fn new(business_id: &str, service_duration_minutes: u32, week_start: NaiveDate) -> Self {
        Self {
            business_id: business_id.to_string(),
            service_duration_minutes,
            week_start,
            staff_preference: None,
        }
    }

    pub fn with_staff(mut self, staff_id: &StaffId) -> Self {
        self.staff_preference = Some(staff_id.clone());
        self
    }
}

/// Result of one resolution pass, tagged with the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub query: AvailabilityQuery,
    pub resolved_week_start: NaiveDate,
    pub slots_by_date: WeekAvailability,
    pub exhausted: bool,
    pub empty_week_count: u32,
}

impl Resolution {
    fn from_scan(query: AvailabilityQuery, scan: WeekScan) -> Self {
        Self {
            query,
            resolved_week_start: scan.resolved_week_start,
            slots_by_date: scan.slots_by_date,
            exhausted: scan.exhausted,
            empty_week_count: scan.empty_week_count,
        }
    }

    pub fn notice(&self) -> AvailabilityNotice {
        AvailabilityNotice::from_scan_counts(self.exhausted, self.empty_week_count)
    }

    /// Whether this result answers `query` (and not an older one).
    pub fn is_for(&self, query: &AvailabilityQuery) -> bool {
        &self.query == query
    }

    pub fn slot(&self, date: NaiveDate, time: NaiveTime) -> Option<&TimeSlot> {
        self.slots_by_date
            .get(&date)
            .and_then(|slots| slots.iter().find(|s| s.time == time))
    }

    pub fn slot_count(&self) -> usize {
        self.slots_by_date.values().map(Vec::len).sum()
    }
}

/// Fetch everything a pass needs for `business_id`.
///
/// # Errors
/// - `EngineError::UnconfiguredCalendar` if the roster is empty or the business
///   has no hours table.
/// - `EngineError::Source` for any collaborator failure.
pub fn load_calendar<S: CalendarSource + ?Sized>(
    source: &S,
    business_id: &str,
) -> Result<CalendarData> {
    let roster = source.staff_roster(business_id)?;
    if roster.is_empty() {
        return Err(EngineError::UnconfiguredCalendar(format!(
            "business '{}' has no staff",
            business_id
        )));
    }

    let business_hours = source.business_hours(business_id)?.ok_or_else(|| {
        EngineError::UnconfiguredCalendar(format!(
            "business '{}' has no opening hours",
            business_id
        ))
    })?;

    let mut staff_hours = HashMap::with_capacity(roster.len());
    for member in &roster {
        if let Some(hours) = source.staff_hours(&member.id)? {
            staff_hours.insert(member.id.clone(), hours);
        }
    }

    let staff_ids: Vec<StaffId> = roster.iter().map(|s| s.id.clone()).collect();
    let vacations = source.vacation_periods(business_id, &staff_ids)?;
    let appointments = source.appointments(business_id)?;

    debug!(
        business_id,
        staff = roster.len(),
        vacations = vacations.len(),
        appointments = appointments.len(),
        "loaded calendar"
    );

    Ok(CalendarData::new(
        business_hours,
        roster,
        staff_hours,
        vacations,
        appointments,
    ))
}

/// Run a pass over already-loaded calendar data.
///
/// # Errors
/// - `EngineError::InvalidConfig` if `config` does not validate.
/// - `EngineError::InvalidDuration` for a zero service duration.
/// - `EngineError::UnconfiguredCalendar` if the preferred staff member is not
///   on the roster.
pub fn resolve_with(
    data: &CalendarData,
    query: &AvailabilityQuery,
    now: NaiveDateTime,
    config: &EngineConfig,
) -> Result<Resolution> {
    config.validate()?;
    if query.service_duration_minutes == 0 {
        return Err(EngineError::InvalidDuration(
            "service duration must be at least one minute".to_string(),
        ));
    }
    if let Some(staff_id) = &query.staff_preference {
        if !data.roster.iter().any(|s| &s.id == staff_id) {
            return Err(EngineError::UnconfiguredCalendar(format!(
                "unknown staff '{}'",
                staff_id
            )));
        }
    }

    let rules = SlotRules {
        duration_minutes: query.service_duration_minutes,
        step_minutes: config.slot_step_minutes,
        staff_preference: query.staff_preference.as_ref(),
        now,
    };
    let scan = find_availability(
        data,
        query.week_start,
        config.max_weeks_to_scan,
        config.week_starts_on,
        &rules,
    )?;

    Ok(Resolution::from_scan(query.clone(), scan))
}

/// Load `query.business_id` from `source` and resolve it.
///
/// Nothing is retried or cached; each call reads the source afresh.
pub fn resolve_availability<S: CalendarSource + ?Sized>(
    source: &S,
    query: &AvailabilityQuery,
    now: NaiveDateTime,
    config: &EngineConfig,
) -> Result<Resolution> {
    let data = load_calendar(source, &query.business_id)?;
    resolve_with(&data, query, now, config)
}
