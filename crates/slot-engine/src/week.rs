//! Per-day slot lists across a 7-day window.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::calendar::{Appointment, OperatingHours, StaffId, StaffMember, TimeSlot, VacationPeriod};
use crate::eligibility::DayContext;
use crate::error::{EngineError, Result};
use crate::slots::candidate_slots;

/// Date → chronologically ordered bookable slots. Every date of the window is
/// present, possibly with an empty list.
pub type WeekAvailability = BTreeMap<NaiveDate, Vec<TimeSlot>>;

/// Calendar records for one business, fetched once per resolution pass.
#[derive(Debug, Clone, Default)]
pub struct CalendarData {
    pub business_hours: OperatingHours,
    pub roster: Vec<StaffMember>,
    pub staff_hours: HashMap<StaffId, OperatingHours>,
    pub vacations: Vec<VacationPeriod>,
    /// Confirmed appointments only; see [`CalendarData::new`].
    pub appointments: Vec<Appointment>,
}

impl CalendarData {
    /// Bundle fetched records, dropping appointments that are not confirmed.
    pub fn new(
        business_hours: OperatingHours,
        roster: Vec<StaffMember>,
        staff_hours: HashMap<StaffId, OperatingHours>,
        vacations: Vec<VacationPeriod>,
        appointments: Vec<Appointment>,
    ) -> Self {
        let appointments = appointments
            .into_iter()
            .filter(Appointment::is_confirmed)
            .collect();
        Self {
            business_hours,
            roster,
            staff_hours,
            vacations,
            appointments,
        }
    }

    /// The roster narrowed to the preferred staff member, or the whole roster.
    pub fn candidates(&self, preference: Option<&StaffId>) -> Vec<StaffMember> {
        match preference {
            Some(id) => self.roster.iter().filter(|s| &s.id == id).cloned().collect(),
            None => self.roster.clone(),
        }
    }
}

/// Inputs that shape slot generation for one pass.
#[derive(Debug, Clone, Copy)]
pub struct SlotRules<'a> {
    pub duration_minutes: u32,
    pub step_minutes: u32,
    pub staff_preference: Option<&'a StaffId>,
    /// Local wall-clock time of the pass. Earlier starts are dropped.
    pub now: NaiveDateTime,
}

/// Bookable slots for a single date, in chronological order.
///
/// # Errors
/// - `EngineError::InvalidTime` if the business hours for the date are malformed.
/// - `EngineError::InvalidDuration` / `InvalidConfig` for a zero duration or step.
pub fn compute_day(
    data: &CalendarData,
    date: NaiveDate,
    rules: &SlotRules<'_>,
) -> Result<Vec<TimeSlot>> {
    let Some(business) = data.business_hours.schedule_on(date)? else {
        return Ok(Vec::new());
    };

    let candidates = data.candidates(rules.staff_preference);
    let context = DayContext::new(
        &business,
        &data.staff_hours,
        &data.vacations,
        &data.appointments,
    );

    let grid = candidate_slots(
        &business,
        rules.duration_minutes,
        rules.step_minutes,
        rules.now,
    )?;
    let slots = grid
        .into_iter()
        .filter_map(|slot| {
            let available_staff = context.eligible_staff(&slot, &candidates);
            (!available_staff.is_empty()).then(|| TimeSlot {
                time: slot.start.time(),
                available_staff,
            })
        })
        .collect();

    Ok(slots)
}

/// Bookable slots for the 7 dates starting at `week_start`.
///
/// A date whose hours cannot be parsed is logged and left empty; the rest of
/// the week is still computed.
///
/// # Errors
/// Returns `EngineError::InvalidDuration` / `InvalidConfig` for a zero duration
/// or step, since no date could succeed.
pub fn compute_week(
    data: &CalendarData,
    week_start: NaiveDate,
    rules: &SlotRules<'_>,
) -> Result<WeekAvailability> {
    let mut week = WeekAvailability::new();

    for offset in 0..7 {
        let date = week_start + Duration::days(offset);
        let slots = match compute_day(data, date, rules) {
            Ok(slots) => slots,
            Err(err @ EngineError::InvalidTime(_)) => {
                warn!(%date, error = %err, "skipping day with malformed business hours");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        week.insert(date, slots);
    }

    debug!(
        %week_start,
        open_days = week.values().filter(|s| !s.is_empty()).count(),
        slots = week.values().map(Vec::len).sum::<usize>(),
        "computed week"
    );

    Ok(week)
}
