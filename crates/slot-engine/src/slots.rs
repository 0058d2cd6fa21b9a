//! Candidate start times for one calendar date.
//!
//! Candidates sit on a fixed grid anchored at the configured opening time (not
//! on wall-clock boundaries) and step by `step_minutes`. A candidate survives
//! when the whole service fits before closing time and its start is not in the
//! past. Break and staff filtering happens later, in [`crate::eligibility`].

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::calendar::{DaySchedule, OperatingHours};
use crate::error::{EngineError, Result};
use crate::interval::TimeRange;

/// Enumerate candidate slots for `date` against an hours table.
///
/// Returns an empty list when the entity is closed on `date`'s weekday.
///
/// # Errors
/// - `EngineError::InvalidTime` if the day's hours contain an unparseable time.
/// - `EngineError::InvalidDuration` if `duration_minutes` is zero.
/// - `EngineError::InvalidConfig` if `step_minutes` is zero.
pub fn generate_day_slots(
    date: NaiveDate,
    hours: &OperatingHours,
    duration_minutes: u32,
    step_minutes: u32,
    now: NaiveDateTime,
) -> Result<Vec<TimeRange<NaiveDateTime>>> {
    match hours.schedule_on(date)? {
        Some(schedule) => candidate_slots(&schedule, duration_minutes, step_minutes, now),
        None => Ok(Vec::new()),
    }
}

/// Enumerate candidate slots inside an already-resolved day.
///
/// Slots are returned in chronological order. The last slot is the latest one
/// whose end does not exceed closing time, even when the duration does not
/// divide the opening window evenly.
pub fn candidate_slots(
    schedule: &DaySchedule,
    duration_minutes: u32,
    step_minutes: u32,
    now: NaiveDateTime,
) -> Result<Vec<TimeRange<NaiveDateTime>>> {
    if duration_minutes == 0 {
        return Err(EngineError::InvalidDuration(
            "service duration must be at least one minute".to_string(),
        ));
    }
    if step_minutes == 0 {
        return Err(EngineError::InvalidConfig(
            "slot step must be at least one minute".to_string(),
        ));
    }

    let duration = Duration::minutes(i64::from(duration_minutes));
    let step = Duration::minutes(i64::from(step_minutes));

    let mut slots = Vec::new();
    let mut start = schedule.open;

    while start + duration <= schedule.close {
        // Strictly-past starts are dropped; a slot starting exactly now stays.
        if start >= now {
            slots.push(TimeRange::new(start, start + duration));
        }
        start += step;
    }

    Ok(slots)
}
