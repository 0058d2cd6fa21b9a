//! Bounded forward search for the first week with a bookable slot.
//!
//! The scan starts at the requested week (never earlier than the week
//! containing today), computes it, and steps forward 7 days at a time until a
//! week has at least one slot on or after today, or `max_weeks` weeks were
//! looked at. Running out of weeks is not an error: the result says
//! `exhausted` and how many empty weeks were seen.

use std::fmt;

use chrono::{Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::week::{compute_week, CalendarData, SlotRules, WeekAvailability};

/// First day of the week containing `date`.
pub fn week_start_of(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    date.week(first_day).first_day()
}

/// `true` when some date on or after `today` has at least one slot.
///
/// Past dates never count, so a stale week in the past is not "available".
pub fn has_available_slots(week: &WeekAvailability, today: NaiveDate) -> bool {
    week.range(today..).any(|(_, slots)| !slots.is_empty())
}

/// Outcome of a week scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekScan {
    /// The week holding the returned slots, or the first scanned week when
    /// exhausted.
    pub resolved_week_start: NaiveDate,
    pub slots_by_date: WeekAvailability,
    pub exhausted: bool,
    /// Consecutive empty weeks seen before the resolved week (or in total when
    /// exhausted).
    pub empty_week_count: u32,
}

impl WeekScan {
    pub fn notice(&self) -> AvailabilityNotice {
        AvailabilityNotice::from_scan_counts(self.exhausted, self.empty_week_count)
    }
}

/// Scan weeks forward from `start_week` until one has availability.
///
/// `start_week` is aligned to its week's first day and clamped to the week
/// containing `rules.now`. At least one week is always computed.
///
/// # Errors
/// Only errors that would fail every week (zero duration or step) are
/// returned; malformed hours for a single day are logged and skipped.
pub fn find_availability(
    data: &CalendarData,
    start_week: NaiveDate,
    max_weeks: u32,
    first_day: Weekday,
    rules: &SlotRules<'_>,
) -> Result<WeekScan> {
    let today = rules.now.date();
    let first_week = week_start_of(start_week, first_day).max(week_start_of(today, first_day));
    let max_weeks = max_weeks.max(1);

    let mut week_start = first_week;
    for scanned in 0..max_weeks {
        let week = compute_week(data, week_start, rules)?;
        if has_available_slots(&week, today) {
            info!(%week_start, empty_weeks = scanned, "found availability");
            return Ok(WeekScan {
                resolved_week_start: week_start,
                slots_by_date: week,
                exhausted: false,
                empty_week_count: scanned,
            });
        }
        week_start += Duration::days(7);
    }

    info!(%first_week, weeks = max_weeks, "no availability within scan bound");
    Ok(WeekScan {
        resolved_week_start: first_week,
        slots_by_date: WeekAvailability::new(),
        exhausted: true,
        empty_week_count: max_weeks,
    })
}

/// Human-facing summary of a scan, for graduated "no availability" messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AvailabilityNotice {
    /// The requested week has slots.
    Available,
    /// The requested week was empty; slots were found this many weeks later.
    NextAvailableAfter { empty_weeks: u32 },
    /// Nothing within the scan bound.
    Exhausted { weeks: u32 },
}

impl AvailabilityNotice {
    pub fn from_scan_counts(exhausted: bool, empty_week_count: u32) -> Self {
        if exhausted {
            AvailabilityNotice::Exhausted {
                weeks: empty_week_count,
            }
        } else if empty_week_count > 0 {
            AvailabilityNotice::NextAvailableAfter {
                empty_weeks: empty_week_count,
            }
        } else {
            AvailabilityNotice::Available
        }
    }

    /// Message shown to the end client, if any.
    pub fn message(&self) -> Option<String> {
        match *self {
            AvailabilityNotice::Available => None,
            AvailabilityNotice::NextAvailableAfter { empty_weeks: 1 } => {
                Some("Aucune disponibilité cette semaine.".to_string())
            }
            AvailabilityNotice::NextAvailableAfter { empty_weeks } => Some(format!(
                "Aucune disponibilité dans les {} prochaines semaines.",
                empty_weeks
            )),
            AvailabilityNotice::Exhausted { weeks } => Some(format!(
                "Aucune disponibilité trouvée dans les {} prochaines semaines. \
                 Veuillez nous contacter directement pour plus d'informations.",
                weeks
            )),
        }
    }
}

impl fmt::Display for AvailabilityNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(&message),
            None => f.write_str("Disponibilités trouvées."),
        }
    }
}

/// Week navigation that cannot move before the week containing today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCursor {
    current: NaiveDate,
    floor: NaiveDate,
    first_day: Weekday,
}

impl WeekCursor {
    /// A cursor on the week containing `today`.
    pub fn new(today: NaiveDate, first_day: Weekday) -> Self {
        let floor = week_start_of(today, first_day);
        Self {
            current: floor,
            floor,
            first_day,
        }
    }

    /// Jump to the week containing `date`, clamped to the floor.
    pub fn at(mut self, date: NaiveDate) -> Self {
        self.current = week_start_of(date, self.first_day).max(self.floor);
        self
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn can_go_back(&self) -> bool {
        self.current > self.floor
    }

    pub fn next_week(&mut self) -> NaiveDate {
        self.current += Duration::days(7);
        self.current
    }

    /// Step back one week; stays put on the floor week.
    pub fn previous_week(&mut self) -> NaiveDate {
        if self.can_go_back() {
            self.current -= Duration::days(7);
        }
        self.current
    }
}
