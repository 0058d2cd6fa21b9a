//! Which staff members can serve a given slot.
//!
//! A staff member is eligible for `[slot_start, slot_end)` on a date when all
//! of the following hold:
//!
//! 1. no business-wide vacation, and no vacation of their own, covers the date;
//! 2. the slot overlaps none of the business's breaks for that weekday;
//! 3. their own hours table has an open entry for that weekday;
//! 4. the slot overlaps none of their own breaks;
//! 5. the slot lies within their own opening hours;
//! 6. they have no confirmed appointment overlapping the slot.
//!
//! Every check uses the half-open overlap test from [`crate::interval`].

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::calendar::{
    Appointment, DaySchedule, OperatingHours, StaffId, StaffMember, VacationPeriod,
};
use crate::error::Result;
use crate::interval::TimeRange;

/// Everything the filter needs for one calendar date, resolved once and reused
/// for every slot of that date.
#[derive(Debug)]
pub struct DayContext<'a> {
    pub date: NaiveDate,
    business: &'a DaySchedule,
    /// Staff open on this date with well-formed hours. Absent means excluded.
    staff_days: HashMap<&'a StaffId, DaySchedule>,
    vacations: &'a [VacationPeriod],
    appointments: &'a [Appointment],
}

impl<'a> DayContext<'a> {
    /// Resolve every staff member's hours for `business.date`.
    ///
    /// A staff member whose hours for the day are malformed is logged and
    /// treated as unavailable for that day only.
    pub fn new(
        business: &'a DaySchedule,
        staff_hours: &'a HashMap<StaffId, OperatingHours>,
        vacations: &'a [VacationPeriod],
        appointments: &'a [Appointment],
    ) -> Self {
        let date = business.date;
        let staff_days = staff_hours
            .iter()
            .filter_map(|(staff_id, hours)| match hours.schedule_on(date) {
                Ok(Some(schedule)) => Some((staff_id, schedule)),
                Ok(None) => None,
                Err(err) => {
                    warn!(
                        %date,
                        staff_id = %staff_id,
                        error = %err,
                        "skipping staff with malformed hours"
                    );
                    None
                }
            })
            .collect();

        Self {
            date,
            business,
            staff_days,
            vacations,
            appointments,
        }
    }

    pub fn on_vacation(&self, staff_id: &StaffId) -> bool {
        self.vacations
            .iter()
            .any(|v| v.covers(self.date) && v.applies_to(staff_id))
    }

    pub fn is_booked(&self, staff_id: &StaffId, slot: &TimeRange<NaiveDateTime>) -> bool {
        self.appointments.iter().any(|a| a.blocks(staff_id, slot))
    }

    pub fn is_eligible(&self, staff_id: &StaffId, slot: &TimeRange<NaiveDateTime>) -> bool {
        if self.on_vacation(staff_id) {
            return false;
        }
        if self.business.on_break(slot) {
            return false;
        }
        // Checks 3, 4 and 5: open that day, off break, within own hours.
        let admitted = self
            .staff_days
            .get(staff_id)
            .is_some_and(|own| own.admits(slot));
        if !admitted {
            return false;
        }
        !self.is_booked(staff_id, slot)
    }

    /// The subset of `candidates` able to serve `slot`, in candidate order.
    pub fn eligible_staff(
        &self,
        slot: &TimeRange<NaiveDateTime>,
        candidates: &[StaffMember],
    ) -> Vec<StaffMember> {
        candidates
            .iter()
            .filter(|member| self.is_eligible(&member.id, slot))
            .cloned()
            .collect()
    }
}

/// One-shot form of [`DayContext::eligible_staff`] for a single slot.
///
/// Callers checking many slots of the same date should build a [`DayContext`]
/// once instead. Returns an empty list when the business is closed on the
/// slot's date.
///
/// # Errors
/// Returns `EngineError::InvalidTime` if the business hours for the slot's
/// weekday are malformed.
pub fn eligible_staff(
    slot: &TimeRange<NaiveDateTime>,
    candidates: &[StaffMember],
    business_hours: &OperatingHours,
    staff_hours: &HashMap<StaffId, OperatingHours>,
    vacations: &[VacationPeriod],
    appointments: &[Appointment],
) -> Result<Vec<StaffMember>> {
    let Some(business) = business_hours.schedule_on(slot.start.date())? else {
        return Ok(Vec::new());
    };
    let context = DayContext::new(&business, staff_hours, vacations, appointments);
    Ok(context.eligible_staff(slot, candidates))
}
