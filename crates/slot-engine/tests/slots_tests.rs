//! Tests for candidate slot generation on the opening-time grid.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use slot_engine::calendar::{DayHours, OperatingHours};
use slot_engine::error::EngineError;
use slot_engine::slots::generate_day_slots;

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Monday 2026-10-19.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn at(date: NaiveDate, hour: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, min, 0).unwrap()
}

fn hm(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap()
}

fn starts(hours: &OperatingHours, duration: u32, now: NaiveDateTime) -> Vec<NaiveTime> {
    generate_day_slots(monday(), hours, duration, 30, now)
        .unwrap()
        .into_iter()
        .map(|slot| slot.start.time())
        .collect()
}

fn long_ago() -> NaiveDateTime {
    at(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 0, 0)
}

// ── Grid ────────────────────────────────────────────────────────────────────

#[test]
fn thirty_minute_service_fills_morning() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    assert_eq!(
        starts(&hours, 30, long_ago()),
        vec![hm(9, 0), hm(9, 30), hm(10, 0), hm(10, 30), hm(11, 0), hm(11, 30)]
    );
}

#[test]
fn last_slot_is_latest_that_fits() {
    // 45 minutes does not divide 09:00-12:00 on a 30-minute grid: the last
    // start is 11:00 (ends 11:45), 11:30 would end 12:15.
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    let slots = generate_day_slots(monday(), &hours, 45, 30, long_ago()).unwrap();

    assert_eq!(slots.last().unwrap().start.time(), hm(11, 0));
    assert_eq!(slots.last().unwrap().end.time(), hm(11, 45));
    assert!(slots.iter().all(|s| s.end <= at(monday(), 12, 0)));
}

#[test]
fn grid_is_anchored_at_opening_time() {
    let hours = OperatingHours::weekdays(DayHours::open("09:15", "11:15"));
    assert_eq!(
        starts(&hours, 60, long_ago()),
        vec![hm(9, 15), hm(9, 45), hm(10, 15)]
    );
}

#[test]
fn service_longer_than_day_yields_nothing() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "10:00"));
    assert!(starts(&hours, 90, long_ago()).is_empty());
}

#[test]
fn custom_step_is_honoured() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "10:00"));
    let slots = generate_day_slots(monday(), &hours, 15, 15, long_ago()).unwrap();
    assert_eq!(slots.len(), 4);
}

// ── Closed days ─────────────────────────────────────────────────────────────

#[test]
fn closed_weekday_yields_nothing() {
    let hours = OperatingHours::new().with_day(Weekday::Mon, DayHours::closed());
    assert!(starts(&hours, 30, long_ago()).is_empty());
}

#[test]
fn missing_weekday_is_closed() {
    let hours = OperatingHours::new().with_day(Weekday::Tue, DayHours::open("09:00", "12:00"));
    assert!(starts(&hours, 30, long_ago()).is_empty());
}

// ── Past slots ──────────────────────────────────────────────────────────────

#[test]
fn strictly_past_starts_are_dropped() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    let now = at(monday(), 10, 10);
    assert_eq!(starts(&hours, 30, now), vec![hm(10, 30), hm(11, 0), hm(11, 30)]);
}

#[test]
fn slot_starting_exactly_now_is_kept() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    let now = at(monday(), 11, 0);
    assert_eq!(starts(&hours, 30, now), vec![hm(11, 0), hm(11, 30)]);
}

#[test]
fn day_entirely_in_past_is_empty() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    let tuesday = at(monday().succ_opt().unwrap(), 8, 0);
    assert!(starts(&hours, 30, tuesday).is_empty());
}

#[test]
fn midnight_close_keeps_last_slot_of_the_day() {
    let hours = OperatingHours::weekdays(DayHours::open("22:00", "24:00"));
    assert_eq!(starts(&hours, 60, long_ago()), vec![hm(22, 0), hm(22, 30), hm(23, 0)]);
}

#[test]
fn break_until_midnight_is_accepted() {
    let day = DayHours::open("20:00", "24:00").with_break("23:00", "24:00");
    let hours = OperatingHours::weekdays(day);
    assert_eq!(starts(&hours, 30, long_ago()).len(), 8);
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn malformed_open_time_is_invalid_time() {
    let hours = OperatingHours::weekdays(DayHours::open("9h00", "12:00"));
    let err = generate_day_slots(monday(), &hours, 30, 30, long_ago()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidTime(_)), "got {:?}", err);
}

#[test]
fn hour_past_midnight_is_invalid_time() {
    let hours = OperatingHours::weekdays(DayHours::open("22:00", "24:30"));
    let err = generate_day_slots(monday(), &hours, 30, 30, long_ago()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidTime(_)), "got {:?}", err);
}

#[test]
fn zero_duration_is_rejected() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    let err = generate_day_slots(monday(), &hours, 0, 30, long_ago()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidDuration(_)));
}

#[test]
fn zero_step_is_rejected() {
    let hours = OperatingHours::weekdays(DayHours::open("09:00", "12:00"));
    let err = generate_day_slots(monday(), &hours, 30, 0, long_ago()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig(_)));
}
