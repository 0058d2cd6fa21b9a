//! Tests for the half-open overlap test shared by break, vacation and
//! appointment checks.

use chrono::{NaiveDate, NaiveDateTime};
use slot_engine::interval::{overlaps, TimeRange};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

fn range(start: (u32, u32), end: (u32, u32)) -> TimeRange<NaiveDateTime> {
    TimeRange::new(at(start.0, start.1), at(end.0, end.1))
}

// ── overlaps ────────────────────────────────────────────────────────────────

#[test]
fn identical_ranges_overlap() {
    assert!(overlaps(at(9, 0), at(9, 30), at(9, 0), at(9, 30)));
}

#[test]
fn adjacent_ranges_do_not_overlap() {
    // [09:00, 09:30) and [09:30, 10:00) only share an endpoint
    assert!(!overlaps(at(9, 0), at(9, 30), at(9, 30), at(10, 0)));
    assert!(!overlaps(at(9, 30), at(10, 0), at(9, 0), at(9, 30)));
}

#[test]
fn slot_starting_inside_break_overlaps() {
    assert!(overlaps(at(10, 15), at(10, 45), at(10, 0), at(10, 30)));
}

#[test]
fn slot_ending_inside_break_overlaps() {
    assert!(overlaps(at(9, 45), at(10, 15), at(10, 0), at(10, 30)));
}

#[test]
fn slot_containing_break_overlaps() {
    assert!(overlaps(at(9, 0), at(11, 0), at(10, 0), at(10, 30)));
}

#[test]
fn slot_inside_break_overlaps() {
    assert!(overlaps(at(10, 5), at(10, 10), at(10, 0), at(10, 30)));
}

#[test]
fn overlap_is_symmetric() {
    let cases = [
        (range((9, 0), (9, 30)), range((9, 15), (9, 45))),
        (range((9, 0), (9, 30)), range((9, 30), (10, 0))),
        (range((8, 0), (12, 0)), range((10, 0), (10, 30))),
        (range((8, 0), (9, 0)), range((13, 0), (14, 0))),
    ];
    for (a, b) in cases {
        assert_eq!(a.overlaps(&b), b.overlaps(&a), "{:?} vs {:?}", a, b);
    }
}

// ── TimeRange ───────────────────────────────────────────────────────────────

#[test]
fn empty_range_never_overlaps() {
    let inverted = range((10, 30), (10, 0));
    let zero = range((10, 0), (10, 0));
    let day = range((8, 0), (18, 0));

    assert!(inverted.is_empty());
    assert!(zero.is_empty());
    assert!(!inverted.overlaps(&day));
    assert!(!day.overlaps(&zero));
}

#[test]
fn contains_allows_shared_endpoints() {
    let hours = range((9, 0), (12, 0));
    assert!(hours.contains(&range((9, 0), (9, 30))));
    assert!(hours.contains(&range((11, 30), (12, 0))));
    assert!(!hours.contains(&range((11, 45), (12, 15))));
    assert!(!hours.contains(&range((8, 30), (9, 0))));
}
