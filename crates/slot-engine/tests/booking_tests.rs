//! Tests for staff selection, appointment creation and cancellation.

use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use slot_engine::booking::{
    select_slot, BookingError, ClientDetails, FirstEligible, NewAppointment, RandomPicker,
    SlotSelection, StaffPicker,
};
use slot_engine::calendar::{
    Appointment, AppointmentStatus, Service, ServiceDuration, StaffId, StaffMember, TimeSlot,
};
use slot_engine::source::{AppointmentStore, CalendarSnapshot, MemoryCalendar};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn at(hour: u32, min: u32) -> NaiveDateTime {
    monday().and_hms_opt(hour, min, 0).unwrap()
}

fn hm(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap()
}

fn staff() -> Vec<StaffMember> {
    vec![
        StaffMember::new("alice", "Alice", "Martin"),
        StaffMember::new("bob", "Bob", "Durand"),
        StaffMember::new("chloe", "Chloé", "Petit"),
    ]
}

fn nine_oclock() -> TimeSlot {
    TimeSlot {
        time: hm(9, 0),
        available_staff: staff(),
    }
}

fn client() -> ClientDetails {
    ClientDetails {
        first_name: "Marie".to_string(),
        last_name: "Dupont".to_string(),
        email: "marie@example.fr".to_string(),
        phone: "06 12 34 56 78".to_string(),
    }
}

fn haircut() -> Service {
    Service {
        id: "cut".to_string(),
        title: "Coupe".to_string(),
        description: String::new(),
        price: 35.0,
        duration: ServiceDuration::new(0, 45),
        business_id: "salon".to_string(),
    }
}

fn selection(staff_id: &str, hour: u32, min: u32) -> SlotSelection {
    SlotSelection {
        date: monday(),
        time: hm(hour, min),
        staff_id: StaffId::new(staff_id),
    }
}

fn new_appointment(staff_id: &str, hour: u32, min: u32) -> NewAppointment {
    NewAppointment::from_selection("salon", &haircut(), &selection(staff_id, hour, min), client())
        .unwrap()
}

// ── Staff selection ─────────────────────────────────────────────────────────

#[test]
fn preference_is_honoured_when_eligible() {
    let bob = StaffId::new("bob");
    let chosen = select_slot(monday(), &nine_oclock(), Some(&bob), &mut FirstEligible).unwrap();
    assert_eq!(chosen.staff_id, bob);
    assert_eq!(chosen.start(), at(9, 0));
}

#[test]
fn ineligible_preference_selects_nothing() {
    let dave = StaffId::new("dave");
    assert!(select_slot(monday(), &nine_oclock(), Some(&dave), &mut FirstEligible).is_none());
}

#[test]
fn first_eligible_is_deterministic() {
    let chosen = select_slot(monday(), &nine_oclock(), None, &mut FirstEligible).unwrap();
    assert_eq!(chosen.staff_id.as_str(), "alice");
}

#[test]
fn random_pick_is_always_eligible() {
    let slot = nine_oclock();
    let mut picker = RandomPicker::new();
    for _ in 0..50 {
        let chosen = select_slot(monday(), &slot, None, &mut picker).unwrap();
        assert!(slot.offers(&chosen.staff_id));
    }
}

#[test]
fn seeded_picker_is_reproducible() {
    let candidates = staff();
    let mut a = RandomPicker::seeded(7);
    let mut b = RandomPicker::seeded(7);
    let first: Vec<_> = (0..10).map(|_| a.pick(&candidates).unwrap().id.clone()).collect();
    let second: Vec<_> = (0..10).map(|_| b.pick(&candidates).unwrap().id.clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn empty_slot_selects_nothing() {
    let empty = TimeSlot {
        time: hm(9, 0),
        available_staff: Vec::new(),
    };
    assert!(select_slot(monday(), &empty, None, &mut RandomPicker::seeded(1)).is_none());
}

// ── New appointments ────────────────────────────────────────────────────────

#[test]
fn appointment_end_is_start_plus_duration() {
    let new = new_appointment("alice", 9, 30);
    assert_eq!(new.start, at(9, 30));
    assert_eq!(new.end, at(10, 15));

    let appointment = new.into_appointment("a1".to_string());
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.service_id, "cut");
    assert!(!appointment.notifications.email_confirmation_sent);
}

#[test]
fn blank_client_field_is_rejected() {
    let mut details = client();
    details.phone = "  ".to_string();
    let err = NewAppointment::from_selection("salon", &haircut(), &selection("bob", 9, 0), details)
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidClient(ref m) if m.contains("phone")));
}

#[test]
fn email_without_at_sign_is_rejected() {
    let mut details = client();
    details.email = "marie.example.fr".to_string();
    assert!(matches!(details.validate(), Err(BookingError::InvalidClient(_))));
}

// ── Store ───────────────────────────────────────────────────────────────────

#[test]
fn store_rejects_overlapping_booking_for_same_staff() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    calendar.create_appointment(new_appointment("alice", 9, 0)).unwrap();

    let err = calendar
        .create_appointment(new_appointment("alice", 9, 30))
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable { .. }));

    // Another staff member, or back-to-back, is fine.
    calendar.create_appointment(new_appointment("bob", 9, 30)).unwrap();
    calendar.create_appointment(new_appointment("alice", 9, 45)).unwrap();
    assert_eq!(calendar.snapshot().unwrap().appointments.len(), 3);
}

#[test]
fn concurrent_bookings_of_same_slot_admit_one() {
    let calendar = Arc::new(MemoryCalendar::new(CalendarSnapshot::default()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let calendar = Arc::clone(&calendar);
            thread::spawn(move || calendar.create_appointment(new_appointment("alice", 10, 0)))
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(calendar.snapshot().unwrap().appointments.len(), 1);
}

#[test]
fn cancelled_booking_frees_the_slot() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    let first = calendar.create_appointment(new_appointment("alice", 9, 0)).unwrap();
    let cancelled = calendar.cancel_appointment(&first.id, at(8, 0)).unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    calendar.create_appointment(new_appointment("alice", 9, 0)).unwrap();
}

#[test]
fn generated_ids_are_unique() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    let a = calendar.create_appointment(new_appointment("alice", 9, 0)).unwrap();
    let b = calendar.create_appointment(new_appointment("bob", 9, 0)).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(calendar.appointment(&a.id).unwrap(), Some(a));
}

#[test]
fn client_history_lists_other_bookings_newest_first() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    let current = calendar.create_appointment(new_appointment("alice", 9, 0)).unwrap();
    let earlier = calendar.create_appointment(new_appointment("bob", 8, 0)).unwrap();
    let later = calendar.create_appointment(new_appointment("chloe", 11, 0)).unwrap();
    calendar.cancel_appointment(&earlier.id, at(7, 0)).unwrap();

    let mut stranger = new_appointment("bob", 10, 0);
    stranger.client.email = "paul@example.fr".to_string();
    calendar.create_appointment(stranger).unwrap();

    let mut elsewhere = new_appointment("alice", 14, 0);
    elsewhere.business_id = "barbier".to_string();
    calendar.create_appointment(elsewhere).unwrap();

    let ids: Vec<String> = calendar
        .client_history(&current.id)
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![later.id, earlier.id]);
}

#[test]
fn client_history_of_unknown_appointment_fails() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    assert!(matches!(
        calendar.client_history("missing"),
        Err(BookingError::UnknownAppointment(_))
    ));
}

// ── Cancellation ────────────────────────────────────────────────────────────

#[test]
fn only_future_confirmed_appointments_are_cancellable() {
    let staff_id = StaffId::new("alice");
    let appointment = Appointment::confirmed(&staff_id, at(9, 0), at(9, 30));

    assert!(appointment.is_cancellable(at(8, 59)));
    assert!(!appointment.is_cancellable(at(9, 0)));
    assert!(!appointment.is_cancellable(at(12, 0)));
}

#[test]
fn cancel_twice_fails() {
    let staff_id = StaffId::new("alice");
    let mut appointment = Appointment::confirmed(&staff_id, at(9, 0), at(9, 30));
    appointment.cancel(at(8, 0)).unwrap();

    assert!(!appointment.is_cancellable(at(8, 0)));
    assert!(matches!(
        appointment.cancel(at(8, 0)),
        Err(BookingError::NotCancellable(_))
    ));
}

#[test]
fn cancel_unknown_id_fails() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    let err = calendar.cancel_appointment("missing", at(8, 0)).unwrap_err();
    assert!(matches!(err, BookingError::UnknownAppointment(_)));
}

#[test]
fn started_appointment_cannot_be_cancelled_through_store() {
    let calendar = MemoryCalendar::new(CalendarSnapshot::default());
    let booked = calendar.create_appointment(new_appointment("alice", 9, 0)).unwrap();
    let err = calendar.cancel_appointment(&booked.id, at(9, 10)).unwrap_err();
    assert!(matches!(err, BookingError::NotCancellable(_)));
    assert!(calendar.appointment(&booked.id).unwrap().unwrap().is_confirmed());
}
