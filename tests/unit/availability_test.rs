// Availability is a fixed 30-minute grid across the business window minus
// slots occupied by non-cancelled bookings. Plain set subtraction.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use trimly::modules::bookings::services::availability::{
    enumerate_slots, subtract_booked, SLOT_MINUTES,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 18).unwrap()
}

#[test]
fn grid_covers_the_window_in_half_hour_steps() {
    let slots = enumerate_slots(date(), 9, 18);

    assert_eq!(slots.len(), 18);
    for pair in slots.windows(2) {
        assert_eq!((pair[1] - pair[0]).num_minutes(), SLOT_MINUTES);
    }
    assert_eq!(
        slots[0],
        Utc.with_ymd_and_hms(2025, 5, 18, 9, 0, 0).unwrap()
    );
}

#[test]
fn booked_slots_disappear_from_the_grid() {
    let slots = enumerate_slots(date(), 9, 18);
    let booked = vec![Utc.with_ymd_and_hms(2025, 5, 18, 10, 0, 0).unwrap()];

    let available = subtract_booked(slots.clone(), &booked);

    assert_eq!(available.len(), slots.len() - 1);
    assert!(!available.contains(&booked[0]));
}

#[test]
fn bookings_outside_the_grid_change_nothing() {
    let slots = enumerate_slots(date(), 9, 18);
    // 8:00 is before opening; 10:15 is off the grid
    let booked = vec![
        Utc.with_ymd_and_hms(2025, 5, 18, 8, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 5, 18, 10, 15, 0).unwrap(),
    ];

    let available = subtract_booked(slots.clone(), &booked);
    assert_eq!(available.len(), slots.len());
}

#[test]
fn fully_booked_day_has_no_availability() {
    let slots = enumerate_slots(date(), 9, 18);
    let available = subtract_booked(slots.clone(), &slots);
    assert!(available.is_empty());
}

proptest! {
    #[test]
    fn subtraction_never_invents_slots(
        booked_hours in prop::collection::vec(9u32..18, 0..10)
    ) {
        let slots = enumerate_slots(date(), 9, 18);
        let booked: Vec<_> = booked_hours
            .iter()
            .map(|h| Utc.with_ymd_and_hms(2025, 5, 18, *h, 0, 0).unwrap())
            .collect();

        let available = subtract_booked(slots.clone(), &booked);

        prop_assert!(available.len() <= slots.len());
        for slot in &available {
            prop_assert!(slots.contains(slot));
            prop_assert!(!booked.contains(slot));
        }
    }
}
