// Exhaustive checks of the booking state machine:
// pending -> confirmed -> completed, cancelled from pending/confirmed.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use trimly::core::Currency;
use trimly::modules::bookings::models::{Booking, BookingStatus};

const ALL_STATUSES: [BookingStatus; 4] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];

fn booking() -> Booking {
    Booking::new(
        1,
        1,
        1,
        5,
        Utc.with_ymd_and_hms(2025, 5, 18, 10, 0, 0).unwrap(),
        Decimal::new(10, 0),
        Currency::VND,
    )
    .unwrap()
}

#[test]
fn transition_matrix_is_exactly_the_specified_one() {
    use BookingStatus::*;

    let allowed = [
        (Pending, Confirmed),
        (Pending, Cancelled),
        (Confirmed, Completed),
        (Confirmed, Cancelled),
    ];

    for from in ALL_STATUSES {
        for to in ALL_STATUSES {
            let expected = allowed.contains(&(from, to));
            assert_eq!(
                from.can_transition_to(to),
                expected,
                "unexpected verdict for {:?} -> {:?}",
                from,
                to
            );
        }
    }
}

#[test]
fn cancelled_and_completed_are_terminal() {
    for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
        for to in ALL_STATUSES {
            assert!(!terminal.can_transition_to(to));
        }
    }
}

#[test]
fn only_cancelled_releases_the_slot() {
    assert!(BookingStatus::Pending.occupies_slot());
    assert!(BookingStatus::Confirmed.occupies_slot());
    assert!(BookingStatus::Completed.occupies_slot());
    assert!(!BookingStatus::Cancelled.occupies_slot());
}

#[test]
fn full_happy_path() {
    let mut b = booking();
    assert_eq!(b.status, BookingStatus::Pending);

    b.transition(BookingStatus::Confirmed).unwrap();
    b.transition(BookingStatus::Completed).unwrap();
    assert_eq!(b.status, BookingStatus::Completed);
}

#[test]
fn completion_straight_from_pending_is_rejected() {
    let mut b = booking();
    let err = b.transition(BookingStatus::Completed).unwrap_err();
    assert!(err.to_string().contains("cannot move"));
    assert_eq!(b.status, BookingStatus::Pending);
}
