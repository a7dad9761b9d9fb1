use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Fixed slot width across the whole platform
pub const SLOT_MINUTES: i64 = 30;

/// Enumerate every slot start for a day across the business window
/// [open_hour, close_hour), stepping by the fixed slot width.
pub fn enumerate_slots(date: NaiveDate, open_hour: u32, close_hour: u32) -> Vec<DateTime<Utc>> {
    let Some(open) = date.and_hms_opt(open_hour, 0, 0) else {
        return Vec::new();
    };
    let Some(close) = date.and_hms_opt(close_hour, 0, 0) else {
        return Vec::new();
    };

    let open = Utc.from_utc_datetime(&open);
    let close = Utc.from_utc_datetime(&close);

    let mut slots = Vec::new();
    let mut cursor = open;
    while cursor + Duration::minutes(SLOT_MINUTES) <= close {
        slots.push(cursor);
        cursor += Duration::minutes(SLOT_MINUTES);
    }

    slots
}

/// Remove slots already occupied by non-cancelled bookings. Plain set
/// subtraction; not a scheduling algorithm.
pub fn subtract_booked(
    slots: Vec<DateTime<Utc>>,
    booked: &[DateTime<Utc>],
) -> Vec<DateTime<Utc>> {
    slots
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 18).unwrap()
    }

    #[test]
    fn test_enumerates_half_hour_grid() {
        let slots = enumerate_slots(date(), 9, 18);
        // 9 hours * 2 slots per hour
        assert_eq!(slots.len(), 18);
        assert_eq!(slots[0], Utc.with_ymd_and_hms(2025, 5, 18, 9, 0, 0).unwrap());
        assert_eq!(slots[1], Utc.with_ymd_and_hms(2025, 5, 18, 9, 30, 0).unwrap());
        // Last slot still fits before close
        assert_eq!(
            *slots.last().unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 18, 17, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_subtraction_removes_booked_slots() {
        let slots = enumerate_slots(date(), 9, 18);
        let booked = vec![
            Utc.with_ymd_and_hms(2025, 5, 18, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 18, 14, 30, 0).unwrap(),
        ];

        let available = subtract_booked(slots, &booked);
        assert_eq!(available.len(), 16);
        assert!(!available.contains(&booked[0]));
        assert!(!available.contains(&booked[1]));
    }

    #[test]
    fn test_empty_window_yields_no_slots() {
        assert!(enumerate_slots(date(), 18, 18).is_empty());
    }
}
