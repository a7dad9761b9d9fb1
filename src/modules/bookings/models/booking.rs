use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Currency, Result};

/// Booking status lifecycle
///
/// pending -> confirmed -> completed, with cancelled reachable from
/// pending and confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }

    /// Non-cancelled bookings occupy their slot
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A reserved (branch, stylist, start-time) slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Unique booking ID (auto-increment)
    #[serde(skip_deserializing)]
    pub id: Option<i64>,

    pub branch_id: i64,
    pub stylist_id: i64,
    pub service_id: i64,
    pub customer_id: i64,

    /// Slot start time (UTC)
    pub start_time: DateTime<Utc>,

    /// Current status
    #[serde(skip_deserializing)]
    pub status: BookingStatus,

    /// Total price of the booked service
    pub total_price: Decimal,

    pub currency: Currency,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Create a new pending booking with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        branch_id: i64,
        stylist_id: i64,
        service_id: i64,
        customer_id: i64,
        start_time: DateTime<Utc>,
        total_price: Decimal,
        currency: Currency,
    ) -> Result<Self> {
        for (name, value) in [
            ("branch_id", branch_id),
            ("stylist_id", stylist_id),
            ("service_id", service_id),
            ("customer_id", customer_id),
        ] {
            if value <= 0 {
                return Err(AppError::validation(format!(
                    "{} must be a positive integer",
                    name
                )));
            }
        }

        if total_price <= Decimal::ZERO {
            return Err(AppError::validation("Total price must be positive"));
        }

        currency
            .validate_amount(total_price)
            .map_err(AppError::validation)?;

        Ok(Self {
            id: None,
            branch_id,
            stylist_id,
            service_id,
            customer_id,
            start_time,
            status: BookingStatus::Pending,
            total_price,
            currency,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        })
    }

    pub fn id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| AppError::internal("Booking has not been persisted"))
    }

    /// Apply a status transition, rejecting anything outside the state machine.
    pub fn transition(&mut self, next: BookingStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::precondition(format!(
                "Booking cannot move from {} to {}",
                self.status, next
            )));
        }

        self.status = next;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.customer_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
    fn test_booking_starts_pending() {
        let b = booking();
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.id.is_none());
    }

    #[test]
    fn test_booking_rejects_non_positive_references() {
        assert!(Booking::new(
            0,
            1,
            1,
            5,
            Utc::now(),
            Decimal::new(10, 0),
            Currency::VND
        )
        .is_err());
        assert!(Booking::new(
            1,
            1,
            1,
            5,
            Utc::now(),
            Decimal::ZERO,
            Currency::VND
        )
        .is_err());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut b = booking();
        b.transition(BookingStatus::Confirmed).unwrap();
        b.transition(BookingStatus::Completed).unwrap();
        // Completed is terminal
        assert!(b.transition(BookingStatus::Cancelled).is_err());
    }

    #[test]
    fn test_completed_requires_confirmed() {
        let mut b = booking();
        assert!(b.transition(BookingStatus::Completed).is_err());
        assert_eq!(b.status, BookingStatus::Pending);
    }

    #[test]
    fn test_cancel_from_pending_and_confirmed() {
        let mut from_pending = booking();
        from_pending.transition(BookingStatus::Cancelled).unwrap();
        assert!(!from_pending.status.occupies_slot());

        let mut from_confirmed = booking();
        from_confirmed.transition(BookingStatus::Confirmed).unwrap();
        from_confirmed.transition(BookingStatus::Cancelled).unwrap();
    }

    #[test]
    fn test_ownership() {
        let b = booking();
        assert!(b.is_owned_by(5));
        assert!(!b.is_owned_by(6));
    }
}
