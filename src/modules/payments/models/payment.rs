use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};

/// Payment collection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Vnpay,
    Cash,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Stripe => write!(f, "stripe"),
            PaymentMethod::Vnpay => write!(f, "vnpay"),
            PaymentMethod::Cash => write!(f, "cash"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        // Method selection is case-insensitive at the API boundary
        match s.to_lowercase().as_str() {
            "stripe" => Ok(PaymentMethod::Stripe),
            "vnpay" => Ok(PaymentMethod::Vnpay),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(AppError::validation(format!(
                "Unknown payment method: {}",
                other
            ))),
        }
    }
}

/// Payment status lifecycle
///
/// Transitions are monotonic: pending -> {succeeded, failed} ->
/// {refunded, cancelled}. Refunded and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Succeeded)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Succeeded, Refunded)
                | (Succeeded, Cancelled)
                | (Failed, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::Cancelled)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Succeeded => write!(f, "succeeded"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payment record, one-to-one with a booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Unique payment ID (UUID)
    pub id: String,

    /// Related booking ID (unique: one payment per booking)
    pub booking_id: i64,

    /// Payment method
    pub method: PaymentMethod,

    /// Current status
    pub status: PaymentStatus,

    /// Amount to collect
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,

    /// Provider correlation: Stripe checkout-session / payment-intent id,
    /// VNPay payment URL. None for cash.
    pub provider_ref: Option<String>,

    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Create a new pending payment with validation
    pub fn new(
        booking_id: i64,
        method: PaymentMethod,
        amount: Decimal,
        currency: Currency,
    ) -> Result<Self> {
        if booking_id <= 0 {
            return Err(AppError::validation("Booking ID must be positive"));
        }

        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Payment amount must be positive"));
        }

        currency
            .validate_amount(amount)
            .map_err(AppError::validation)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            method,
            status: PaymentStatus::Pending,
            amount,
            currency,
            provider_ref: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        })
    }

    /// Apply a status transition, rejecting anything non-monotonic.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::precondition(format!(
                "Payment {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }

        self.status = next;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Refund is only reachable from a succeeded Stripe payment.
    pub fn can_refund(&self) -> bool {
        self.method == PaymentMethod::Stripe && self.status == PaymentStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payment() -> Payment {
        Payment::new(
            1,
            PaymentMethod::Stripe,
            Decimal::new(150000, 0),
            Currency::VND,
        )
        .unwrap()
    }

    #[test]
    fn test_payment_creation_valid() {
        let p = payment();
        assert_eq!(p.booking_id, 1);
        assert_eq!(p.status, PaymentStatus::Pending);
        assert!(p.provider_ref.is_none());
    }

    #[test]
    fn test_payment_rejects_bad_input() {
        assert!(Payment::new(
            0,
            PaymentMethod::Cash,
            Decimal::new(100, 0),
            Currency::VND
        )
        .is_err());
        assert!(Payment::new(
            1,
            PaymentMethod::Cash,
            Decimal::ZERO,
            Currency::VND
        )
        .is_err());
        // VND does not take fractional amounts
        assert!(Payment::new(
            1,
            PaymentMethod::Cash,
            Decimal::new(10050, 2),
            Currency::VND
        )
        .is_err());
    }

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!(
            PaymentMethod::from_str("STRIPE").unwrap(),
            PaymentMethod::Stripe
        );
        assert_eq!(
            PaymentMethod::from_str("VnPay").unwrap(),
            PaymentMethod::Vnpay
        );
        assert!(PaymentMethod::from_str("paypal").is_err());
    }

    #[test]
    fn test_status_never_regresses() {
        let mut p = payment();
        p.transition(PaymentStatus::Succeeded).unwrap();
        assert!(p.transition(PaymentStatus::Pending).is_err());
        assert!(p.transition(PaymentStatus::Failed).is_err());
        assert_eq!(p.status, PaymentStatus::Succeeded);
    }

    #[test]
    fn test_refund_only_from_succeeded_stripe() {
        let mut p = payment();
        assert!(!p.can_refund());

        p.transition(PaymentStatus::Succeeded).unwrap();
        assert!(p.can_refund());

        let mut cash = Payment::new(
            2,
            PaymentMethod::Cash,
            Decimal::new(100000, 0),
            Currency::VND,
        )
        .unwrap();
        cash.transition(PaymentStatus::Succeeded).unwrap();
        assert!(!cash.can_refund());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut p = payment();
        p.transition(PaymentStatus::Succeeded).unwrap();
        p.transition(PaymentStatus::Refunded).unwrap();
        assert!(p.status.is_terminal());
        assert!(p.transition(PaymentStatus::Cancelled).is_err());
    }
}
