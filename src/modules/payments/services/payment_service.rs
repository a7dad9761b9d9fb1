use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info};

use crate::core::{retry_fixed, AppError, Result, RetryPolicy};
use crate::modules::bookings::repositories::BookingRepository;
use crate::modules::payments::models::{Payment, PaymentMethod, PaymentStatus};
use crate::modules::payments::providers::{ChargeRequest, ProviderCharge, ProviderSet};
use crate::modules::payments::repositories::PaymentRepository;

/// Payment orchestrator
///
/// Selects the provider adapter for a method, persists payment records and
/// normalizes heterogeneous provider responses. Transient provider
/// failures are absorbed by a bounded retry; exhaustion fails the whole
/// operation so callers never see a payment row without a provider handle
/// reported as success.
pub struct PaymentService {
    payment_repo: Arc<PaymentRepository>,
    booking_repo: Arc<BookingRepository>,
    providers: Arc<ProviderSet>,
    retry: RetryPolicy,
}

/// Result of payment-intent creation: the persisted record plus the
/// provider-specific payload handed back to the client.
#[derive(Debug)]
pub struct PaymentIntent {
    pub payment: Payment,
    pub charge: ProviderCharge,
}

impl PaymentService {
    pub fn new(
        payment_repo: Arc<PaymentRepository>,
        booking_repo: Arc<BookingRepository>,
        providers: Arc<ProviderSet>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            payment_repo,
            booking_repo,
            providers,
            retry,
        }
    }

    /// Create a provider-specific payment for a booking.
    ///
    /// The pending payment row is persisted concurrently with the provider
    /// call; overall success requires both. An existing pending payment for
    /// the booking with the same method is re-dispatched (the customer may
    /// have abandoned an earlier checkout) instead of duplicated.
    pub async fn create_payment_intent(
        &self,
        booking_id: i64,
        amount: Decimal,
        branch_id: i64,
        method: PaymentMethod,
    ) -> Result<PaymentIntent> {
        if booking_id <= 0 {
            return Err(AppError::validation("booking_id must be a positive integer"));
        }
        if branch_id <= 0 {
            return Err(AppError::validation("branch_id must be a positive integer"));
        }
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("amount must be positive"));
        }

        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {} not found", booking_id)))?;

        info!(
            booking_id = booking_id,
            method = %method,
            amount = %amount,
            "Creating payment intent"
        );

        let charge_request = ChargeRequest {
            booking_id,
            branch_id,
            amount,
            currency: booking.currency,
        };

        if let Some(existing) = self.payment_repo.find_by_booking_id(booking_id).await? {
            return self
                .reissue_payment(existing, method, &charge_request)
                .await;
        }

        let payment = Payment::new(booking_id, method, amount, booking.currency)?;
        let provider = self.providers.get(method);

        // Persistence and provider dispatch run concurrently; the joint
        // await means a provider failure fails the operation even when the
        // row has already landed.
        let persist = self.payment_repo.create(&payment);
        let dispatch = async {
            retry_fixed(self.retry, "create_payment", || {
                provider.create_payment(&charge_request)
            })
            .await
            .into_result("create_payment")
        };

        let (mut stored, charge) = tokio::try_join!(persist, dispatch).map_err(|e| {
            error!(booking_id = booking_id, method = %method, error = %e, "Payment intent creation failed");
            e
        })?;

        // Cash issues no correlation; the other providers' handle is
        // persisted before returning.
        if let Some(provider_ref) = charge.provider_ref() {
            self.payment_repo
                .set_provider_ref(&stored.id, provider_ref)
                .await?;
            stored.provider_ref = Some(provider_ref.to_string());
        }

        info!(
            booking_id = booking_id,
            payment_id = %stored.id,
            method = %method,
            "Payment intent created"
        );

        Ok(PaymentIntent {
            payment: stored,
            charge,
        })
    }

    /// Refund a booking's payment. Only valid for a succeeded Stripe
    /// payment; every other combination is a precondition failure that
    /// leaves state unchanged.
    pub async fn refund_payment(&self, booking_id: i64) -> Result<Payment> {
        if booking_id <= 0 {
            return Err(AppError::validation("booking_id must be a positive integer"));
        }

        let payment = self
            .payment_repo
            .find_by_booking_id(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No payment found for booking {}", booking_id))
            })?;

        if !payment.can_refund() {
            return Err(AppError::precondition(format!(
                "Refund requires a succeeded stripe payment; found {} {}",
                payment.status, payment.method
            )));
        }

        let provider_ref = payment.provider_ref.clone().ok_or_else(|| {
            AppError::internal(format!(
                "Payment {} has no provider reference to refund",
                payment.id
            ))
        })?;

        let provider = self.providers.get(payment.method);
        retry_fixed(self.retry, "refund_payment", || provider.refund(&provider_ref))
            .await
            .into_result("refund_payment")?;

        let updated = self
            .payment_repo
            .transition(&payment.id, PaymentStatus::Succeeded, PaymentStatus::Refunded)
            .await?;
        if !updated {
            return Err(AppError::conflict(format!(
                "Payment {} changed state during refund",
                payment.id
            )));
        }

        info!(
            booking_id = booking_id,
            payment_id = %payment.id,
            "Payment refunded"
        );

        self.payment_repo.find_by_id(&payment.id).await?.ok_or_else(|| {
            AppError::internal("Refunded payment disappeared".to_string())
        })
    }

    /// Re-dispatch the provider for an existing pending payment.
    async fn reissue_payment(
        &self,
        existing: Payment,
        method: PaymentMethod,
        charge_request: &ChargeRequest,
    ) -> Result<PaymentIntent> {
        if existing.status != PaymentStatus::Pending || existing.method != method {
            return Err(AppError::conflict(format!(
                "Booking {} already has a {} {} payment",
                existing.booking_id, existing.status, existing.method
            )));
        }

        let provider = self.providers.get(method);
        let charge = retry_fixed(self.retry, "create_payment", || {
            provider.create_payment(charge_request)
        })
        .await
        .into_result("create_payment")?;

        let mut payment = existing;
        if let Some(provider_ref) = charge.provider_ref() {
            self.payment_repo
                .set_provider_ref(&payment.id, provider_ref)
                .await?;
            payment.provider_ref = Some(provider_ref.to_string());
        }

        info!(
            booking_id = payment.booking_id,
            payment_id = %payment.id,
            "Re-issued provider handle for pending payment"
        );

        Ok(PaymentIntent { payment, charge })
    }
}
