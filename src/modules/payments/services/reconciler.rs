use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::bookings::models::BookingStatus;
use crate::modules::bookings::repositories::BookingRepository;
use crate::modules::notifications::NotificationService;
use crate::modules::payments::models::{Payment, PaymentMethod, PaymentStatus};
use crate::modules::payments::providers::{
    CallbackContext, CallbackCorrelation, CallbackOutcome, ProviderSet,
};
use crate::modules::payments::repositories::PaymentRepository;

/// Callback reconciler
///
/// Verifies inbound provider callbacks (delegated to the adapter) and maps
/// the verified outcome onto internal payment and booking transitions.
/// Reconciliation is keyed strictly by the booking/payment correlation and
/// is idempotent: redelivered success signals are a no-op, never an error.
pub struct CallbackReconciler {
    payment_repo: Arc<PaymentRepository>,
    booking_repo: Arc<BookingRepository>,
    providers: Arc<ProviderSet>,
    notifications: Arc<NotificationService>,
}

/// Externally observable result of a reconciliation pass
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconciliationResult {
    Confirmed {
        booking_id: i64,
        payment_id: String,
    },
    Failed {
        booking_id: i64,
        payment_id: String,
        code: String,
    },
    /// The same signal was already applied; nothing changed
    Duplicate {
        booking_id: i64,
        payment_id: String,
    },
    /// Event verified but intentionally not acted upon
    Ignored {
        event: String,
    },
}

impl CallbackReconciler {
    pub fn new(
        payment_repo: Arc<PaymentRepository>,
        booking_repo: Arc<BookingRepository>,
        providers: Arc<ProviderSet>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            payment_repo,
            booking_repo,
            providers,
            notifications,
        }
    }

    /// Verify and apply a provider callback.
    ///
    /// Signature verification happens inside the adapter before any state
    /// is read; a method without callback support surfaces the adapter's
    /// unsupported-operation error.
    pub async fn handle_callback(
        &self,
        method: PaymentMethod,
        ctx: &CallbackContext,
    ) -> Result<ReconciliationResult> {
        let provider = self.providers.get(method);
        let outcome = provider.handle_callback(ctx).await?;

        match outcome {
            CallbackOutcome::PaymentSucceeded {
                correlation,
                provider_ref,
            } => {
                self.apply_success(method, correlation, provider_ref.as_deref())
                    .await
            }
            CallbackOutcome::PaymentFailed { correlation, code } => {
                self.apply_failure(method, correlation, code).await
            }
            CallbackOutcome::Ignored { event } => {
                info!(method = %method, event = %event, "Callback event ignored");
                Ok(ReconciliationResult::Ignored { event })
            }
        }
    }

    async fn apply_success(
        &self,
        method: PaymentMethod,
        correlation: CallbackCorrelation,
        provider_ref: Option<&str>,
    ) -> Result<ReconciliationResult> {
        let payment = self.find_payment(&correlation).await?;
        let booking_id = payment.booking_id;

        match payment.status {
            PaymentStatus::Pending => {}
            // Redelivery of an already applied success signal. The booking
            // transition is re-attempted so a crash between the payment and
            // booking writes heals on redelivery.
            PaymentStatus::Succeeded => {
                info!(
                    payment_id = %payment.id,
                    booking_id = booking_id,
                    "Success callback redelivered; payment already succeeded"
                );
                self.booking_repo
                    .transition(booking_id, BookingStatus::Pending, BookingStatus::Confirmed)
                    .await?;
                return Ok(ReconciliationResult::Duplicate {
                    booking_id,
                    payment_id: payment.id,
                });
            }
            other => {
                return Err(AppError::precondition(format!(
                    "Payment {} is {} and cannot succeed",
                    payment.id, other
                )));
            }
        }

        let transitioned = self
            .payment_repo
            .transition_with_ref(
                &payment.id,
                PaymentStatus::Pending,
                PaymentStatus::Succeeded,
                provider_ref,
            )
            .await?;

        if !transitioned {
            // Lost the race against a concurrent delivery of the same
            // event; treat as duplicate if the winner also succeeded.
            let current = self
                .payment_repo
                .find_by_id(&payment.id)
                .await?
                .ok_or_else(|| AppError::internal("Payment disappeared during reconciliation"))?;
            if current.status == PaymentStatus::Succeeded {
                return Ok(ReconciliationResult::Duplicate {
                    booking_id,
                    payment_id: payment.id,
                });
            }
            return Err(AppError::conflict(format!(
                "Payment {} changed state during reconciliation",
                payment.id
            )));
        }

        // Booking may already be confirmed from an earlier delivery; the
        // guarded transition keeps this idempotent.
        let confirmed = self
            .booking_repo
            .transition(booking_id, BookingStatus::Pending, BookingStatus::Confirmed)
            .await?;

        if confirmed {
            if let Some(booking) = self.booking_repo.find_by_id(booking_id).await? {
                if let Err(e) = self.notifications.booking_confirmed(&booking).await {
                    warn!(booking_id = booking_id, error = %e, "Failed to queue confirmation notification");
                }
            }
        }

        info!(
            method = %method,
            booking_id = booking_id,
            payment_id = %payment.id,
            "Payment succeeded; booking confirmed"
        );

        Ok(ReconciliationResult::Confirmed {
            booking_id,
            payment_id: payment.id,
        })
    }

    async fn apply_failure(
        &self,
        method: PaymentMethod,
        correlation: CallbackCorrelation,
        code: String,
    ) -> Result<ReconciliationResult> {
        let payment = self.find_payment(&correlation).await?;
        let booking_id = payment.booking_id;

        if payment.status == PaymentStatus::Failed {
            return Ok(ReconciliationResult::Duplicate {
                booking_id,
                payment_id: payment.id,
            });
        }

        let transitioned = self
            .payment_repo
            .transition(&payment.id, PaymentStatus::Pending, PaymentStatus::Failed)
            .await?;

        if !transitioned {
            return Err(AppError::precondition(format!(
                "Payment {} is {} and cannot fail",
                payment.id, payment.status
            )));
        }

        // The booking stays unconfirmed; stale pending bookings are left
        // for manual handling or the scheduled sweep.
        warn!(
            method = %method,
            booking_id = booking_id,
            payment_id = %payment.id,
            code = %code,
            "Payment failed"
        );

        Ok(ReconciliationResult::Failed {
            booking_id,
            payment_id: payment.id,
            code,
        })
    }

    /// Resolve the callback correlation to a payment row; unknown payments
    /// are a not-found error, never a silent success.
    async fn find_payment(&self, correlation: &CallbackCorrelation) -> Result<Payment> {
        match correlation {
            CallbackCorrelation::BookingId(booking_id) => self
                .payment_repo
                .find_by_booking_id(*booking_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!(
                        "No payment found for booking {} referenced by callback",
                        booking_id
                    ))
                }),
        }
    }
}
