use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use super::availability;
use crate::config::BookingConfig;
use crate::core::{AppError, Currency, Result};
use crate::middleware::AuthContext;
use crate::modules::bookings::models::{Booking, BookingStatus};
use crate::modules::bookings::repositories::BookingRepository;
use crate::modules::calendar::CalendarSyncService;
use crate::modules::notifications::NotificationService;
use crate::modules::payments::models::{PaymentMethod, PaymentStatus};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::payments::services::{PaymentIntent, PaymentService};

/// Booking creation request
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub branch_id: i64,
    pub stylist_id: i64,
    pub service_id: i64,
    pub booking_time: DateTime<Utc>,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default = "default_currency")]
    pub currency: Currency,
}

fn default_currency() -> Currency {
    Currency::VND
}

/// Booking lifecycle manager
///
/// Owns the pending -> confirmed -> completed state machine (cancelled
/// from pending/confirmed) and coordinates compensating actions around it:
/// payment creation/reversal, calendar mirroring, notification dispatch.
pub struct BookingService {
    bookings: Arc<BookingRepository>,
    payments: Arc<PaymentRepository>,
    payment_service: Arc<PaymentService>,
    calendar: Arc<CalendarSyncService>,
    notifications: Arc<NotificationService>,
    config: BookingConfig,
}

impl BookingService {
    pub fn new(
        bookings: Arc<BookingRepository>,
        payments: Arc<PaymentRepository>,
        payment_service: Arc<PaymentService>,
        calendar: Arc<CalendarSyncService>,
        notifications: Arc<NotificationService>,
        config: BookingConfig,
    ) -> Self {
        Self {
            bookings,
            payments,
            payment_service,
            calendar,
            notifications,
            config,
        }
    }

    /// Create a booking and its payment intent.
    ///
    /// Slot occupancy is checked first (first-writer-wins; the unique index
    /// in the schema backs up the read-then-write window). The calendar
    /// mirror and the received-notification are best-effort side effects.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        auth: &AuthContext,
    ) -> Result<(Booking, PaymentIntent)> {
        let booking = Booking::new(
            request.branch_id,
            request.stylist_id,
            request.service_id,
            auth.user_id,
            request.booking_time,
            request.total_price,
            request.currency,
        )?;

        if let Some(existing) = self
            .bookings
            .find_active_by_slot(request.branch_id, request.stylist_id, request.booking_time)
            .await?
        {
            return Err(AppError::conflict(format!(
                "Slot {} is already booked ({})",
                request.booking_time.format("%Y-%m-%d %H:%M"),
                existing.status
            )));
        }

        let stored = self.bookings.create(&booking).await?;
        let booking_id = stored.id()?;

        info!(
            booking_id = booking_id,
            branch_id = stored.branch_id,
            stylist_id = stored.stylist_id,
            start_time = %stored.start_time,
            "Booking created"
        );

        let intent = self
            .payment_service
            .create_payment_intent(
                booking_id,
                stored.total_price,
                stored.branch_id,
                request.payment_method,
            )
            .await?;

        self.calendar.mirror_created(&stored).await;

        if let Err(e) = self.notifications.booking_received(&stored).await {
            warn!(booking_id = booking_id, error = %e, "Failed to queue received notification");
        }

        Ok((stored, intent))
    }

    /// Cancel a booking with compensating actions, in order: calendar
    /// detach (best-effort), payment reversal (failures propagate), booking
    /// transition, customer notification.
    pub async fn cancel_booking(&self, booking_id: i64, auth: &AuthContext) -> Result<Booking> {
        let booking = self.get_booking(booking_id).await?;

        if !auth
            .role
            .can_cancel_booking(booking.is_owned_by(auth.user_id))
        {
            return Err(AppError::forbidden(
                "Only the booking owner or salon staff may cancel",
            ));
        }

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(AppError::precondition(format!(
                "Booking {} is {} and cannot be cancelled",
                booking_id, booking.status
            )));
        }

        // Calendar cleanup never blocks cancellation
        self.calendar.mirror_cancelled(&booking).await;

        // Payment reversal must not be silently skipped: a failure here
        // leaves the booking un-cancelled rather than orphaning a
        // succeeded payment.
        self.reverse_payment(booking_id).await?;

        let cancelled = self
            .bookings
            .transition(booking_id, booking.status, BookingStatus::Cancelled)
            .await?;
        if !cancelled {
            return Err(AppError::conflict(format!(
                "Booking {} changed state during cancellation",
                booking_id
            )));
        }

        info!(booking_id = booking_id, "Booking cancelled");

        let booking = self.get_booking(booking_id).await?;
        if let Err(e) = self.notifications.booking_cancelled(&booking).await {
            warn!(booking_id = booking_id, error = %e, "Failed to queue cancellation notification");
        }

        Ok(booking)
    }

    /// Complete a confirmed booking (staff only). A cash payment still
    /// pending is settled, and the review prompt goes out.
    pub async fn complete_booking(&self, booking_id: i64, auth: &AuthContext) -> Result<Booking> {
        if !auth.role.can_complete_booking() {
            return Err(AppError::forbidden("Completing bookings is staff-only"));
        }

        let booking = self.get_booking(booking_id).await?;

        let completed = self
            .bookings
            .transition(booking_id, BookingStatus::Confirmed, BookingStatus::Completed)
            .await?;
        if !completed {
            return Err(AppError::precondition(format!(
                "Booking {} is {} and cannot be completed",
                booking_id, booking.status
            )));
        }

        self.settle_pending_cash(booking_id).await?;

        info!(booking_id = booking_id, "Booking completed");

        let booking = self.get_booking(booking_id).await?;
        if let Err(e) = self.notifications.review_prompt(&booking).await {
            warn!(booking_id = booking_id, error = %e, "Failed to queue review prompt");
        }

        Ok(booking)
    }

    /// Staff confirmation of an in-person cash payment: settles the
    /// payment and confirms the booking.
    pub async fn confirm_cash_payment(
        &self,
        booking_id: i64,
        auth: &AuthContext,
    ) -> Result<Booking> {
        if !auth.role.can_confirm_cash_payment() {
            return Err(AppError::forbidden(
                "Confirming cash payments is staff-only",
            ));
        }

        let booking = self.get_booking(booking_id).await?;

        let payment = self
            .payments
            .find_by_booking_id(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No payment found for booking {}", booking_id))
            })?;

        if payment.method != PaymentMethod::Cash || payment.status != PaymentStatus::Pending {
            return Err(AppError::precondition(format!(
                "Cash confirmation requires a pending cash payment; found {} {}",
                payment.status, payment.method
            )));
        }

        let settled = self
            .payments
            .transition(&payment.id, PaymentStatus::Pending, PaymentStatus::Succeeded)
            .await?;
        if !settled {
            return Err(AppError::conflict(format!(
                "Payment {} changed state during cash confirmation",
                payment.id
            )));
        }

        let confirmed = self
            .bookings
            .transition(booking_id, BookingStatus::Pending, BookingStatus::Confirmed)
            .await?;
        if confirmed {
            if let Err(e) = self.notifications.booking_confirmed(&booking).await {
                warn!(booking_id = booking_id, error = %e, "Failed to queue confirmation notification");
            }
        }

        info!(booking_id = booking_id, "Cash payment confirmed");

        self.get_booking(booking_id).await
    }

    /// Available 30-minute slots for a branch/stylist/date: the business
    /// window grid minus non-cancelled bookings.
    pub async fn availability(
        &self,
        branch_id: i64,
        stylist_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>> {
        if branch_id <= 0 || stylist_id <= 0 {
            return Err(AppError::validation(
                "branch_id and stylist_id must be positive integers",
            ));
        }

        let slots =
            availability::enumerate_slots(date, self.config.open_hour, self.config.close_hour);

        let (Some(first), Some(last)) = (slots.first(), slots.last()) else {
            return Ok(Vec::new());
        };

        let booked = self
            .bookings
            .booked_start_times(
                branch_id,
                stylist_id,
                *first,
                *last + Duration::minutes(availability::SLOT_MINUTES),
            )
            .await?;

        Ok(availability::subtract_booked(slots, &booked))
    }

    /// Sweep: complete confirmed bookings whose start time passed the
    /// grace period. Returns how many were completed.
    pub async fn sweep_completions(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::hours(self.config.completion_grace_hours);
        let candidates = self.bookings.list_confirmed_started_before(cutoff).await?;
        let mut completed = 0;

        for booking in candidates {
            let booking_id = booking.id()?;

            if !self
                .bookings
                .transition(booking_id, BookingStatus::Confirmed, BookingStatus::Completed)
                .await?
            {
                continue;
            }

            self.settle_pending_cash(booking_id).await?;
            if let Err(e) = self.notifications.review_prompt(&booking).await {
                warn!(booking_id = booking_id, error = %e, "Failed to queue review prompt");
            }

            info!(booking_id = booking_id, "Booking swept to completed");
            completed += 1;
        }

        Ok(completed)
    }

    /// Sweep: administratively cancel pending bookings whose start time
    /// has passed without payment.
    pub async fn sweep_stale_pending(&self, now: DateTime<Utc>) -> Result<usize> {
        let candidates = self.bookings.list_pending_started_before(now).await?;
        let mut cancelled = 0;

        for booking in candidates {
            let booking_id = booking.id()?;

            self.reverse_payment(booking_id).await?;

            if !self
                .bookings
                .transition(booking_id, BookingStatus::Pending, BookingStatus::Cancelled)
                .await?
            {
                continue;
            }

            if let Err(e) = self.notifications.booking_cancelled(&booking).await {
                warn!(booking_id = booking_id, error = %e, "Failed to queue cancellation notification");
            }

            info!(booking_id = booking_id, "Stale pending booking cancelled");
            cancelled += 1;
        }

        Ok(cancelled)
    }

    /// Sweep: queue reminder notifications for confirmed bookings starting
    /// inside the reminder window.
    pub async fn sweep_reminders(&self, now: DateTime<Utc>) -> Result<usize> {
        let window_end = now + Duration::hours(self.config.reminder_hours);
        let candidates = self
            .bookings
            .list_confirmed_needing_reminder(now, window_end)
            .await?;
        let mut queued = 0;

        for booking in candidates {
            if let Err(e) = self.notifications.booking_reminder(&booking).await {
                warn!(booking_id = ?booking.id, error = %e, "Failed to queue reminder");
                continue;
            }
            queued += 1;
        }

        Ok(queued)
    }

    pub async fn get_booking(&self, booking_id: i64) -> Result<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {} not found", booking_id)))
    }

    /// Reverse a booking's payment according to its method and status:
    /// stripe-succeeded refunds through the provider, vnpay-succeeded is
    /// marked refunded without an external call, anything else live is
    /// marked cancelled. Terminal payments are left alone.
    async fn reverse_payment(&self, booking_id: i64) -> Result<()> {
        let Some(payment) = self.payments.find_by_booking_id(booking_id).await? else {
            return Ok(());
        };

        match (payment.method, payment.status) {
            (PaymentMethod::Stripe, PaymentStatus::Succeeded) => {
                self.payment_service.refund_payment(booking_id).await?;
            }
            (PaymentMethod::Vnpay, PaymentStatus::Succeeded) => {
                // No refund API on this path; reconciliation with the
                // provider ledger is manual.
                self.guarded_payment_transition(
                    &payment.id,
                    PaymentStatus::Succeeded,
                    PaymentStatus::Refunded,
                )
                .await?;
            }
            (_, PaymentStatus::Pending) => {
                self.guarded_payment_transition(
                    &payment.id,
                    PaymentStatus::Pending,
                    PaymentStatus::Cancelled,
                )
                .await?;
            }
            (_, PaymentStatus::Failed) => {
                self.guarded_payment_transition(
                    &payment.id,
                    PaymentStatus::Failed,
                    PaymentStatus::Cancelled,
                )
                .await?;
            }
            (PaymentMethod::Cash, PaymentStatus::Succeeded) => {
                self.guarded_payment_transition(
                    &payment.id,
                    PaymentStatus::Succeeded,
                    PaymentStatus::Cancelled,
                )
                .await?;
            }
            // Already refunded or cancelled: nothing to reverse
            (_, PaymentStatus::Refunded) | (_, PaymentStatus::Cancelled) => {}
        }

        Ok(())
    }

    async fn guarded_payment_transition(
        &self,
        payment_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<()> {
        if !self.payments.transition(payment_id, from, to).await? {
            return Err(AppError::conflict(format!(
                "Payment {} changed state during reversal",
                payment_id
            )));
        }
        Ok(())
    }

    /// A cash payment still pending at completion time is settled.
    async fn settle_pending_cash(&self, booking_id: i64) -> Result<()> {
        if let Some(payment) = self.payments.find_by_booking_id(booking_id).await? {
            if payment.method == PaymentMethod::Cash && payment.status == PaymentStatus::Pending {
                self.guarded_payment_transition(
                    &payment.id,
                    PaymentStatus::Pending,
                    PaymentStatus::Succeeded,
                )
                .await?;
            }
        }
        Ok(())
    }
}
