use tracing::info;

use crate::core::Result;
use crate::modules::bookings::models::Booking;
use crate::modules::notifications::models::{
    Notification, NotificationChannel, NotificationKind,
};
use crate::modules::notifications::repositories::NotificationRepository;

/// Records outbound customer notifications.
///
/// Delivery transport (email/SMS) is a downstream worker's job; the
/// booking/payment flows only persist what should go out. Callers treat
/// failures here as non-fatal side effects.
pub struct NotificationService {
    repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }

    pub async fn booking_received(&self, booking: &Booking) -> Result<()> {
        self.record(
            booking,
            NotificationKind::BookingReceived,
            NotificationChannel::Email,
            format!(
                "We received your booking for {}. It is pending payment.",
                booking.start_time.format("%Y-%m-%d %H:%M")
            ),
        )
        .await
    }

    pub async fn booking_confirmed(&self, booking: &Booking) -> Result<()> {
        self.record(
            booking,
            NotificationKind::BookingConfirmed,
            NotificationChannel::Email,
            format!(
                "Your booking for {} is confirmed. See you soon!",
                booking.start_time.format("%Y-%m-%d %H:%M")
            ),
        )
        .await
    }

    pub async fn booking_cancelled(&self, booking: &Booking) -> Result<()> {
        self.record(
            booking,
            NotificationKind::BookingCancelled,
            NotificationChannel::Email,
            format!(
                "Your booking for {} has been cancelled.",
                booking.start_time.format("%Y-%m-%d %H:%M")
            ),
        )
        .await
    }

    pub async fn booking_reminder(&self, booking: &Booking) -> Result<()> {
        self.record(
            booking,
            NotificationKind::BookingReminder,
            NotificationChannel::Sms,
            format!(
                "Reminder: your salon appointment starts at {}.",
                booking.start_time.format("%Y-%m-%d %H:%M")
            ),
        )
        .await
    }

    pub async fn review_prompt(&self, booking: &Booking) -> Result<()> {
        self.record(
            booking,
            NotificationKind::ReviewPrompt,
            NotificationChannel::Email,
            "Thanks for visiting! Tell us how it went.".to_string(),
        )
        .await
    }

    async fn record(
        &self,
        booking: &Booking,
        kind: NotificationKind,
        channel: NotificationChannel,
        body: String,
    ) -> Result<()> {
        let booking_id = booking.id()?;
        let notification =
            Notification::new(booking.customer_id, booking_id, kind, channel, body);

        self.repo.create(&notification).await?;

        info!(
            booking_id = booking_id,
            customer_id = booking.customer_id,
            kind = ?kind,
            "Notification queued"
        );

        Ok(())
    }
}
