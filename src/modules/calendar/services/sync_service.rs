use tracing::{debug, warn};

use crate::modules::bookings::models::{Booking, ExternalSession};
use crate::modules::bookings::repositories::ExternalSessionRepository;
use crate::modules::calendar::services::gcal_client::GoogleCalendarClient;

/// Best-effort mirror of bookings into the stylist's Google Calendar.
///
/// Invoked after the core booking transition has committed. Every failure
/// on this path is logged and swallowed; calendar state never rolls back
/// or blocks a booking or payment transition.
pub struct CalendarSyncService {
    client: GoogleCalendarClient,
    sessions: ExternalSessionRepository,
}

impl CalendarSyncService {
    pub fn new(client: GoogleCalendarClient, sessions: ExternalSessionRepository) -> Self {
        Self { client, sessions }
    }

    /// Mirror a freshly created booking into the stylist's calendar.
    pub async fn mirror_created(&self, booking: &Booking) {
        let booking_id = match booking.id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Cannot mirror unpersisted booking");
                return;
            }
        };

        let event_id = match self.client.insert_event(booking.stylist_id, booking).await {
            Ok(event_id) => event_id,
            Err(e) => {
                // Stylists without a linked calendar land here via the
                // credential lookup; that is expected, not an error.
                debug!(booking_id = booking_id, error = %e, "Calendar mirror skipped");
                return;
            }
        };

        let session = ExternalSession::google(booking_id, event_id);
        if let Err(e) = self.sessions.create(&session).await {
            warn!(booking_id = booking_id, error = %e, "Failed to record external session");
        }
    }

    /// Remove the mirrored event for a booking being cancelled.
    pub async fn mirror_cancelled(&self, booking: &Booking) {
        let booking_id = match booking.id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Cannot detach unpersisted booking");
                return;
            }
        };

        let session = match self.sessions.find_by_booking_id(booking_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return,
            Err(e) => {
                warn!(booking_id = booking_id, error = %e, "Failed to look up external session");
                return;
            }
        };

        if let Err(e) = self
            .client
            .delete_event(booking.stylist_id, &session.external_event_id)
            .await
        {
            warn!(
                booking_id = booking_id,
                event_id = %session.external_event_id,
                error = %e,
                "Failed to delete calendar event"
            );
            return;
        }

        if let Err(e) = self.sessions.delete_by_booking_id(booking_id).await {
            warn!(booking_id = booking_id, error = %e, "Failed to remove external session");
        }
    }
}
