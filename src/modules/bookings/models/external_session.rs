use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Linkage record to a third-party calendar event mirroring a booking.
/// Never the source of truth for booking state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExternalSession {
    /// Related booking ID (unique: one mirrored event per booking)
    pub booking_id: i64,

    /// Calendar backend ("google")
    pub calendar_kind: String,

    /// Event id in the external calendar
    pub external_event_id: String,

    pub created_at: Option<DateTime<Utc>>,
}

impl ExternalSession {
    pub fn google(booking_id: i64, external_event_id: String) -> Self {
        Self {
            booking_id,
            calendar_kind: "google".to_string(),
            external_event_id,
            created_at: Some(Utc::now()),
        }
    }
}
