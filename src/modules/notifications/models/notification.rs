use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(30)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingReceived,
    BookingConfirmed,
    BookingCancelled,
    BookingReminder,
    ReviewPrompt,
}

/// Delivery channel. Transport is handled by a downstream worker; this
/// service only records what should go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
}

/// Outbound notification record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub customer_id: i64,
    pub booking_id: i64,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub body: String,
    pub sent: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        customer_id: i64,
        booking_id: i64,
        kind: NotificationKind,
        channel: NotificationChannel,
        body: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id,
            booking_id,
            kind,
            channel,
            body,
            sent: false,
            created_at: Some(Utc::now()),
        }
    }
}
