use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Third-party services whose webhooks this receiver accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebhookSource {
    Stripe,
    Vnpay,
    Twilio,
    GoogleCalendar,
}

impl std::fmt::Display for WebhookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookSource::Stripe => write!(f, "stripe"),
            WebhookSource::Vnpay => write!(f, "vnpay"),
            WebhookSource::Twilio => write!(f, "twilio"),
            WebhookSource::GoogleCalendar => write!(f, "google-calendar"),
        }
    }
}

impl std::str::FromStr for WebhookSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stripe" => Ok(WebhookSource::Stripe),
            "vnpay" => Ok(WebhookSource::Vnpay),
            "twilio" => Ok(WebhookSource::Twilio),
            "google-calendar" => Ok(WebhookSource::GoogleCalendar),
            other => Err(AppError::not_found(format!(
                "Unknown webhook source: {}",
                other
            ))),
        }
    }
}

/// Durable queue row holding a raw third-party payload for asynchronous
/// processing. The receiver never interprets the payload inline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookEvent {
    pub id: String,
    pub source: WebhookSource,

    /// Request headers captured for later verification (JSON object)
    pub headers: serde_json::Value,

    /// Raw request body, byte-exact
    pub payload: String,

    pub forwarded: bool,
    pub received_at: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    pub fn new(source: WebhookSource, headers: serde_json::Value, payload: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source,
            headers,
            payload,
            forwarded: false,
            received_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_source_round_trip() {
        for source in [
            WebhookSource::Stripe,
            WebhookSource::Vnpay,
            WebhookSource::Twilio,
            WebhookSource::GoogleCalendar,
        ] {
            assert_eq!(WebhookSource::from_str(&source.to_string()).unwrap(), source);
        }
        assert!(WebhookSource::from_str("slack").is_err());
    }

    #[test]
    fn test_event_preserves_payload_bytes() {
        let payload = r#"{"a": 1, "weird":  "  spacing  "}"#.to_string();
        let event = WebhookEvent::new(
            WebhookSource::Stripe,
            serde_json::json!({}),
            payload.clone(),
        );
        assert_eq!(event.payload, payload);
        assert!(!event.forwarded);
    }
}
