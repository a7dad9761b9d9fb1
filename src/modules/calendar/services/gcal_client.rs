use std::sync::Arc;

use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::GoogleConfig;
use crate::core::{AppError, Result};
use crate::modules::bookings::models::Booking;
use crate::modules::calendar::models::Credential;
use crate::modules::calendar::repositories::CredentialRepository;

/// Length of the calendar block mirrored for a booking
const EVENT_MINUTES: i64 = 30;

/// Thin Google Calendar client over the stored OAuth credentials.
///
/// A 401 from the API triggers one access-token refresh through the OAuth
/// token endpoint (persisted back onto the credential) followed by a
/// single retry. Any other failure is surfaced to the caller.
pub struct GoogleCalendarClient {
    client: Client,
    config: GoogleConfig,
    credentials: Arc<CredentialRepository>,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleConfig, credentials: Arc<CredentialRepository>) -> Self {
        Self {
            client: Client::new(),
            config,
            credentials,
        }
    }

    /// Insert a calendar event mirroring the booking; returns the external
    /// event id.
    pub async fn insert_event(&self, user_id: i64, booking: &Booking) -> Result<String> {
        let credential = self.load_credential(user_id).await?;

        match self.try_insert_event(&credential.access_token, booking).await {
            Err(AppError::Unauthorized(_)) => {
                let access_token = self.refresh_access_token(&credential).await?;
                self.try_insert_event(&access_token, booking).await
            }
            other => other,
        }
    }

    /// Delete a previously mirrored event.
    pub async fn delete_event(&self, user_id: i64, event_id: &str) -> Result<()> {
        let credential = self.load_credential(user_id).await?;

        match self.try_delete_event(&credential.access_token, event_id).await {
            Err(AppError::Unauthorized(_)) => {
                let access_token = self.refresh_access_token(&credential).await?;
                self.try_delete_event(&access_token, event_id).await
            }
            other => other,
        }
    }

    async fn load_credential(&self, user_id: i64) -> Result<Credential> {
        self.credentials
            .find(user_id, Credential::GOOGLE)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No google credential for user {}", user_id))
            })
    }

    async fn try_insert_event(&self, access_token: &str, booking: &Booking) -> Result<String> {
        let url = format!(
            "{}/calendars/{}/events",
            self.config.api_base_url, self.config.calendar_id
        );

        let end_time = booking.start_time + Duration::minutes(EVENT_MINUTES);
        let body = json!({
            "summary": format!("Salon booking #{}", booking.id()?),
            "description": format!(
                "Branch {}, stylist {}, service {}",
                booking.branch_id, booking.stylist_id, booking.service_id
            ),
            "start": { "dateTime": booking.start_time.to_rfc3339() },
            "end": { "dateTime": end_time.to_rfc3339() },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Google Calendar request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let event: CalendarEventResponse = response.json().await.map_err(|e| {
                    AppError::provider(format!("Failed to parse calendar response: {}", e))
                })?;
                info!(event_id = %event.id, "Calendar event created");
                Ok(event.id)
            }
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(
                "Google access token rejected".to_string(),
            )),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::provider(format!(
                    "Google Calendar error - HTTP {} ({})",
                    status.as_u16(),
                    body
                )))
            }
        }
    }

    async fn try_delete_event(&self, access_token: &str, event_id: &str) -> Result<()> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.config.api_base_url, self.config.calendar_id, event_id
        );

        let response = self
            .client
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Google Calendar request failed: {}", e)))?;

        match response.status() {
            // 410 means the event is already gone, which is fine
            status if status.is_success() || status == StatusCode::GONE => Ok(()),
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(
                "Google access token rejected".to_string(),
            )),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::provider(format!(
                    "Google Calendar error - HTTP {} ({})",
                    status.as_u16(),
                    body
                )))
            }
        }
    }

    /// Exchange the refresh token for a new access token and persist it.
    async fn refresh_access_token(&self, credential: &Credential) -> Result<String> {
        info!(user_id = credential.user_id, "Refreshing Google access token");

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", credential.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                user_id = credential.user_id,
                status = status.as_u16(),
                "Google token refresh rejected"
            );
            return Err(AppError::provider(format!(
                "Token refresh error - HTTP {} ({})",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(format!("Failed to parse token response: {}", e)))?;

        self.credentials
            .update_access_token(credential.user_id, &credential.integration, &token.access_token)
            .await?;

        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct CalendarEventResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}
