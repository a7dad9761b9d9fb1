use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};

use super::{
    CallbackContext, CallbackCorrelation, CallbackOutcome, ChargeRequest, PaymentProvider,
    ProviderCharge,
};
use crate::config::StripeConfig;
use crate::core::{AppError, Currency, Result};
use crate::modules::payments::models::PaymentMethod;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the webhook timestamp and our clock
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe payment provider
///
/// Creates hosted Checkout Sessions and verifies inbound webhook
/// signatures against the shared webhook secret and the exact raw body.
pub struct StripeProvider {
    client: Client,
    secret_key: String,
    webhook_secret: String,
    base_url: String,
    success_url: String,
    cancel_url: String,
}

impl StripeProvider {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            base_url: config.base_url.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        }
    }

    /// Verify a `stripe-signature` header against the raw payload.
    ///
    /// The header carries a timestamp and one or more v1 signatures; the
    /// expected signature is HMAC-SHA256 over "{timestamp}.{body}". Any
    /// mismatch fails closed.
    fn verify_signature(&self, payload: &[u8], sig_header: &str) -> Result<()> {
        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for item in sig_header.split(',') {
            match item.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            AppError::SignatureVerification("Missing timestamp in stripe-signature".to_string())
        })?;

        if candidates.is_empty() {
            return Err(AppError::SignatureVerification(
                "Missing v1 signature in stripe-signature".to_string(),
            ));
        }

        let event_time: i64 = timestamp.parse().map_err(|_| {
            AppError::SignatureVerification("Invalid timestamp in stripe-signature".to_string())
        })?;

        if (Utc::now().timestamp() - event_time).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(AppError::SignatureVerification(
                "Webhook timestamp outside tolerance".to_string(),
            ));
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::internal("Invalid webhook secret for HMAC"))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        if candidates
            .iter()
            .any(|candidate| constant_time_eq(expected.as_bytes(), candidate.as_bytes()))
        {
            Ok(())
        } else {
            Err(AppError::SignatureVerification(
                "Stripe signature mismatch".to_string(),
            ))
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_payment(&self, request: &ChargeRequest) -> Result<ProviderCharge> {
        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let unit_amount = to_minor_units(request.amount, request.currency)?;
        let product_name = format!("Salon booking #{}", request.booking_id);

        // The booking id travels in the payment-intent metadata so the
        // webhook event carries the correlation back to us.
        let form_body: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.to_string().to_lowercase(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                product_name,
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                unit_amount.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "payment_intent_data[metadata][booking_id]".to_string(),
                request.booking_id.to_string(),
            ),
            (
                "metadata[booking_id]".to_string(),
                request.booking_id.to_string(),
            ),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::provider(format!("Stripe unavailable: {}", e))
                } else {
                    AppError::provider(format!("Stripe API request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::provider(format!("Failed to read Stripe response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::provider(format!(
                "Stripe API error - HTTP {} ({})",
                status.as_u16(),
                extract_stripe_error(&body)
            )));
        }

        let session: CheckoutSessionResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::provider(format!("Failed to parse Stripe response: {}", e)))?;

        let session_url = session.url.ok_or_else(|| {
            AppError::provider("Stripe response missing checkout URL".to_string())
        })?;

        Ok(ProviderCharge::Stripe {
            session_id: session.id,
            session_url,
        })
    }

    async fn handle_callback(&self, ctx: &CallbackContext) -> Result<CallbackOutcome> {
        let raw_body = ctx.raw_body.as_deref().ok_or_else(|| {
            AppError::validation("Stripe webhook requires the exact raw request body")
        })?;
        let signature = ctx
            .signature
            .as_deref()
            .ok_or_else(|| AppError::validation("Missing stripe-signature header"))?;

        // Verification precedes any payload interpretation
        self.verify_signature(raw_body.as_bytes(), signature)?;

        let event: StripeEvent = serde_json::from_str(raw_body)
            .map_err(|e| AppError::validation(format!("Malformed Stripe event: {}", e)))?;

        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                let intent_id = event.object_id()?;
                let booking_id = event.booking_correlation()?;
                Ok(CallbackOutcome::PaymentSucceeded {
                    correlation: CallbackCorrelation::BookingId(booking_id),
                    provider_ref: Some(intent_id),
                })
            }
            "payment_intent.payment_failed" => {
                let booking_id = event.booking_correlation()?;
                Ok(CallbackOutcome::PaymentFailed {
                    correlation: CallbackCorrelation::BookingId(booking_id),
                    code: "payment_intent.payment_failed".to_string(),
                })
            }
            "checkout.session.completed" => {
                // Payment-intent success is the authoritative signal;
                // session completion is acknowledged without a transition.
                info!(event_id = %event.id, "Ignoring checkout.session.completed");
                Ok(CallbackOutcome::Ignored {
                    event: event.event_type,
                })
            }
            other => {
                warn!(event_type = other, "Unhandled Stripe event type");
                Ok(CallbackOutcome::Ignored {
                    event: event.event_type,
                })
            }
        }
    }

    async fn refund(&self, provider_ref: &str) -> Result<()> {
        let url = format!("{}/v1/refunds", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("payment_intent", provider_ref)])
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Stripe refund request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider(format!(
                "Stripe refund error - HTTP {} ({})",
                status.as_u16(),
                extract_stripe_error(&body)
            )));
        }

        Ok(())
    }

    fn method(&self) -> PaymentMethod {
        PaymentMethod::Stripe
    }
}

/// Convert a decimal amount to the provider's smallest currency unit
fn to_minor_units(amount: Decimal, currency: Currency) -> Result<i64> {
    let factor = match currency.scale() {
        0 => Decimal::ONE,
        _ => Decimal::from(100),
    };

    (amount * factor)
        .round()
        .to_i64()
        .ok_or_else(|| AppError::validation(format!("Amount out of range: {}", amount)))
}

/// Pull the human-readable message out of a Stripe error body
fn extract_stripe_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

impl StripeEvent {
    fn object_id(&self) -> Result<String> {
        self.data
            .object
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| AppError::validation("Stripe event object missing id"))
    }

    fn booking_correlation(&self) -> Result<i64> {
        self.data
            .object
            .get("metadata")
            .and_then(|m| m.get("booking_id"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                AppError::validation("Stripe event missing booking_id metadata".to_string())
            })
    }
}
