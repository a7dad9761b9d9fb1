use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::core::AppError;
use crate::modules::payments::models::PaymentMethod;
use crate::modules::payments::providers::CallbackContext;
use crate::modules::payments::services::{CallbackReconciler, PaymentService};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: i64,
    pub amount: Decimal,
    pub branch_id: i64,
    pub method: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub booking_id: i64,
}

/// Create a provider-specific payment for a booking
/// POST /payment/create
pub async fn create_payment(
    service: web::Data<Arc<PaymentService>>,
    request: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let method = PaymentMethod::from_str(&request.method)?;

    let intent = service
        .create_payment_intent(request.booking_id, request.amount, request.branch_id, method)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "payment": intent.payment,
        "provider": intent.charge,
    })))
}

/// Refund a booking's payment (stripe, succeeded only)
/// POST /payment/refund
pub async fn refund_payment(
    service: web::Data<Arc<PaymentService>>,
    request: web::Json<RefundRequest>,
) -> Result<HttpResponse, AppError> {
    let payment = service.refund_payment(request.booking_id).await?;

    Ok(HttpResponse::Ok().json(payment))
}

/// Stripe webhook endpoint
/// POST /payment/stripe/webhook
///
/// Signature verification needs the exact unparsed body, so the payload is
/// taken as raw bytes rather than deserialized JSON.
pub async fn stripe_webhook(
    reconciler: web::Data<Arc<CallbackReconciler>>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    let raw_body = String::from_utf8(body.to_vec())
        .map_err(|_| AppError::validation("Webhook body is not valid UTF-8"))?;

    info!(bytes = raw_body.len(), "Received Stripe webhook");

    let ctx = CallbackContext {
        raw_body: Some(raw_body),
        signature,
        query: HashMap::new(),
    };

    let result = reconciler
        .handle_callback(PaymentMethod::Stripe, &ctx)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// VNPay return/IPN callback
/// GET /payment/vnpay/callback
pub async fn vnpay_callback(
    reconciler: web::Data<Arc<CallbackReconciler>>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    info!(params = query.len(), "Received VNPay callback");

    let ctx = CallbackContext {
        raw_body: None,
        signature: None,
        query: query.into_inner(),
    };

    let result = reconciler
        .handle_callback(PaymentMethod::Vnpay, &ctx)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .route("/create", web::post().to(create_payment))
            .route("/refund", web::post().to(refund_payment))
            .route("/stripe/webhook", web::post().to(stripe_webhook))
            .route("/vnpay/callback", web::get().to(vnpay_callback)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_parses_method_case_insensitively() {
        let req: CreatePaymentRequest = serde_json::from_str(
            r#"{"booking_id": 1, "amount": 10, "branch_id": 1, "method": "CASH"}"#,
        )
        .unwrap();
        assert_eq!(
            PaymentMethod::from_str(&req.method).unwrap(),
            PaymentMethod::Cash
        );
    }

    #[test]
    fn test_unknown_method_is_a_validation_error() {
        assert!(PaymentMethod::from_str("paypal").is_err());
    }
}
