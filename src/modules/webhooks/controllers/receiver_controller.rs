use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::core::AppError;
use crate::modules::webhooks::models::{WebhookEvent, WebhookSource};
use crate::modules::webhooks::repositories::WebhookEventRepository;

/// Accept a raw third-party webhook and forward it onto the durable queue.
/// POST /webhook/{source}
///
/// No inline processing: the payload and headers are captured byte-exact
/// for the asynchronous consumer, which performs its own verification.
pub async fn receive_webhook(
    repo: web::Data<Arc<WebhookEventRepository>>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let source = WebhookSource::from_str(&path.into_inner())?;

    let payload = String::from_utf8(body.to_vec())
        .map_err(|_| AppError::validation("Webhook body is not valid UTF-8"))?;

    let headers = capture_headers(&req);
    let event = WebhookEvent::new(source, headers, payload);

    repo.enqueue(&event).await?;

    info!(
        source = %source,
        event_id = %event.id,
        bytes = event.payload.len(),
        "Webhook enqueued"
    );

    Ok(HttpResponse::Ok().json(json!({ "queued": event.id })))
}

/// Capture request headers as a JSON object, skipping values that are not
/// valid UTF-8.
fn capture_headers(req: &HttpRequest) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            map.insert(name.as_str().to_string(), json!(v));
        }
    }
    serde_json::Value::Object(map)
}

/// Configure webhook receiver routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook").route("/{source}", web::post().to(receive_webhook)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_capture_headers_keeps_signature_headers() {
        let req = TestRequest::default()
            .insert_header(("stripe-signature", "t=1,v1=abc"))
            .insert_header(("content-type", "application/json"))
            .to_http_request();

        let headers = capture_headers(&req);
        assert_eq!(headers["stripe-signature"], "t=1,v1=abc");
        assert_eq!(headers["content-type"], "application/json");
    }
}
