//! Webhook receiver service.
//!
//! Accepts raw payloads from third-party providers (Stripe, VNPay,
//! Twilio, Google Calendar) and forwards them onto the durable queue
//! table for asynchronous processing. Nothing is interpreted inline.

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trimly::config::Config;
use trimly::middleware::RequestId;
use trimly::modules::webhooks::{self, WebhookEventRepository};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trimly=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    let port: u16 = std::env::var("WEBHOOK_RECEIVER_PORT")
        .unwrap_or_else(|_| "8081".to_string())
        .parse()
        .expect("Invalid WEBHOOK_RECEIVER_PORT");
    let bind_address = format!("{}:{}", config.server.host, port);

    tracing::info!("Starting Trimly webhook receiver");
    tracing::info!("Server binding to: {}", bind_address);

    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    let events = Arc::new(WebhookEventRepository::new(db_pool));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .app_data(web::Data::new(events.clone()))
            .configure(webhooks::controllers::configure)
            .route("/health", web::get().to(health_check))
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "trimly-webhook-receiver"
    }))
}
