use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trimly::config::Config;
use trimly::core::RetryPolicy;
use trimly::middleware::RequestId;
use trimly::modules::bookings::repositories::{BookingRepository, ExternalSessionRepository};
use trimly::modules::bookings::services::BookingService;
use trimly::modules::calendar::repositories::CredentialRepository;
use trimly::modules::calendar::services::{CalendarSyncService, GoogleCalendarClient};
use trimly::modules::notifications::repositories::NotificationRepository;
use trimly::modules::notifications::services::NotificationService;
use trimly::modules::payments::providers::ProviderSet;
use trimly::modules::payments::repositories::PaymentRepository;
use trimly::modules::payments::services::{CallbackReconciler, PaymentService};
use trimly::modules::{bookings, payments};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trimly=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting Trimly Booking API");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Repositories
    let booking_repo = Arc::new(BookingRepository::new(db_pool.clone()));
    let payment_repo = Arc::new(PaymentRepository::new(db_pool.clone()));
    let credential_repo = Arc::new(CredentialRepository::new(db_pool.clone()));

    // Services
    let providers = Arc::new(ProviderSet::from_config(&config));
    let notifications = Arc::new(NotificationService::new(NotificationRepository::new(
        db_pool.clone(),
    )));
    let payment_service = Arc::new(PaymentService::new(
        payment_repo.clone(),
        booking_repo.clone(),
        providers.clone(),
        RetryPolicy::default(),
    ));
    let reconciler = Arc::new(CallbackReconciler::new(
        payment_repo.clone(),
        booking_repo.clone(),
        providers.clone(),
        notifications.clone(),
    ));
    let calendar_sync = Arc::new(CalendarSyncService::new(
        GoogleCalendarClient::new(config.google.clone(), credential_repo.clone()),
        ExternalSessionRepository::new(db_pool.clone()),
    ));
    let booking_service = Arc::new(BookingService::new(
        booking_repo.clone(),
        payment_repo.clone(),
        payment_service.clone(),
        calendar_sync,
        notifications.clone(),
        config.booking.clone(),
    ));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .wrap(Cors::permissive())
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(reconciler.clone()))
            .configure(bookings::controllers::configure)
            .configure(payments::controllers::configure)
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "trimly-booking-api"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "Trimly Salon Booking Platform",
        "version": "0.1.0",
        "status": "running"
    }))
}
