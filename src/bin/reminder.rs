//! Cron/reminder service.
//!
//! Runs the scheduled sweeps on an interval: completing past confirmed
//! bookings, cancelling stale pending ones, and queueing reminder
//! notifications. The trigger is a plain timer; all domain logic lives in
//! the booking service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trimly::config::Config;
use trimly::core::RetryPolicy;
use trimly::modules::bookings::repositories::{BookingRepository, ExternalSessionRepository};
use trimly::modules::bookings::services::BookingService;
use trimly::modules::calendar::repositories::CredentialRepository;
use trimly::modules::calendar::services::{CalendarSyncService, GoogleCalendarClient};
use trimly::modules::notifications::repositories::NotificationRepository;
use trimly::modules::notifications::services::NotificationService;
use trimly::modules::payments::providers::ProviderSet;
use trimly::modules::payments::repositories::PaymentRepository;
use trimly::modules::payments::services::PaymentService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trimly=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    let interval_secs: u64 = std::env::var("REMINDER_INTERVAL_SECS")
        .unwrap_or_else(|_| "300".to_string())
        .parse()
        .expect("Invalid REMINDER_INTERVAL_SECS");

    tracing::info!(
        interval_secs = interval_secs,
        "Starting Trimly reminder service"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    let booking_repo = Arc::new(BookingRepository::new(db_pool.clone()));
    let payment_repo = Arc::new(PaymentRepository::new(db_pool.clone()));
    let credential_repo = Arc::new(CredentialRepository::new(db_pool.clone()));

    let providers = Arc::new(ProviderSet::from_config(&config));
    let notifications = Arc::new(NotificationService::new(NotificationRepository::new(
        db_pool.clone(),
    )));
    let payment_service = Arc::new(PaymentService::new(
        payment_repo.clone(),
        booking_repo.clone(),
        providers,
        RetryPolicy::default(),
    ));
    let calendar_sync = Arc::new(CalendarSyncService::new(
        GoogleCalendarClient::new(config.google.clone(), credential_repo),
        ExternalSessionRepository::new(db_pool.clone()),
    ));
    let booking_service = BookingService::new(
        booking_repo,
        payment_repo,
        payment_service,
        calendar_sync,
        notifications,
        config.booking.clone(),
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;
        let now = Utc::now();

        match booking_service.sweep_completions(now).await {
            Ok(count) if count > 0 => tracing::info!(count = count, "Completed past bookings"),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Completion sweep failed"),
        }

        match booking_service.sweep_stale_pending(now).await {
            Ok(count) if count > 0 => tracing::info!(count = count, "Cancelled stale bookings"),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Stale-pending sweep failed"),
        }

        match booking_service.sweep_reminders(now).await {
            Ok(count) if count > 0 => tracing::info!(count = count, "Queued reminders"),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Reminder sweep failed"),
        }
    }
}
