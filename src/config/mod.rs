use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub booking: BookingConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    pub vnpay: VnpayConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// Business-window and sweep tunables for the booking lifecycle
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// First bookable hour of the day (UTC)
    pub open_hour: u32,
    /// First non-bookable hour of the day (UTC)
    pub close_hour: u32,
    /// Hours after start time before a confirmed booking is swept to completed
    pub completion_grace_hours: i64,
    /// Reminder notifications fire for bookings starting within this window
    pub reminder_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VnpayConfig {
    /// Merchant terminal code issued by VNPay
    pub tmn_code: String,
    /// HMAC-SHA512 secret for signing/verifying the payment URL
    pub hash_secret: String,
    pub payment_url: String,
    pub return_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub calendar_id: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            booking: BookingConfig {
                open_hour: parse_env_or("BOOKING_OPEN_HOUR", 9)?,
                close_hour: parse_env_or("BOOKING_CLOSE_HOUR", 18)?,
                completion_grace_hours: parse_env_or("BOOKING_COMPLETION_GRACE_HOURS", 2)?,
                reminder_hours: parse_env_or("BOOKING_REMINDER_HOURS", 24)?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            stripe: StripeConfig {
                secret_key: env::var("STRIPE_SECRET_KEY")
                    .map_err(|_| AppError::Configuration("STRIPE_SECRET_KEY not set".to_string()))?,
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
                    AppError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
                })?,
                success_url: env::var("STRIPE_SUCCESS_URL")
                    .unwrap_or_else(|_| "https://trimly.app/booking/success".to_string()),
                cancel_url: env::var("STRIPE_CANCEL_URL")
                    .unwrap_or_else(|_| "https://trimly.app/booking/cancelled".to_string()),
                base_url: env::var("STRIPE_BASE_URL")
                    .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            },
            vnpay: VnpayConfig {
                tmn_code: env::var("VNPAY_TMN_CODE")
                    .map_err(|_| AppError::Configuration("VNPAY_TMN_CODE not set".to_string()))?,
                hash_secret: env::var("VNPAY_HASH_SECRET")
                    .map_err(|_| AppError::Configuration("VNPAY_HASH_SECRET not set".to_string()))?,
                payment_url: env::var("VNPAY_PAYMENT_URL").unwrap_or_else(|_| {
                    "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
                }),
                return_url: env::var("VNPAY_RETURN_URL")
                    .unwrap_or_else(|_| "https://trimly.app/payment/vnpay/return".to_string()),
            },
            google: GoogleConfig {
                client_id: env::var("GOOGLE_CLIENT_ID")
                    .map_err(|_| AppError::Configuration("GOOGLE_CLIENT_ID not set".to_string()))?,
                client_secret: env::var("GOOGLE_CLIENT_SECRET").map_err(|_| {
                    AppError::Configuration("GOOGLE_CLIENT_SECRET not set".to_string())
                })?,
                calendar_id: env::var("GOOGLE_CALENDAR_ID")
                    .unwrap_or_else(|_| "primary".to_string()),
                token_url: env::var("GOOGLE_TOKEN_URL")
                    .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
                api_base_url: env::var("GOOGLE_CALENDAR_API_URL")
                    .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.booking.open_hour >= self.booking.close_hour {
            return Err(AppError::Configuration(
                "Booking open hour must precede close hour".to_string(),
            ));
        }

        if self.booking.close_hour > 24 {
            return Err(AppError::Configuration(
                "Booking close hour must be within the day".to_string(),
            ));
        }

        if self.booking.completion_grace_hours < 0 || self.booking.reminder_hours <= 0 {
            return Err(AppError::Configuration(
                "Booking sweep windows must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}
