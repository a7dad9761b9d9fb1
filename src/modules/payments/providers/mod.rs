use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Config;
use crate::core::{AppError, Currency, Result};
use crate::modules::payments::models::PaymentMethod;

pub mod cash;
pub mod stripe;
pub mod vnpay;

pub use cash::CashProvider;
pub use stripe::StripeProvider;
pub use vnpay::VnpayProvider;

/// Payment creation request handed to a provider adapter
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub booking_id: i64,
    pub branch_id: i64,
    pub amount: Decimal,
    pub currency: Currency,
}

/// Provider-specific payment handle returned to the client.
///
/// Discriminated union: callers must not assume any common shape beyond
/// "opaque payload to hand back to the client".
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderCharge {
    Stripe {
        session_id: String,
        session_url: String,
    },
    Vnpay {
        payment_url: String,
    },
    Cash {
        message: String,
    },
}

impl ProviderCharge {
    /// Correlation value persisted onto the payment row, if the provider
    /// issued one.
    pub fn provider_ref(&self) -> Option<&str> {
        match self {
            ProviderCharge::Stripe { session_id, .. } => Some(session_id),
            ProviderCharge::Vnpay { payment_url } => Some(payment_url),
            ProviderCharge::Cash { .. } => None,
        }
    }
}

/// Inbound callback/webhook material, before verification.
///
/// Stripe delivers a signed raw body; VNPay delivers signed query
/// parameters. Adapters pick what they need and must fail closed when the
/// material they require is missing.
#[derive(Debug, Default)]
pub struct CallbackContext {
    /// Exact unparsed request body (byte fidelity matters for signatures)
    pub raw_body: Option<String>,
    /// Provider signature header value, when delivered via header
    pub signature: Option<String>,
    /// Query parameters, for redirect-style callbacks
    pub query: HashMap<String, String>,
}

/// How a verified callback correlates to internal records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackCorrelation {
    BookingId(i64),
}

/// Verified result of a provider callback, before any state is touched
#[derive(Debug)]
pub enum CallbackOutcome {
    PaymentSucceeded {
        correlation: CallbackCorrelation,
        /// Updated correlation id (e.g. Stripe payment-intent), if any
        provider_ref: Option<String>,
    },
    PaymentFailed {
        correlation: CallbackCorrelation,
        code: String,
    },
    /// Event verified but deliberately not acted upon
    Ignored {
        event: String,
    },
}

/// Uniform contract over the payment backends.
///
/// `create_payment` is mandatory. Callback handling and refunds are
/// optional capabilities; the default implementations surface an explicit
/// unsupported-operation error rather than panicking.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a provider-specific payment for a booking
    async fn create_payment(&self, request: &ChargeRequest) -> Result<ProviderCharge>;

    /// Verify and interpret an inbound callback
    async fn handle_callback(&self, _ctx: &CallbackContext) -> Result<CallbackOutcome> {
        Err(AppError::unsupported(format!(
            "{} does not accept callbacks",
            self.method()
        )))
    }

    /// Refund a previously collected payment
    async fn refund(&self, _provider_ref: &str) -> Result<()> {
        Err(AppError::unsupported(format!(
            "{} does not support refunds",
            self.method()
        )))
    }

    /// Which method this adapter serves
    fn method(&self) -> PaymentMethod;
}

/// The closed set of provider adapters, selected by payment method at call
/// time. Construction wires every variant up front; there is no runtime
/// registration.
pub struct ProviderSet {
    stripe: StripeProvider,
    vnpay: VnpayProvider,
    cash: CashProvider,
}

impl ProviderSet {
    pub fn new(stripe: StripeProvider, vnpay: VnpayProvider, cash: CashProvider) -> Self {
        Self {
            stripe,
            vnpay,
            cash,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StripeProvider::new(&config.stripe),
            VnpayProvider::new(&config.vnpay),
            CashProvider::new(),
        )
    }

    pub fn get(&self, method: PaymentMethod) -> &dyn PaymentProvider {
        match method {
            PaymentMethod::Stripe => &self.stripe,
            PaymentMethod::Vnpay => &self.vnpay,
            PaymentMethod::Cash => &self.cash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_charge_correlation() {
        let stripe = ProviderCharge::Stripe {
            session_id: "cs_test_123".to_string(),
            session_url: "https://checkout.stripe.com/pay/cs_test_123".to_string(),
        };
        assert_eq!(stripe.provider_ref(), Some("cs_test_123"));

        let cash = ProviderCharge::Cash {
            message: "collect at salon".to_string(),
        };
        assert_eq!(cash.provider_ref(), None);
    }

    #[test]
    fn test_provider_charge_serializes_tagged() {
        let vnpay = ProviderCharge::Vnpay {
            payment_url: "https://sandbox.vnpayment.vn/pay?x=1".to_string(),
        };
        let json = serde_json::to_value(&vnpay).unwrap();
        assert_eq!(json["provider"], "vnpay");
        assert!(json["payment_url"].as_str().unwrap().contains("vnpayment"));
    }

    #[tokio::test]
    async fn test_callback_defaults_to_unsupported() {
        let cash = CashProvider::new();
        let err = cash
            .handle_callback(&CallbackContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported"));

        let err = cash.refund("ref").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }
}
