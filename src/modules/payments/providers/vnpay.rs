use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sha2::Sha512;
use tracing::warn;

use super::{
    CallbackContext, CallbackCorrelation, CallbackOutcome, ChargeRequest, PaymentProvider,
    ProviderCharge,
};
use crate::config::VnpayConfig;
use crate::core::{AppError, Result};
use crate::modules::payments::models::PaymentMethod;

type HmacSha512 = Hmac<Sha512>;

/// Query fields excluded from signature computation
const SIGNATURE_FIELDS: [&str; 2] = ["vnp_SecureHash", "vnp_SecureHashType"];

/// The only response code VNPay documents as success
const RESPONSE_CODE_SUCCESS: &str = "00";

/// VNPay payment provider
///
/// Builds a redirect URL whose query parameters are deterministically
/// ordered and signed with HMAC-SHA512. Callback verification recomputes
/// the same hash over the returned parameters (signature fields excluded)
/// and requires exact equality before trusting any other field.
pub struct VnpayProvider {
    tmn_code: String,
    hash_secret: String,
    payment_url: String,
    return_url: String,
}

impl VnpayProvider {
    pub fn new(config: &VnpayConfig) -> Self {
        Self {
            tmn_code: config.tmn_code.clone(),
            hash_secret: config.hash_secret.clone(),
            payment_url: config.payment_url.clone(),
            return_url: config.return_url.clone(),
        }
    }

    /// Encode `params` in ascending key order and sign the encoded string.
    /// Returns (encoded_query, hex_signature).
    fn sign_params(&self, params: &BTreeMap<String, String>) -> Result<(String, String)> {
        // BTreeMap iteration is already sorted; the encoding must match the
        // query encoding byte for byte or verification breaks.
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let encoded = serde_urlencoded::to_string(&pairs)
            .map_err(|e| AppError::internal(format!("Failed to encode VNPay params: {}", e)))?;

        let mut mac = HmacSha512::new_from_slice(self.hash_secret.as_bytes())
            .map_err(|_| AppError::internal("Invalid VNPay hash secret for HMAC"))?;
        mac.update(encoded.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok((encoded, signature))
    }
}

#[async_trait]
impl PaymentProvider for VnpayProvider {
    async fn create_payment(&self, request: &ChargeRequest) -> Result<ProviderCharge> {
        // VNPay expects the amount multiplied by 100, with no separator
        let amount = (request.amount * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| {
                AppError::validation(format!("Amount out of range: {}", request.amount))
            })?;

        let mut params = BTreeMap::new();
        params.insert("vnp_Version".to_string(), "2.1.0".to_string());
        params.insert("vnp_Command".to_string(), "pay".to_string());
        params.insert("vnp_TmnCode".to_string(), self.tmn_code.clone());
        params.insert("vnp_Amount".to_string(), amount.to_string());
        params.insert("vnp_CurrCode".to_string(), "VND".to_string());
        params.insert("vnp_TxnRef".to_string(), request.booking_id.to_string());
        params.insert(
            "vnp_OrderInfo".to_string(),
            format!("Salon booking {}", request.booking_id),
        );
        params.insert("vnp_OrderType".to_string(), "other".to_string());
        params.insert("vnp_Locale".to_string(), "vn".to_string());
        params.insert("vnp_ReturnUrl".to_string(), self.return_url.clone());
        params.insert("vnp_IpAddr".to_string(), "127.0.0.1".to_string());
        params.insert(
            "vnp_CreateDate".to_string(),
            Utc::now().format("%Y%m%d%H%M%S").to_string(),
        );

        let (encoded, signature) = self.sign_params(&params)?;

        Ok(ProviderCharge::Vnpay {
            payment_url: format!(
                "{}?{}&vnp_SecureHash={}",
                self.payment_url, encoded, signature
            ),
        })
    }

    async fn handle_callback(&self, ctx: &CallbackContext) -> Result<CallbackOutcome> {
        let received_hash = ctx
            .query
            .get("vnp_SecureHash")
            .ok_or_else(|| AppError::validation("Missing vnp_SecureHash parameter"))?
            .to_lowercase();

        // Recompute over every returned parameter except the signature
        // fields themselves; nothing else is read until this passes.
        let mut params: BTreeMap<String, String> = ctx
            .query
            .iter()
            .filter(|(k, _)| !SIGNATURE_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let (_, expected) = self.sign_params(&params)?;

        if !constant_time_eq(expected.as_bytes(), received_hash.as_bytes()) {
            warn!("VNPay callback signature mismatch");
            return Err(AppError::SignatureVerification(
                "VNPay secure hash mismatch".to_string(),
            ));
        }

        let booking_id: i64 = params
            .remove("vnp_TxnRef")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| AppError::validation("Missing or invalid vnp_TxnRef"))?;

        let response_code = params
            .remove("vnp_ResponseCode")
            .ok_or_else(|| AppError::validation("Missing vnp_ResponseCode"))?;

        if response_code == RESPONSE_CODE_SUCCESS {
            Ok(CallbackOutcome::PaymentSucceeded {
                correlation: CallbackCorrelation::BookingId(booking_id),
                provider_ref: params.remove("vnp_TransactionNo"),
            })
        } else {
            Ok(CallbackOutcome::PaymentFailed {
                correlation: CallbackCorrelation::BookingId(booking_id),
                code: response_code,
            })
        }
    }

    fn method(&self) -> PaymentMethod {
        PaymentMethod::Vnpay
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Currency;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn provider() -> VnpayProvider {
        VnpayProvider::new(&VnpayConfig {
            tmn_code: "TRIMLY01".to_string(),
            hash_secret: "vnpaysecret".to_string(),
            payment_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            return_url: "https://trimly.app/payment/vnpay/return".to_string(),
        })
    }

    fn signed_callback_query(provider: &VnpayProvider, response_code: &str) -> HashMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("vnp_TxnRef".to_string(), "42".to_string());
        params.insert("vnp_ResponseCode".to_string(), response_code.to_string());
        params.insert("vnp_Amount".to_string(), "15000000".to_string());
        params.insert("vnp_TransactionNo".to_string(), "14012345".to_string());
        params.insert("vnp_TmnCode".to_string(), "TRIMLY01".to_string());

        let (_, signature) = provider.sign_params(&params).unwrap();

        let mut query: HashMap<String, String> = params.into_iter().collect();
        query.insert("vnp_SecureHash".to_string(), signature);
        query.insert("vnp_SecureHashType".to_string(), "HMACSHA512".to_string());
        query
    }

    #[tokio::test]
    async fn test_payment_url_is_signed_and_ordered() {
        let provider = provider();
        let request = ChargeRequest {
            booking_id: 42,
            branch_id: 1,
            amount: dec!(150000),
            currency: Currency::VND,
        };

        let charge = provider.create_payment(&request).await.unwrap();
        let url = match charge {
            ProviderCharge::Vnpay { payment_url } => payment_url,
            other => panic!("unexpected charge: {:?}", other),
        };

        assert!(url.contains("vnp_Amount=15000000"));
        assert!(url.contains("vnp_TxnRef=42"));
        assert!(url.contains("vnp_SecureHash="));
        // Deterministic ordering: vnp_Amount sorts before vnp_Command
        let amount_pos = url.find("vnp_Amount").unwrap();
        let command_pos = url.find("vnp_Command").unwrap();
        assert!(amount_pos < command_pos);
    }

    #[tokio::test]
    async fn test_callback_success_code() {
        let provider = provider();
        let ctx = CallbackContext {
            query: signed_callback_query(&provider, "00"),
            ..Default::default()
        };

        match provider.handle_callback(&ctx).await.unwrap() {
            CallbackOutcome::PaymentSucceeded {
                correlation,
                provider_ref,
            } => {
                assert_eq!(correlation, CallbackCorrelation::BookingId(42));
                assert_eq!(provider_ref.as_deref(), Some("14012345"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callback_failure_code() {
        let provider = provider();
        let ctx = CallbackContext {
            query: signed_callback_query(&provider, "24"),
            ..Default::default()
        };

        match provider.handle_callback(&ctx).await.unwrap() {
            CallbackOutcome::PaymentFailed { code, .. } => assert_eq!(code, "24"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tampered_signature_is_rejected_before_state_reads() {
        let provider = provider();
        let mut query = signed_callback_query(&provider, "00");
        query.insert("vnp_Amount".to_string(), "99".to_string());

        let err = provider
            .handle_callback(&CallbackContext {
                query,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SignatureVerification(_)));
    }

    #[tokio::test]
    async fn test_missing_hash_is_rejected() {
        let provider = provider();
        let mut query = signed_callback_query(&provider, "00");
        query.remove("vnp_SecureHash");

        let err = provider
            .handle_callback(&CallbackContext {
                query,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
