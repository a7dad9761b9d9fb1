// Unit tests for VNPay callback signature verification.
//
// The secure hash is HMAC-SHA512 over the returned query parameters in
// ascending key order, with the signature fields themselves excluded.
// Verification must reject any mismatch before reading other fields, and
// response code "00" is the only code that reports success.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha2::Sha512;

use trimly::config::VnpayConfig;
use trimly::core::AppError;
use trimly::modules::payments::providers::{
    CallbackContext, CallbackOutcome, PaymentProvider, ProviderCharge, VnpayProvider,
};

const HASH_SECRET: &str = "test_vnpay_secret";

fn provider() -> VnpayProvider {
    VnpayProvider::new(&VnpayConfig {
        tmn_code: "TESTTMN1".to_string(),
        hash_secret: HASH_SECRET.to_string(),
        payment_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
        return_url: "https://example.com/return".to_string(),
    })
}

/// Compute the secure hash the same way the provider does: sorted keys,
/// urlencoded, HMAC-SHA512 in lowercase hex.
fn compute_hash(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<(&str, &str)> = params.to_vec();
    sorted.sort_by_key(|(k, _)| *k);

    let encoded = serde_urlencoded::to_string(&sorted).unwrap();
    let mut mac = Hmac::<Sha512>::new_from_slice(HASH_SECRET.as_bytes()).unwrap();
    mac.update(encoded.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn callback_query(response_code: &str) -> HashMap<String, String> {
    let params = [
        ("vnp_TmnCode", "TESTTMN1"),
        ("vnp_TxnRef", "42"),
        ("vnp_Amount", "1000"),
        ("vnp_ResponseCode", response_code),
        ("vnp_TransactionNo", "14100001"),
    ];

    let hash = compute_hash(&params);

    let mut query: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    query.insert("vnp_SecureHash".to_string(), hash);
    query.insert("vnp_SecureHashType".to_string(), "HMACSHA512".to_string());
    query
}

#[tokio::test]
async fn valid_signature_with_success_code_confirms() {
    let ctx = CallbackContext {
        query: callback_query("00"),
        ..Default::default()
    };

    match provider().handle_callback(&ctx).await.unwrap() {
        CallbackOutcome::PaymentSucceeded { provider_ref, .. } => {
            assert_eq!(provider_ref.as_deref(), Some("14100001"));
        }
        other => panic!("expected success outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn non_success_codes_report_failure() {
    for code in ["01", "07", "24", "99"] {
        let ctx = CallbackContext {
            query: callback_query(code),
            ..Default::default()
        };

        match provider().handle_callback(&ctx).await.unwrap() {
            CallbackOutcome::PaymentFailed { code: got, .. } => assert_eq!(got, code),
            other => panic!("expected failure outcome for code {}, got {:?}", code, other),
        }
    }
}

#[tokio::test]
async fn tampered_amount_invalidates_signature() {
    let mut query = callback_query("00");
    query.insert("vnp_Amount".to_string(), "999999".to_string());

    let err = provider()
        .handle_callback(&CallbackContext {
            query,
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SignatureVerification(_)));
}

#[tokio::test]
async fn forged_hash_is_rejected() {
    let mut query = callback_query("00");
    query.insert("vnp_SecureHash".to_string(), "ab".repeat(64));

    let err = provider()
        .handle_callback(&CallbackContext {
            query,
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SignatureVerification(_)));
}

#[tokio::test]
async fn hash_type_field_is_excluded_from_the_hash() {
    // The signature was computed without vnp_SecureHashType; its presence
    // in the query must not break verification.
    let mut query = callback_query("00");
    query.insert("vnp_SecureHashType".to_string(), "HMACSHA512".to_string());

    assert!(provider()
        .handle_callback(&CallbackContext {
            query,
            ..Default::default()
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn generated_payment_url_verifies_against_itself() {
    use rust_decimal_macros::dec;
    use trimly::core::Currency;
    use trimly::modules::payments::providers::ChargeRequest;

    let provider = provider();
    let charge = provider
        .create_payment(&ChargeRequest {
            booking_id: 7,
            branch_id: 1,
            amount: dec!(250000),
            currency: Currency::VND,
        })
        .await
        .unwrap();

    let url = match charge {
        ProviderCharge::Vnpay { payment_url } => payment_url,
        other => panic!("expected vnpay charge, got {:?}", other),
    };

    // Parse the URL back into a query map and feed it through callback
    // verification: the signature we emit must verify under our own rules.
    let query_string = url.split_once('?').unwrap().1;
    let query: HashMap<String, String> =
        serde_urlencoded::from_str(query_string).unwrap();

    // create/callback parameter sets differ; what matters is the signature
    // over exactly what was sent
    let err = provider
        .handle_callback(&CallbackContext {
            query: query.clone(),
            ..Default::default()
        })
        .await;

    // No vnp_ResponseCode in an outbound URL: verification passes and the
    // field check rejects afterwards, proving the hash matched.
    match err {
        Err(AppError::Validation(msg)) => assert!(msg.contains("vnp_ResponseCode")),
        other => panic!("expected missing-response-code validation, got {:?}", other),
    }
}
