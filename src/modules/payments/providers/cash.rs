use async_trait::async_trait;

use super::{ChargeRequest, PaymentProvider, ProviderCharge};
use crate::core::Result;
use crate::modules::payments::models::PaymentMethod;

/// Cash payment provider
///
/// No external backend: in-person payment is confirmed by staff at the
/// salon. Exists so the orchestrator's contract stays uniform across
/// methods; callbacks and refunds are unsupported.
pub struct CashProvider;

impl CashProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CashProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for CashProvider {
    async fn create_payment(&self, request: &ChargeRequest) -> Result<ProviderCharge> {
        Ok(ProviderCharge::Cash {
            message: format!(
                "Booking {} reserved; payment of {} due at the salon",
                request.booking_id,
                request.currency.format_amount(request.amount)
            ),
        })
    }

    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Currency;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_cash_confirmation_message() {
        let provider = CashProvider::new();
        let charge = provider
            .create_payment(&ChargeRequest {
                booking_id: 9,
                branch_id: 1,
                amount: dec!(80000),
                currency: Currency::VND,
            })
            .await
            .unwrap();

        match charge {
            ProviderCharge::Cash { message } => {
                assert!(message.contains("Booking 9"));
                assert!(message.contains("VND 80000"));
            }
            other => panic!("unexpected charge: {:?}", other),
        }
    }
}
