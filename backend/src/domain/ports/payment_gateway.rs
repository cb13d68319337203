//! Port for the external payment processor.
//!
//! The core consumes exactly one operation: creating a payment intent. The
//! processor's internals are not modelled; failures surface as opaque,
//! retryable errors and never touch ledger or coordinator state.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

/// Errors raised by payment gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentGatewayError {
    /// The processor could not be reached.
    #[error("payment gateway request failed: {message}")]
    Request { message: String },
    /// The processor rejected the request.
    #[error("payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The processor's response could not be decoded.
    #[error("payment gateway response could not be decoded: {message}")]
    Decode { message: String },
}

impl PaymentGatewayError {
    /// Create a request error with the given message.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Create a rejection error with the given status and message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Intent handle returned by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Processor-side intent identifier; becomes the payment reference.
    pub id: String,
    /// Secret the client uses to confirm the payment.
    pub client_secret: String,
}

/// Port for creating payment intents ahead of a purchase.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for the given amount and currency.
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentGatewayError>;
}

/// Fixture implementation returning a deterministic intent.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_payment_intent(
        &self,
        _amount: Decimal,
        _currency: &str,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        Ok(PaymentIntent {
            id: "pi_fixture".to_owned(),
            client_secret: "pi_fixture_secret".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[tokio::test]
    async fn fixture_returns_deterministic_intent() {
        let gateway = FixturePaymentGateway;
        let intent = gateway
            .create_payment_intent(Decimal::new(4999, 2), "usd")
            .await
            .expect("fixture intent succeeds");
        assert_eq!(intent.id, "pi_fixture");
    }

    #[test]
    fn rejection_error_carries_status() {
        let err = PaymentGatewayError::rejected(402, "card declined");
        assert!(err.to_string().contains("402"));
        assert!(err.to_string().contains("card declined"));
    }
}
