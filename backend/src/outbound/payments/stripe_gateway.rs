//! Stripe-backed `PaymentGateway` adapter.
//!
//! Consumes one processor operation: creating a payment intent. Amounts are
//! converted to integer minor units at the boundary; the rest of the system
//! keeps exact decimals. Failures surface as [`PaymentGatewayError`] and
//! never touch ledger or coordinator state.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::ports::{PaymentGateway, PaymentGatewayError, PaymentIntent};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Stripe adapter.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    base_url: Url,
    secret_key: String,
}

impl GatewayConfig {
    /// Create a configuration with the processor base URL and secret key.
    pub fn new(base_url: Url, secret_key: impl Into<String>) -> Self {
        Self {
            base_url,
            secret_key: secret_key.into(),
        }
    }
}

/// HTTP adapter for the processor's payment-intent endpoint.
#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl StripeGateway {
    /// Build the adapter with a bounded-timeout HTTP client.
    pub fn new(config: GatewayConfig) -> Result<Self, PaymentGatewayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| PaymentGatewayError::request(err.to_string()))?;
        Ok(Self { http, config })
    }
}

/// Convert an exact decimal amount into the processor's integer minor units.
///
/// Sub-cent amounts are rejected rather than silently rounded; a charge must
/// match the stated price exactly.
fn to_minor_units(amount: Decimal) -> Result<i64, PaymentGatewayError> {
    let minor = amount.checked_mul(Decimal::ONE_HUNDRED).ok_or_else(|| {
        PaymentGatewayError::request(format!("amount {amount} overflows minor units"))
    })?;
    if minor.fract() != Decimal::ZERO {
        return Err(PaymentGatewayError::request(format!(
            "amount {amount} does not convert to whole minor units"
        )));
    }
    minor.to_i64().ok_or_else(|| {
        PaymentGatewayError::request(format!("amount {amount} overflows minor units"))
    })
}

#[derive(Debug, Deserialize)]
struct IntentBody {
    id: String,
    client_secret: String,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        let minor_units = to_minor_units(amount)?;
        let url = self
            .config
            .base_url
            .join("v1/payment_intents")
            .map_err(|err| PaymentGatewayError::request(err.to_string()))?;

        debug!(%currency, minor_units, "creating payment intent");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.secret_key)
            .form(&[
                ("amount", minor_units.to_string()),
                ("currency", currency.to_owned()),
                ("payment_method_types[]", "card".to_owned()),
            ])
            .send()
            .await
            .map_err(|err| PaymentGatewayError::request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentGatewayError::rejected(status.as_u16(), body));
        }

        let intent: IntentBody = response
            .json()
            .await
            .map_err(|err| PaymentGatewayError::decode(err.to_string()))?;
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
