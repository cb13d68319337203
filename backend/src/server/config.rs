//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use melody_backend::domain::TokenVerifier;
use melody_backend::domain::ports::PaymentGateway;
use melody_backend::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) verifier: TokenVerifier,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) currency: String,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) gateway: Option<Arc<dyn PaymentGateway>>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration with the credential verifier.
    #[must_use]
    pub fn new(verifier: TokenVerifier, bind_addr: SocketAddr) -> Self {
        Self {
            verifier,
            bind_addr,
            currency: "usd".to_owned(),
            db_pool: None,
            gateway: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server uses database-backed implementations for
    /// every port; without it, fixture adapters serve local development.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach a payment gateway adapter.
    #[must_use]
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the ISO currency the marketplace charges in.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
