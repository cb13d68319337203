//! Payment processor adapters.

pub mod stripe_gateway;

pub use stripe_gateway::{GatewayConfig, StripeGateway};
