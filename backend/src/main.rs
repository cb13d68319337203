//! Melody backend entry-point: wires REST endpoints and their adapters.

mod server;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::web;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;
use zeroize::Zeroize;

use melody_backend::domain::TokenVerifier;
use melody_backend::inbound::http::health::HealthState;
use melody_backend::outbound::payments::{GatewayConfig, StripeGateway};
use melody_backend::outbound::persistence::{DbPool, PoolConfig};

use server::ServerConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_KEY_PATH: &str = "/var/run/secrets/token_key";
const DEFAULT_PAYMENT_API_BASE: &str = "https://api.stripe.com/";

/// Load the token signing secret, wiping the raw bytes after derivation.
///
/// Logs a SHA-256 fingerprint (first 8 bytes, hex) for rotation audits;
/// never the key itself. Outside debug builds an ephemeral key requires the
/// explicit `TOKEN_ALLOW_EPHEMERAL=1` opt-in.
fn load_verifier() -> std::io::Result<TokenVerifier> {
    let key_path = env::var("TOKEN_KEY_FILE").unwrap_or_else(|_| DEFAULT_KEY_PATH.into());
    let mut key_bytes = match std::fs::read(&key_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let allow_dev = env::var("TOKEN_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using ephemeral token key (dev only)");
                uuid::Uuid::new_v4().as_bytes().to_vec()
            } else {
                return Err(std::io::Error::other(format!(
                    "failed to read token key at {key_path}: {e}"
                )));
            }
        }
    };

    let digest = Sha256::digest(&key_bytes);
    let fingerprint = hex::encode(digest.iter().take(8).copied().collect::<Vec<u8>>());
    info!(%fingerprint, "token signing key loaded");

    let verifier = TokenVerifier::new(&key_bytes);
    key_bytes.zeroize();
    Ok(verifier)
}

async fn build_db_pool() -> std::io::Result<Option<DbPool>> {
    let Ok(database_url) = env::var("DATABASE_URL") else {
        warn!("DATABASE_URL not set; serving with fixture adapters");
        return Ok(None);
    };
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;
    Ok(Some(pool))
}

fn build_gateway() -> std::io::Result<Option<Arc<StripeGateway>>> {
    let Ok(secret_key) = env::var("PAYMENT_SECRET_KEY") else {
        warn!("PAYMENT_SECRET_KEY not set; serving with the fixture payment gateway");
        return Ok(None);
    };
    let base = env::var("PAYMENT_API_BASE").unwrap_or_else(|_| DEFAULT_PAYMENT_API_BASE.into());
    let base_url = Url::parse(&base)
        .map_err(|err| std::io::Error::other(format!("PAYMENT_API_BASE: {err}")))?;
    let gateway = StripeGateway::new(GatewayConfig::new(base_url, secret_key))
        .map_err(|err| std::io::Error::other(format!("payment gateway: {err}")))?;
    Ok(Some(Arc::new(gateway)))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
        .parse()
        .map_err(|err| std::io::Error::other(format!("BIND_ADDR: {err}")))?;

    let verifier = load_verifier()?;
    let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".into());

    let mut config = ServerConfig::new(verifier, bind_addr).with_currency(currency);
    if let Some(pool) = build_db_pool().await? {
        config = config.with_db_pool(pool);
    }
    if let Some(gateway) = build_gateway()? {
        config = config.with_gateway(gateway);
    }

    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness probe stays reachable.
    let server_health_state = health_state.clone();
    let server = server::run(config, server_health_state)?;

    info!(%bind_addr, "melody backend listening");
    health_state.mark_ready();
    server.await
}
