//! Bearer credential signing and verification.
//!
//! Credentials are HS256-signed tokens carrying only the subject identifier
//! and their validity window. Verification is pure and local; nothing beyond
//! the embedded subject is trusted from client input downstream. There is no
//! refresh mechanism: expiry forces re-authentication.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::{Error, SubjectId};

/// Fixed credential lifetime in seconds (one hour).
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Signed claim set embedded in issued credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues and verifies bearer credentials against a server-held secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from the raw signing secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; skew is handled by re-issuing, not leeway.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a credential for the subject with the fixed lifetime.
    pub fn issue(&self, subject: &SubjectId) -> Result<String, Error> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.as_ref().to_owned(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| Error::internal(format!("failed to sign credential: {err}")))
    }

    /// Verify a credential and extract the embedded subject.
    ///
    /// Any cryptographic or expiry failure maps to the same rejection so the
    /// response does not reveal which check failed.
    pub fn verify(&self, token: &str) -> Result<SubjectId, Error> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "credential verification failed");
            invalid_credential()
        })?;
        SubjectId::new(&data.claims.sub).map_err(|err| {
            debug!(error = %err, "verified credential carries malformed subject");
            invalid_credential()
        })
    }
}

fn invalid_credential() -> Error {
    Error::unauthorized("credential is invalid or expired")
        .with_details(json!({ "code": "invalid_credential" }))
}
