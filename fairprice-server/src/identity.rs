//! Caller identity verification
//!
//! The identity provider signs bearer tokens; this service only checks the
//! signature and reads the subject. Roles are never taken from the token,
//! they come from the `users` table (see `api::auth`).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token verification errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid or expired token")]
    Invalid,

    #[error("Token creation failed")]
    Creation,
}

/// Claims read from an identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// External identity id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Resolves a bearer token to an external identity id
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<String, IdentityError>;
}

/// HS256 token verifier
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str, issuer: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss.as_str()]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
        }
    }

    /// Sign a token for `subject`, valid for `ttl`
    ///
    /// Used by tests and local tooling; production tokens come from the
    /// identity provider.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, IdentityError> {
        let now = Utc::now();
        let claims = IdentityClaims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| IdentityError::Creation)
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<String, IdentityError> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                ErrorKind::InvalidIssuer => IdentityError::InvalidIssuer,
                _ => IdentityError::Invalid,
            })?;

        if data.claims.sub.trim().is_empty() {
            return Err(IdentityError::Invalid);
        }
        Ok(data.claims.sub)
    }
}
