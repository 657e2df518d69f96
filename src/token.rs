//! Session credentials: HS256-signed JWTs carrying the caller's identity.
//!
//! A token is `header.payload.signature`, each part URL-safe base64 without
//! padding. The signature is HMAC-SHA256 over `header.payload`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Missing authorization token")]
    Missing,
    /// Not a three-part token, or the claims lack an email.
    #[error("Invalid token claims")]
    Malformed,
    #[error("Invalid token")]
    InvalidCredential,
    #[error("Token expired")]
    Expired,
}

/// Claims embedded in every session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Issues and validates session credentials.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    /// Signer with the default 24 hour lifetime.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(24),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Credential for `user`, expiring one lifetime from now.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.sign(&Claims {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            exp: (Utc::now() + self.ttl).timestamp(),
        })
    }

    /// Encode and sign an arbitrary claim set.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let header_part = encode_part(&header)?;
        let payload_part = encode_part(claims)?;
        let signing_input = format!("{}.{}", header_part, payload_part);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, sig_part))
    }

    /// Verify the signature and expiry of `token` and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// As [`TokenSigner::validate`], with `now` in Unix seconds.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header_part, payload_part, sig_part] = parts.as_slice() else {
            return Err(TokenError::Malformed);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| TokenError::InvalidCredential)?;
        let mut mac = self.mac()?;
        mac.update(header_part.as_bytes());
        mac.update(b".");
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidCredential)?;

        let header: Header = decode_part(header_part)?;
        if header.alg != "HS256" {
            return Err(TokenError::InvalidCredential);
        }

        let claims: Claims = decode_part(payload_part)?;
        if claims.email.is_empty() {
            return Err(TokenError::Malformed);
        }
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::InvalidCredential)
    }
}

fn encode_part<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let bytes = serde_json::to_vec(value).map_err(|_| TokenError::Malformed)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_part<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Pull the credential out of an `Authorization` header value.
///
/// The `Bearer ` prefix is optional; without it the whole value is the token.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, TokenError> {
    let value = header.map(str::trim).unwrap_or_default();
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}
