//! Session token issuance and verification.
//!
//! Tokens are stateless HS256 JWTs carrying the user id as subject plus
//! `role` and `email` claims. Signing keys are injected configuration;
//! verification also accepts previously-rotated keys so outstanding tokens
//! stay valid across a rotation window.

use base64::{engine::general_purpose::STANDARD, Engine};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::super::storage::{UserRecord, UserRole};

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Signing keys must decode to a 256-bit HMAC secret.
const KEY_LENGTH: usize = 32;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    /// User id, stringified per RFC 7519 `sub`.
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    #[must_use]
    pub fn for_user(user: &UserRecord, issued_at: u64, ttl_days: u64) -> Self {
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at + ttl_days * SECONDS_PER_DAY,
        }
    }

    /// Parse the subject back into a user id.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Error)]
pub enum TokenKeyError {
    #[error("signing key is not valid base64")]
    InvalidEncoding,
    #[error("signing key must decode to {KEY_LENGTH} bytes, got {0}")]
    WrongLength(usize),
}

/// Current signing key plus previously-rotated verification keys.
///
/// Tokens are always signed with the current key; verification walks the
/// full set so a rotation does not invalidate outstanding sessions.
pub struct TokenKeys {
    current: SecretBox<Vec<u8>>,
    previous: Vec<SecretBox<Vec<u8>>>,
}

impl TokenKeys {
    /// Build from base64-encoded key material.
    ///
    /// # Errors
    ///
    /// Returns an error when any key is not base64 or does not decode to
    /// exactly 256 bits.
    pub fn from_base64(current: &str, previous: &[&str]) -> Result<Self, TokenKeyError> {
        let current = decode_key(current)?;
        let previous = previous
            .iter()
            .map(|key| decode_key(key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { current, previous })
    }

    /// Sign a claim set with the current key.
    ///
    /// # Errors
    ///
    /// Returns an error if claim serialization fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.current.expose_secret()),
        )
    }

    /// Verify a token against the current key, then each previous key.
    ///
    /// # Errors
    ///
    /// Returns the last decode error when no key verifies the token.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiration is exact; no clock-skew leeway.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let mut last_error = None;
        for key in std::iter::once(&self.current).chain(self.previous.iter()) {
            match decode::<Claims>(
                token,
                &DecodingKey::from_secret(key.expose_secret()),
                &validation,
            ) {
                Ok(data) => return Ok(data.claims),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| jsonwebtoken::errors::ErrorKind::InvalidToken.into()))
    }
}

/// Seconds since the Unix epoch, shared with claim construction.
#[must_use]
pub fn now_unix() -> u64 {
    get_current_timestamp()
}

fn decode_key(encoded: &str) -> Result<SecretBox<Vec<u8>>, TokenKeyError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| TokenKeyError::InvalidEncoding)?;
    if bytes.len() != KEY_LENGTH {
        return Err(TokenKeyError::WrongLength(bytes.len()));
    }
    Ok(SecretBox::new(Box::new(bytes)))
}
