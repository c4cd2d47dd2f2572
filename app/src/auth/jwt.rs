//! HS256 session tokens.

use super::AuthError;
use crate::types::{Role, User, UserId};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: UserId,
    /// Role at issue time; the extractor re-reads the stored role
    pub role: Role,
    /// Issued at (seconds since the epoch)
    pub iat: i64,
    /// Expiry (seconds since the epoch)
    pub exp: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a service signing with `secret`.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Lifetime of issued tokens, also used for the cookie `Max-Age`.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user`, valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if encoding fails.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: now.timestamp().saturating_add(ttl),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for tampered, malformed or
    /// expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}
