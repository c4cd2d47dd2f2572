//! Authentication for Eventure.
//!
//! Passwords are hashed with Argon2. A successful login issues an HS256 JWT,
//! set as the `token` cookie and also returned for clients that prefer the
//! `Authorization: Bearer` header. The [`middleware`] extractors accept
//! either.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use middleware::{RequireAdmin, SessionUser};

use eventure_web::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token on the request
    #[error("Not authorized, no token")]
    MissingToken,

    /// The token failed signature, shape or expiry checks
    #[error("Not authorized, token failed")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// The token names a user that no longer exists
    #[error("Not authorized, user not found")]
    UnknownUser,

    /// Authenticated, but not an admin
    #[error("Admin access required")]
    AdminRequired,

    /// Token signing failed
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Password hashing failed
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::UnknownUser => {
                Self::unauthorized(error.to_string())
            },
            AuthError::AdminRequired => Self::forbidden(error.to_string()),
            AuthError::Signing(_) | AuthError::Hashing(_) => {
                let message = error.to_string();
                Self::internal("Authentication failed").with_source(anyhow::anyhow!(message))
            },
        }
    }
}
