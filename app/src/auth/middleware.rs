//! Authentication extractors.
//!
//! ```rust,ignore
//! async fn my_rsvps(session: SessionUser) -> Result<Json<Vec<Rsvp>>, AppError> { .. }
//! async fn create_event(RequireAdmin(admin): RequireAdmin) -> Result<..> { .. }
//! ```

use super::{AuthError, SESSION_COOKIE};
use crate::server::state::AppState;
use crate::types::User;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use eventure_web::{AppError, read_cookie};

/// Token from the session cookie, or from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// The cookie wins when both are present.
    fn from_parts(parts: &Parts) -> Option<Self> {
        if let Some(token) = read_cookie(&parts.headers, SESSION_COOKIE) {
            return Some(Self(token.to_string()));
        }

        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or_else(|| AuthError::MissingToken.into())
    }
}

/// Authenticated user.
///
/// Verifies the token and loads the user it names, so a deleted account
/// or a changed role takes effect immediately.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The authenticated user
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionToken(token) = SessionToken::from_request_parts(parts, state).await?;
        let claims = state.tokens.verify(&token).map_err(|error| {
            tracing::debug!(error = %error, "Rejected session token");
            error
        })?;

        let user = state
            .repos
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        Ok(Self { user })
    }
}

/// Authenticated admin; `403` for everyone else.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;
        if !session.user.role.is_admin() {
            tracing::debug!(user_id = %session.user.id, "Admin route refused");
            return Err(AuthError::AdminRequired.into());
        }
        Ok(Self(session))
    }
}
