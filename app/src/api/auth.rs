//! Registration, login and session endpoints.
//!
//! - POST /api/auth/register - Create an account and start a session
//! - POST /api/auth/login - Start a session
//! - POST /api/auth/logout - End the session
//! - GET /api/auth/me - Current user

use super::MessageResponse;
use crate::auth::{SessionUser, password};
use crate::error::RepositoryError;
use crate::notifications::{self, templates};
use crate::server::state::AppState;
use crate::types::{User, UserId};
use crate::validation::{LoginRequest, RegisterRequest};
use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use eventure_core::environment::Clock;
use eventure_web::{AppError, JsonBody};
use serde::Serialize;

/// A user together with the token that was set as the session cookie.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The signed-in user
    #[serde(flatten)]
    pub user: User,
    /// Same value as the cookie, for `Authorization: Bearer` clients
    pub token: String,
}

fn start_session(state: &AppState, user: &User) -> Result<(HeaderValue, String), AppError> {
    let token = state.tokens.issue(user, state.clock.now())?;
    let cookie = state
        .session_cookie
        .issue(&token, state.tokens.ttl())
        .ok_or_else(|| AppError::internal("Failed to build session cookie"))?;
    Ok((cookie, token))
}

/// Register a new account.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/auth/register \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ada Lovelace", "email": "ada@campus.edu", "password": "engine"}'
/// ```
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_user = request.parse()?;

    if state.repos.users.find_by_email(&new_user.email).await?.is_some() {
        return Err(AppError::bad_request("User already exists"));
    }

    let password_hash = password::hash_password_blocking(new_user.password).await?;
    let user = User {
        id: UserId::new(),
        name: new_user.name,
        email: new_user.email,
        password_hash,
        role: new_user.role,
        phone_number: new_user.phone_number,
        created_at: state.clock.now(),
    };

    // Two registrations racing for the same email both pass the lookup.
    let user = state.repos.users.create(user).await.map_err(|error| match error {
        RepositoryError::Conflict(_) => AppError::bad_request("User already exists"),
        other => other.into(),
    })?;
    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    notifications::deliver_all_in_background(
        state.mailer.clone(),
        vec![templates::welcome(&user)],
    );

    let (cookie, token) = start_session(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { user, token }),
    ))
}

/// Log in with email and password.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = request.parse()?;
    let invalid = || AppError::unauthorized("Invalid email or password");

    let user = state
        .repos
        .users
        .find_by_email(&credentials.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password_blocking(credentials.password, user.password_hash.clone()).await {
        tracing::debug!(user_id = %user.id, "Wrong password");
        return Err(invalid());
    }

    let (cookie, token) = start_session(&state, &user)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(SessionResponse { user, token })))
}

/// Clear the session cookie.
pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cookie = state
        .session_cookie
        .clear()
        .ok_or_else(|| AppError::internal("Failed to build session cookie"))?;
    Ok(([(header::SET_COOKIE, cookie)], Json(MessageResponse::new("Logged out successfully"))))
}

/// The authenticated user.
pub async fn me(session: SessionUser) -> Json<User> {
    Json(session.user)
}
