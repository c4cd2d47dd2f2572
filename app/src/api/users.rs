//! User administration.
//!
//! - GET /api/users - List users (admin)
//! - DELETE /api/users/:id - Delete a user and their RSVPs and memberships (admin)

use super::{MessageResponse, parse_id};
use crate::aggregates::rsvp::RsvpAction;
use crate::auth::RequireAdmin;
use crate::server::state::AppState;
use crate::types::{User, UserId};
use axum::{
    Json,
    extract::{Path, State},
};
use eventure_web::AppError;

/// Every registered user.
pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.repos.users.list().await?))
}

/// Delete a user.
///
/// The user's RSVPs go with them, so every cached seat ledger is dropped.
#[tracing::instrument(skip(admin, state))]
pub async fn delete_user(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id: UserId = parse_id("User", &id)?;
    state.repos.users.delete(user_id).await?;
    state.admission.send(RsvpAction::LedgersInvalidated).await?;

    tracing::info!(%user_id, admin_id = %admin.0.user.id, "User deleted");
    Ok(Json(MessageResponse::new("User removed")))
}
