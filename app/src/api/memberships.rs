//! Club memberships.
//!
//! - POST /api/memberships - Join a club (admins may add anyone)
//! - GET /api/memberships - All memberships (admin) or the caller's own
//! - GET /api/memberships/:id - One membership (admin or the member)
//! - PUT /api/memberships/:id - Change the role (admin)
//! - DELETE /api/memberships/:id - Leave or remove (admin or the member)

use super::{MessageResponse, parse_id};
use crate::auth::{RequireAdmin, SessionUser};
use crate::server::state::AppState;
use crate::types::{Membership, MembershipId, User};
use crate::validation::{MembershipRequest, UpdateMembershipRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventure_core::environment::Clock;
use eventure_web::{AppError, JsonBody};

fn ensure_member_or_admin(user: &User, membership: &Membership) -> Result<(), AppError> {
    if user.role.is_admin() || membership.user_id == user.id {
        Ok(())
    } else {
        Err(AppError::forbidden("Not allowed to access this membership"))
    }
}

async fn load(state: &AppState, id: &str) -> Result<Membership, AppError> {
    let id: MembershipId = parse_id("Membership", id)?;
    state
        .repos
        .memberships
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Membership", id))
}

/// Join a club.
///
/// Without `userId` the caller joins; adding someone else needs an admin.
#[tracing::instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn create_membership(
    session: SessionUser,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MembershipRequest>,
) -> Result<(StatusCode, Json<Membership>), AppError> {
    let new = request.parse()?;
    let member = new.user_id.unwrap_or(session.user.id);
    if member != session.user.id && !session.user.role.is_admin() {
        return Err(AppError::forbidden("Only admins can add other users to a club"));
    }
    if state.repos.clubs.find_by_id(new.club_id).await?.is_none() {
        return Err(AppError::not_found("Club", new.club_id));
    }
    if state.repos.users.find_by_id(member).await?.is_none() {
        return Err(AppError::not_found("User", member));
    }

    let membership = state
        .repos
        .memberships
        .create(Membership {
            id: MembershipId::new(),
            user_id: member,
            club_id: new.club_id,
            role: new.role,
            joined_at: state.clock.now(),
        })
        .await?;

    tracing::info!(
        membership_id = %membership.id,
        club_id = %membership.club_id,
        role = %membership.role,
        "Membership created"
    );
    Ok((StatusCode::CREATED, Json(membership)))
}

/// Every membership for admins, the caller's own otherwise.
pub async fn list_memberships(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Membership>>, AppError> {
    let memberships = if session.user.role.is_admin() {
        state.repos.memberships.list().await?
    } else {
        state.repos.memberships.list_for_user(session.user.id).await?
    };
    Ok(Json(memberships))
}

/// One membership.
pub async fn get_membership(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Membership>, AppError> {
    let membership = load(&state, &id).await?;
    ensure_member_or_admin(&session.user, &membership)?;
    Ok(Json(membership))
}

/// Change a member's role.
pub async fn update_membership(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateMembershipRequest>,
) -> Result<Json<Membership>, AppError> {
    let role = request.parse()?;
    let id: MembershipId = parse_id("Membership", &id)?;
    Ok(Json(state.repos.memberships.update_role(id, role).await?))
}

/// Leave a club, or remove a member as an admin.
pub async fn delete_membership(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let membership = load(&state, &id).await?;
    ensure_member_or_admin(&session.user, &membership)?;

    state.repos.memberships.delete(membership.id).await?;
    Ok(Json(MessageResponse::new("Membership removed")))
}
