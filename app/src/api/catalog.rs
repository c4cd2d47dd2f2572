//! Categories, locations and clubs.
//!
//! Reads are public; writes need an admin. Deleting a category or location
//! leaves its events in place without it.

use super::{MessageResponse, parse_id};
use crate::auth::RequireAdmin;
use crate::server::state::AppState;
use crate::stores::ClubSummary;
use crate::types::{Category, CategoryId, Club, ClubId, Location, LocationId};
use crate::validation::{CategoryRequest, ClubRequest, LocationRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventure_core::environment::Clock;
use eventure_web::{AppError, JsonBody};
use serde::Serialize;

// ============================================================================
// Categories
// ============================================================================

/// Create a category; names are unique regardless of case.
pub async fn create_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let new = request.parse()?;
    let category = state
        .repos
        .categories
        .create(Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
            created_at: state.clock.now(),
        })
        .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// All categories by name.
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.repos.categories.list().await?))
}

/// Delete a category.
pub async fn delete_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id: CategoryId = parse_id("Category", &id)?;
    state.repos.categories.delete(id).await?;
    Ok(Json(MessageResponse::new("Category removed")))
}

// ============================================================================
// Locations
// ============================================================================

/// Create a location.
pub async fn create_location(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LocationRequest>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let new = request.parse()?;
    let location = state
        .repos
        .locations
        .create(Location {
            id: LocationId::new(),
            name: new.name,
            description: new.description,
            capacity: new.capacity,
            created_at: state.clock.now(),
        })
        .await?;

    tracing::info!(location_id = %location.id, name = %location.name, "Location created");
    Ok((StatusCode::CREATED, Json(location)))
}

/// All locations by name.
pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(state.repos.locations.list().await?))
}

/// Delete a location.
pub async fn delete_location(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id: LocationId = parse_id("Location", &id)?;
    state.repos.locations.delete(id).await?;
    Ok(Json(MessageResponse::new("Location removed")))
}

// ============================================================================
// Clubs
// ============================================================================

/// A club with its member count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubView {
    /// The club
    #[serde(flatten)]
    pub club: Club,
    /// Number of members
    pub member_count: u64,
}

impl From<ClubSummary> for ClubView {
    fn from(summary: ClubSummary) -> Self {
        Self { club: summary.club, member_count: summary.member_count }
    }
}

/// Create a club owned by the calling admin.
pub async fn create_club(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ClubRequest>,
) -> Result<(StatusCode, Json<Club>), AppError> {
    let new = request.parse()?;
    let club = state
        .repos
        .clubs
        .create(Club {
            id: ClubId::new(),
            name: new.name,
            description: new.description,
            contact_email: new.contact_email,
            logo: new.logo,
            created_by: Some(admin.user.id),
            created_at: state.clock.now(),
        })
        .await?;

    tracing::info!(club_id = %club.id, name = %club.name, "Club created");
    Ok((StatusCode::CREATED, Json(club)))
}

/// All clubs by name with member counts.
pub async fn list_clubs(State(state): State<AppState>) -> Result<Json<Vec<ClubView>>, AppError> {
    let clubs = state.repos.clubs.list().await?;
    Ok(Json(clubs.into_iter().map(ClubView::from).collect()))
}

/// Delete a club and its memberships.
pub async fn delete_club(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id: ClubId = parse_id("Club", &id)?;
    state.repos.clubs.delete(id).await?;
    Ok(Json(MessageResponse::new("Club removed")))
}
