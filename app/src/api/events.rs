//! Event management API endpoints.
//!
//! - POST /api/events - Create an event (admin)
//! - GET /api/events - List events with their catalog names
//! - GET /api/events/:id - Event details with the seat summary
//! - PUT /api/events/:id - Partial update (admin)
//! - POST /api/events/:id/cancel - Cancel and notify attendees (admin)
//! - DELETE /api/events/:id - Delete with its RSVPs (admin)
//!
//! Updates, cancellations and deletions are written through the admission
//! store, so they never interleave with an admission for the same event.

use super::{MessageResponse, parse_id, unexpected};
use crate::aggregates::rsvp::{EventChange, EventWrite, RsvpAction, SeatSummary};
use crate::auth::RequireAdmin;
use crate::notifications::{self, Email, templates};
use crate::server::state::AppState;
use crate::types::{CategoryId, ClubId, Event, EventId, EventStatus, LocationId, RsvpStatus};
use crate::validation::{CreateEventRequest, EventDraft, UpdateEventRequest, validate_schedule};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventure_core::environment::Clock;
use eventure_web::{AppError, JsonBody};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Response Types
// ============================================================================

/// Event with the names of its catalog entries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    /// The event
    #[serde(flatten)]
    pub event: Event,
    /// Category name
    pub category_name: Option<String>,
    /// Location name
    pub location_name: Option<String>,
    /// Club name
    pub club_name: Option<String>,
}

/// Event details including current seat counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    /// Event and catalog names
    #[serde(flatten)]
    pub view: EventView,
    /// Seat counts
    pub seats: SeatSummary,
}

struct CatalogNames {
    categories: HashMap<CategoryId, String>,
    locations: HashMap<LocationId, String>,
    clubs: HashMap<ClubId, String>,
}

impl CatalogNames {
    async fn load(state: &AppState) -> Result<Self, AppError> {
        let categories = state.repos.categories.list().await?;
        let locations = state.repos.locations.list().await?;
        let clubs = state.repos.clubs.list().await?;
        Ok(Self {
            categories: categories.into_iter().map(|c| (c.id, c.name)).collect(),
            locations: locations.into_iter().map(|l| (l.id, l.name)).collect(),
            clubs: clubs.into_iter().map(|s| (s.club.id, s.club.name)).collect(),
        })
    }

    fn view(&self, event: Event) -> EventView {
        EventView {
            category_name: event.category_id.and_then(|id| self.categories.get(&id).cloned()),
            location_name: event.location_id.and_then(|id| self.locations.get(&id).cloned()),
            club_name: event.club_id.and_then(|id| self.clubs.get(&id).cloned()),
            event,
        }
    }
}

async fn load_event(state: &AppState, id: EventId) -> Result<Event, AppError> {
    state
        .repos
        .events
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))
}

/// Referenced catalog entries must exist.
async fn check_references(state: &AppState, event: &Event) -> Result<(), AppError> {
    if let Some(id) = event.category_id {
        if state.repos.categories.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found("Category", id));
        }
    }
    if let Some(id) = event.location_id {
        if state.repos.locations.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found("Location", id));
        }
    }
    if let Some(id) = event.club_id {
        if state.repos.clubs.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found("Club", id));
        }
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an event.
///
/// Members of the hosting club get a "New Event" email.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/events \
///   -b "token=<session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "title": "Hack Night",
///     "date": "2026-04-10",
///     "startTime": "18:00",
///     "endTime": "21:30",
///     "seatLimit": 40
///   }'
/// ```
#[tracing::instrument(skip_all)]
pub async fn create_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let EventDraft {
        title,
        description,
        date,
        start_time,
        end_time,
        seat_limit,
        status,
        category_id,
        location_id,
        club_id,
        banner_image,
    } = request.parse()?;

    let now = state.clock.now();
    let event = Event {
        id: EventId::new(),
        title,
        description,
        date,
        start_time,
        end_time,
        seat_limit,
        status,
        category_id,
        location_id,
        club_id,
        banner_image,
        created_by: Some(admin.user.id),
        created_at: now,
        updated_at: now,
    };
    check_references(&state, &event).await?;

    let event = state.repos.events.create(event).await?;
    tracing::info!(event_id = %event.id, seat_limit = event.seat_limit, "Event created");

    if let Some(club_id) = event.club_id {
        let emails = club_announcements(&state, club_id, &event).await?;
        notifications::deliver_all_in_background(state.mailer.clone(), emails);
    }

    Ok((StatusCode::CREATED, Json(event)))
}

async fn club_announcements(
    state: &AppState,
    club_id: ClubId,
    event: &Event,
) -> Result<Vec<Email>, AppError> {
    let mut emails = Vec::new();
    for membership in state.repos.memberships.list_for_club(club_id).await? {
        if let Some(member) = state.repos.users.find_by_id(membership.user_id).await? {
            emails.push(templates::new_event(&member, event));
        }
    }
    Ok(emails)
}

/// All events by date and start time.
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventView>>, AppError> {
    let names = CatalogNames::load(&state).await?;
    let events = state.repos.events.list().await?;
    Ok(Json(events.into_iter().map(|event| names.view(event)).collect()))
}

/// One event with its seat summary.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventDetail>, AppError> {
    let event = load_event(&state, parse_id("Event", &id)?).await?;
    let rsvps = state.repos.rsvps.list_for_event(event.id).await?;
    let seats = SeatSummary::count(event.seat_limit, &rsvps);
    let names = CatalogNames::load(&state).await?;

    Ok(Json(EventDetail { view: names.view(event), seats }))
}

/// Apply a partial update.
///
/// Lowering the seat limit never takes a seat away from an attendee who
/// already holds one; it only shrinks what is left for newcomers.
#[tracing::instrument(skip(_admin, state, request))]
pub async fn update_event(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let patch = request.parse()?;
    let mut event = load_event(&state, parse_id("Event", &id)?).await?;

    if let Some(title) = patch.title {
        event.title = title;
    }
    if patch.description.is_some() {
        event.description = patch.description;
    }
    if let Some(date) = patch.date {
        event.date = date;
    }
    if let Some(start_time) = patch.start_time {
        event.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        event.end_time = end_time;
    }
    if let Some(seat_limit) = patch.seat_limit {
        event.seat_limit = seat_limit;
    }
    if let Some(status) = patch.status {
        event.status = status;
    }
    if patch.category_id.is_some() {
        event.category_id = patch.category_id;
    }
    if patch.location_id.is_some() {
        event.location_id = patch.location_id;
    }
    if patch.club_id.is_some() {
        event.club_id = patch.club_id;
    }
    if patch.banner_image.is_some() {
        event.banner_image = patch.banner_image;
    }
    validate_schedule(event.start_time, event.end_time)?;
    check_references(&state, &event).await?;
    event.updated_at = state.clock.now();

    let event = write_event(&state, EventChange::Update(event)).await?;

    tracing::info!(event_id = %event.id, "Event updated");
    Ok(Json(event))
}

/// Cancel an event.
///
/// New RSVPs are refused from now on. Everyone with a confirmed RSVP,
/// seated or waitlisted, gets an "Event Cancelled" email.
#[tracing::instrument(skip(_admin, state))]
pub async fn cancel_event(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let mut event = load_event(&state, parse_id("Event", &id)?).await?;
    if event.is_cancelled() {
        return Ok(Json(event));
    }

    event.status = EventStatus::Cancelled;
    event.updated_at = state.clock.now();
    let event = write_event(&state, EventChange::Update(event)).await?;

    let mut emails = Vec::new();
    for rsvp in state.repos.rsvps.list_for_event(event.id).await? {
        if rsvp.status != RsvpStatus::Confirmed {
            continue;
        }
        if let Some(attendee) = state.repos.users.find_by_id(rsvp.user_id).await? {
            emails.push(templates::event_cancelled(&attendee, &event));
        }
    }
    tracing::info!(event_id = %event.id, notified = emails.len(), "Event cancelled");
    notifications::deliver_all_in_background(state.mailer.clone(), emails);

    Ok(Json(event))
}

/// Delete an event and its RSVPs.
#[tracing::instrument(skip(_admin, state))]
pub async fn delete_event(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let event_id: EventId = parse_id("Event", &id)?;
    write(&state, EventChange::Delete(event_id)).await?;

    tracing::info!(%event_id, "Event deleted");
    Ok(Json(MessageResponse::new("Event removed")))
}

/// Send an admin change through the admission store and wait for it to land.
async fn write(state: &AppState, change: EventChange) -> Result<Option<Event>, AppError> {
    let correlation_id = Uuid::new_v4();
    let outcome = state
        .admission
        .send_and_wait_for(
            RsvpAction::WriteEvent(EventWrite { correlation_id, change }),
            |a| a.outcome_for() == Some(correlation_id),
            state.admission_timeout,
        )
        .await?;

    match outcome {
        RsvpAction::EventWritten { event, .. } => Ok(event),
        RsvpAction::EventWriteFailed { reason, .. } => Err(reason.into()),
        other => Err(unexpected(&other)),
    }
}

async fn write_event(state: &AppState, change: EventChange) -> Result<Event, AppError> {
    let event_id = change.event_id();
    write(state, change).await?.ok_or_else(|| AppError::not_found("Event", event_id))
}
