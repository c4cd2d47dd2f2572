//! RSVP endpoints.
//!
//! - POST /api/rsvps - RSVP for an event (seat or waitlist)
//! - POST /api/rsvps/cancel/:eventId - Cancel the caller's RSVP
//! - GET /api/rsvps/me - The caller's RSVPs
//! - GET /api/rsvps/event/:eventId - Every RSVP of an event (admin)
//!
//! Creating and cancelling go through the admission store: the handler sends
//! the command and waits for the outcome carrying its correlation id.

use super::{parse_id, unexpected};
use crate::aggregates::rsvp::{Admission, CancelRequest, RsvpAction, RsvpRequest};
use crate::auth::{RequireAdmin, SessionUser};
use crate::server::state::AppState;
use crate::types::{Event, EventId, Rsvp};
use crate::validation::CreateRsvpRequest;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventure_web::{AppError, CorrelationId, JsonBody};
use serde::Serialize;
use uuid::Uuid;

/// Response for a recorded RSVP.
#[derive(Debug, Serialize)]
pub struct RsvpCreated {
    /// Human-readable outcome
    pub message: String,
    /// The stored RSVP
    pub rsvp: Rsvp,
    /// Seat or waitlist
    pub admission: Admission,
}

/// An RSVP with its attendee's contact details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRsvp {
    /// The RSVP
    #[serde(flatten)]
    pub rsvp: Rsvp,
    /// Attendee name
    pub user_name: String,
    /// Attendee email
    pub user_email: String,
}

/// One of the caller's RSVPs with its event.
#[derive(Debug, Serialize)]
pub struct MyRsvp {
    /// The RSVP
    #[serde(flatten)]
    pub rsvp: Rsvp,
    /// The event, if it still exists
    pub event: Option<Event>,
}

/// Rows touched by a cancellation.
#[derive(Debug, Serialize)]
pub struct CancelledCount {
    /// Zero when there was nothing to cancel
    pub count: u64,
}

/// Response for a cancellation.
#[derive(Debug, Serialize)]
pub struct RsvpCancelledResponse {
    /// Human-readable outcome
    pub message: String,
    /// How many RSVPs were cancelled
    pub rsvp: CancelledCount,
}

/// RSVP for an event.
///
/// Responds `201` whether the RSVP landed on a seat or on the waitlist; the
/// `waitlist` flag of the returned RSVP tells which. Repeating the request
/// updates the same RSVP.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/rsvps \
///   -b "token=<session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{"eventId": "550e8400-e29b-41d4-a716-446655440000", "notes": "vegetarian"}'
/// ```
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id.0))]
pub async fn create_rsvp(
    session: SessionUser,
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    JsonBody(request): JsonBody<CreateRsvpRequest>,
) -> Result<(StatusCode, Json<RsvpCreated>), AppError> {
    let command = request.parse()?;

    // Each admission gets its own id; the request header may be reused by clients.
    let admission_id = Uuid::new_v4();
    let action = RsvpAction::RequestRsvp(RsvpRequest {
        correlation_id: admission_id,
        user_id: session.user.id,
        event_id: command.event_id,
        notes: command.notes,
    });

    let outcome = state
        .admission
        .send_and_wait_for(
            action,
            |a| a.outcome_for() == Some(admission_id),
            state.admission_timeout,
        )
        .await?;

    match outcome {
        RsvpAction::RsvpRecorded { rsvp, admission, .. } => {
            Ok((
                StatusCode::CREATED,
                Json(RsvpCreated { message: "RSVP successful".to_string(), rsvp, admission }),
            ))
        },
        RsvpAction::RsvpRejected { reason, .. } => Err(reason.into()),
        RsvpAction::RsvpPersistFailed { reason, .. } => {
            Err(AppError::internal("Failed to save RSVP").with_source(anyhow::anyhow!(reason)))
        },
        other => Err(unexpected(&other)),
    }
}

/// Cancel the caller's RSVP for an event.
///
/// Marks the caller's RSVP cancelled, whatever its status, and frees its
/// place for future requests; nobody on the waitlist is promoted. Cancelling
/// twice, or without an RSVP, succeeds with a count of zero.
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id.0))]
pub async fn cancel_rsvp(
    session: SessionUser,
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(event_id): Path<String>,
) -> Result<Json<RsvpCancelledResponse>, AppError> {
    let event_id: EventId = parse_id("Event", &event_id)?;

    let admission_id = Uuid::new_v4();
    let action = RsvpAction::CancelRsvp(CancelRequest {
        correlation_id: admission_id,
        user_id: session.user.id,
        event_id,
    });

    let outcome = state
        .admission
        .send_and_wait_for(
            action,
            |a| a.outcome_for() == Some(admission_id),
            state.admission_timeout,
        )
        .await?;

    match outcome {
        RsvpAction::RsvpCancelled { count, .. } => Ok(Json(RsvpCancelledResponse {
            message: "RSVP cancelled".to_string(),
            rsvp: CancelledCount { count },
        })),
        RsvpAction::RsvpRejected { reason, .. } => Err(reason.into()),
        other => Err(unexpected(&other)),
    }
}

/// The caller's RSVPs, newest first.
pub async fn my_rsvps(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MyRsvp>>, AppError> {
    let rsvps = state.repos.rsvps.list_for_user(session.user.id).await?;

    let mut mine = Vec::with_capacity(rsvps.len());
    for rsvp in rsvps {
        let event = state.repos.events.find_by_id(rsvp.event_id).await?;
        mine.push(MyRsvp { rsvp, event });
    }
    Ok(Json(mine))
}

/// Every RSVP of an event with attendee details.
pub async fn event_rsvps(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<AttendeeRsvp>>, AppError> {
    let event_id: EventId = parse_id("Event", &event_id)?;
    if state.repos.events.find_by_id(event_id).await?.is_none() {
        return Err(AppError::not_found("Event", event_id));
    }

    let mut attendees = Vec::new();
    for rsvp in state.repos.rsvps.list_for_event(event_id).await? {
        // Users are deleted together with their RSVPs; a miss is a race.
        let Some(user) = state.repos.users.find_by_id(rsvp.user_id).await? else {
            continue;
        };
        attendees.push(AttendeeRsvp { rsvp, user_name: user.name, user_email: user.email });
    }
    Ok(Json(attendees))
}
