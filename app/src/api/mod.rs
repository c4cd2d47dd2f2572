//! HTTP API endpoints.
//!
//! Handlers validate the request into a typed command, then either call the
//! repositories directly (CRUD) or go through the admission store (RSVPs).

pub mod auth;
pub mod catalog;
pub mod events;
pub mod memberships;
pub mod rsvps;
pub mod users;

use crate::aggregates::rsvp::RsvpAction;
use eventure_web::AppError;
use serde::Serialize;
use std::str::FromStr;

/// `{"message": ..}` body for operations without a resource to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    /// Wrap `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Parse a path id; a malformed id cannot name an existing record.
pub(crate) fn parse_id<T: FromStr>(resource: &'static str, raw: &str) -> Result<T, AppError> {
    raw.parse().map_err(|_| AppError::not_found(resource, raw))
}

/// The admission store answered with an action the handler does not expect.
pub(crate) fn unexpected(action: &RsvpAction) -> AppError {
    AppError::internal("Unexpected admission outcome")
        .with_source(anyhow::anyhow!("unexpected action: {action:?}"))
}
