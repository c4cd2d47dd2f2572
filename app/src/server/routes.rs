//! Router configuration for Eventure.

use super::health::{health_check, metrics, readiness_check};
use super::state::AppState;
use crate::api::{auth, catalog, events, memberships, rsvps, users};
use axum::{
    Router,
    routing::{delete, get, post},
};
use eventure_web::correlation_id_layer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Health, readiness and metrics live at the root; everything else under
/// `/api`. CORS is added by the binary, which knows the frontend origin.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users/register", post(auth::register))
        .route("/users", get(users::list_users))
        .route("/users/:id", delete(users::delete_user))
        // Events
        .route("/events", post(events::create_event).get(events::list_events))
        .route(
            "/events/:id",
            get(events::get_event).put(events::update_event).delete(events::delete_event),
        )
        .route("/events/:id/cancel", post(events::cancel_event))
        // RSVPs
        .route("/rsvps", post(rsvps::create_rsvp))
        .route("/rsvps/cancel/:event_id", post(rsvps::cancel_rsvp))
        .route("/rsvps/me", get(rsvps::my_rsvps))
        .route("/rsvps/event/:event_id", get(rsvps::event_rsvps))
        // Catalog
        .route("/categories", post(catalog::create_category).get(catalog::list_categories))
        .route("/categories/:id", delete(catalog::delete_category))
        .route("/locations", post(catalog::create_location).get(catalog::list_locations))
        .route("/locations/:id", delete(catalog::delete_location))
        .route("/clubs", post(catalog::create_club).get(catalog::list_clubs))
        .route("/clubs/:id", delete(catalog::delete_club))
        // Memberships
        .route(
            "/memberships",
            post(memberships::create_membership).get(memberships::list_memberships),
        )
        .route(
            "/memberships/:id",
            get(memberships::get_membership)
                .put(memberships::update_membership)
                .delete(memberships::delete_membership),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
