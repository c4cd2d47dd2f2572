//! Application state for the Eventure HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Repositories (for CRUD reads and writes)
//! - The admission store (for every RSVP and cancellation)
//! - Token service and session cookie settings
//! - The mailer (for notifications sent outside the admission store)

use crate::aggregates::rsvp::{AdmissionEnvironment, AdmissionReducer, AdmissionState, AdmissionStore};
use crate::auth::TokenService;
use crate::auth::SESSION_COOKIE;
use crate::config::Config;
use crate::notifications::Mailer;
use crate::stores::Repositories;
use axum::extract::FromRef;
use eventure_core::environment::Clock;
use eventure_runtime::metrics::MetricsExporter;
use eventure_web::SessionCookie;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Every repository
    pub repos: Repositories,

    /// Serializes RSVP admission
    pub admission: Arc<AdmissionStore>,

    /// Signs and verifies session tokens
    pub tokens: TokenService,

    /// Session cookie settings
    pub session_cookie: SessionCookie,

    /// Outgoing email
    pub mailer: Arc<dyn Mailer>,

    /// Timestamps for records created by handlers
    pub clock: Arc<dyn Clock>,

    /// How long an RSVP request waits for its outcome
    pub admission_timeout: Duration,

    /// Prometheus exporter for `/metrics`
    pub metrics: MetricsExporter,
}

impl AppState {
    /// Build the state and start the admission store.
    #[must_use]
    pub fn new(
        config: &Config,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        metrics: MetricsExporter,
    ) -> Self {
        let environment = AdmissionEnvironment::new(
            Arc::clone(&clock),
            Arc::clone(&repos.users),
            Arc::clone(&repos.events),
            Arc::clone(&repos.rsvps),
            Arc::clone(&mailer),
        );
        let admission = Arc::new(AdmissionStore::new(
            AdmissionState::with_ledger_capacity(config.admission.max_ledgers),
            AdmissionReducer::new(),
            environment,
        ));

        Self {
            repos,
            admission,
            tokens: TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl()),
            session_cookie: SessionCookie::new(SESSION_COOKIE).secure(config.auth.cookie_secure),
            mailer,
            clock,
            admission_timeout: config.admission.timeout(),
            metrics,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("repos", &self.repos)
            .field("tokens", &self.tokens)
            .field("admission_timeout", &self.admission_timeout)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for Repositories {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.repos.clone()
    }
}

impl FromRef<AppState> for Arc<AdmissionStore> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.admission)
    }
}
