//! Axum integration for Eventure.
//!
//! This crate holds the HTTP plumbing shared by the application: the error
//! type every handler returns, request extractors, correlation ID middleware
//! and session cookie helpers. Domain logic stays in reducers and
//! repositories; handlers translate requests into calls on them.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from request (JSON, headers, cookies)
//! 3. **Validate** into a typed domain command
//! 4. **Dispatch** to a repository or through a `Store`
//! 5. **Map result** to an HTTP response or an [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use eventure_web::{AppError, CorrelationId, JsonBody};
//!
//! async fn create_rsvp(
//!     State(state): State<AppState>,
//!     correlation_id: CorrelationId,
//!     JsonBody(request): JsonBody<CreateRsvpRequest>,
//! ) -> Result<Json<RsvpResponse>, AppError> {
//!     let outcome = state.admission.send_and_wait_for(..).await?;
//!     Ok(Json(outcome.into()))
//! }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod cookies;
pub mod error;
pub mod extractors;
pub mod middleware;

// Re-export key types for convenience
pub use cookies::{SessionCookie, read_cookie};
pub use error::AppError;
pub use extractors::{CorrelationId, JsonBody};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
