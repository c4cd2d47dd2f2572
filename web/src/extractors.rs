//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation ID (from the middleware, the header, or new)
//! - `JsonBody`: a JSON body whose rejections render as [`AppError`]
//!
//! # Examples
//!
//! ```ignore
//! use eventure_web::extractors::{CorrelationId, JsonBody};
//!
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     JsonBody(request): JsonBody<CreateRsvpRequest>,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::correlation_id_from_headers;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Uses the ID stored by [`correlation_id_layer`](crate::middleware::correlation_id_layer)
/// when present, then the `X-Correlation-ID` header, and generates a new
/// UUID v4 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        Ok(Self(correlation_id_from_headers(&parts.headers).unwrap_or_else(Uuid::new_v4)))
    }
}

/// JSON request body.
///
/// Same as [`axum::Json`] but malformed bodies become a `400` [`AppError`]
/// with the usual `{"code", "message"}` shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
