//! Correlation ID middleware.
//!
//! Every request gets a correlation ID: the caller's `X-Correlation-ID`
//! when it is a valid UUID, a fresh UUID v4 otherwise. The ID is stored in
//! the request extensions, recorded on the request span, and echoed back on
//! the response.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/rsvps", post(create_rsvp))
//!     .layer(correlation_id_layer());
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    response::Response,
};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Correlation ID supplied by the caller, if it is a valid UUID.
#[must_use]
pub fn correlation_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Create a layer that adds correlation ID tracking to all requests.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = correlation_id_from_headers(req.headers()).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;

            if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::extractors::CorrelationId;
    use axum::{Router, body::Body, http::Request as HttpRequest, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|CorrelationId(id): CorrelationId| async move { id.to_string() }))
            .layer(correlation_id_layer())
    }

    #[tokio::test]
    async fn generates_id_when_missing() {
        let request = HttpRequest::builder().uri("/ping").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        let header = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present");
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn echoes_caller_id_to_handler_and_response() {
        let id = Uuid::new_v4();
        let request = HttpRequest::builder()
            .uri("/ping")
            .header(CORRELATION_ID_HEADER, id.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(CORRELATION_ID_HEADER).unwrap().to_str().unwrap(),
            id.to_string()
        );
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn replaces_invalid_id() {
        let request = HttpRequest::builder()
            .uri("/ping")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        let header = response.headers().get(CORRELATION_ID_HEADER).unwrap().to_str().unwrap();
        assert_ne!(header, "not-a-uuid");
        assert!(Uuid::parse_str(header).is_ok());
    }
}
