//! Domain error types and their HTTP mapping.

use crate::aggregates::rsvp::Rejection;
use crate::validation::ValidationError;
use axum::http::StatusCode;
use eventure_web::AppError;

/// Errors returned by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The addressed record does not exist.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Record kind, e.g. `Event`
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    /// Shorthand for [`RepositoryError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound { resource, id: id.to_string() }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::NotFound { resource: "Record", id: String::new() },
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            },
            _ => Self::Storage(error.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { resource, id } => Self::not_found(resource, id),
            RepositoryError::Conflict(message) => Self::conflict(message),
            RepositoryError::Storage(message) => {
                Self::internal("A storage error occurred").with_source(anyhow::anyhow!(message))
            },
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::UserNotFound | Rejection::EventNotFound => {
                Self::new(StatusCode::NOT_FOUND, rejection.to_string(), "NOT_FOUND".to_string())
            },
            Rejection::EventCancelled => Self::conflict(rejection.to_string()),
            Rejection::Storage(message) => {
                Self::internal("A storage error occurred").with_source(anyhow::anyhow!(message))
            },
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::validation(error.to_string()).with_details(error.details())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_statuses() {
        let not_found: AppError = RepositoryError::not_found("Event", "abc").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.message(), "Event with id abc not found");

        let conflict: AppError = RepositoryError::Conflict("Category already exists".into()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let storage: AppError = RepositoryError::Storage("pool timed out".into()).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.message(), "A storage error occurred");
    }

    #[test]
    fn validation_errors_carry_details() {
        let error: AppError = ValidationError::single("title", "must be at least 3 characters").into();
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn rejections_map_to_statuses() {
        let missing: AppError = Rejection::EventNotFound.into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message(), "Event not found");

        let cancelled: AppError = Rejection::EventCancelled.into();
        assert_eq!(cancelled.status(), StatusCode::CONFLICT);

        let storage: AppError = Rejection::Storage("connection reset".into()).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
