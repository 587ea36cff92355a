use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Error envelope returned by every failing HTTP endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Invalid operation",
    "message": "Cannot pause a work order with status 'completed'.",
    "timestamp": "2025-09-14T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Error category (e.g. "Not found", "Invalid operation")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    fn status_and_category(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ServiceError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            ServiceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            ServiceError::InvalidOperation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Invalid operation")
            }
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::DatabaseError(_)
            | ServiceError::EventError(_)
            | ServiceError::InternalError(_)
            | ServiceError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, category) = self.status_and_category();

        // Never leak driver-level detail to clients.
        let message = match &self {
            ServiceError::DatabaseError(e) => {
                tracing::error!("database error: {e}");
                "A storage error occurred while processing the request".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: category.to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_operation_maps_to_unprocessable_entity() {
        let err = ServiceError::InvalidOperation("cannot".into());
        let (status, category) = err.status_and_category();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(category, "Invalid operation");
    }

    #[test]
    fn database_error_maps_to_internal() {
        let err = ServiceError::DatabaseError(DbErr::Custom("boom".into()));
        let (status, _) = err.status_and_category();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
