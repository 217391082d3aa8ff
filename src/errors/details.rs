use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

const DEFAULT_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Title carried by every validation error response
pub const VALIDATION_TITLE: &str = "Request Validation Error";

/// Instance reported when the deployment does not name its node
pub const DEFAULT_INSTANCE: &str = "CT Portal";

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generic error body for faults other than field validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetails {
    /// HTTP status code
    pub status: u16,
    /// Human-readable error message
    pub message: String,
    /// Request ID for tracing
    pub request_id: String,
}

impl ErrorDetails {
    /// Create error details; a missing message becomes "Internal Server Error"
    pub fn new(status: StatusCode, message: Option<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| DEFAULT_SERVER_ERROR_MESSAGE.to_string()),
            request_id: new_request_id(),
        }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None)
    }
}

/// One failed check on one request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    /// snake_case field name
    pub name: String,
    /// What was wrong with the field
    pub description: String,
}

impl ValidationError {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Body of a 400 response listing every field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationProblemDetails {
    /// Always 400
    pub status: u16,
    /// Always "Request Validation Error"
    pub title: String,
    /// Name of the serving instance
    pub instance: String,
    /// Failed checks, in the order they were reported
    pub validation_errors: Vec<ValidationError>,
    /// Request ID for tracing
    pub request_id: String,
}

impl ValidationProblemDetails {
    pub const STATUS: StatusCode = StatusCode::BAD_REQUEST;

    pub fn new(validation_errors: Vec<ValidationError>) -> Self {
        Self::with_instance(DEFAULT_INSTANCE, validation_errors)
    }

    pub fn with_instance(
        instance: impl Into<String>,
        validation_errors: Vec<ValidationError>,
    ) -> Self {
        Self {
            status: Self::STATUS.as_u16(),
            title: VALIDATION_TITLE.to_string(),
            instance: instance.into(),
            validation_errors,
            request_id: new_request_id(),
        }
    }
}
