use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::errors::{ApiError, ErrorDetails, ValidationProblemDetails, APPLICATION_JSON};
use crate::json::to_snake_case_json;
use crate::metrics;
use crate::models::FormData;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// Reported as `instance` in validation errors
    pub instance_name: String,
    pub max_body_bytes: usize,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "snake-case-api",
        "version": env!("CARGO_PKG_VERSION"),
        "instance": state.instance_name,
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// Register an account and echo the submitted form with snake_case keys
#[utoipa::path(
    post,
    path = "/account/register",
    tag = "account",
    request_body = FormData,
    responses(
        (status = 200, description = "Form accepted", body = FormData),
        (status = 400, description = "One or more fields failed validation", body = ValidationProblemDetails),
        (status = 413, description = "Request body too large", body = ErrorDetails),
        (status = 500, description = "Internal server error", body = ErrorDetails)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(status = %rejection.status(), "Rejected registration body");
            return ApiError::fault(rejection.status(), Some(rejection.body_text()))
                .respond()
                .await;
        }
    };

    let form = match FormData::bind(&body) {
        Ok(form) => form,
        Err(field_errors) => {
            let problem =
                ValidationProblemDetails::from_field_errors(&state.instance_name, field_errors);
            metrics::record_validation_failures(&problem.validation_errors);
            info!(
                request_id = %problem.request_id,
                failures = problem.validation_errors.len(),
                "Registration failed validation"
            );
            return ApiError::Validation(problem).respond().await;
        }
    };

    metrics::REGISTRATIONS_TOTAL.inc();

    match to_snake_case_json(&form) {
        Ok(json) => (StatusCode::OK, [(header::CONTENT_TYPE, APPLICATION_JSON)], json).into_response(),
        Err(e) => {
            error!("Failed to serialize registration: {}", e);
            ApiError::internal().respond().await
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::fault(StatusCode::NOT_FOUND, Some("Not Found".to_string()))
}

/// Turn a handler panic into the generic 500 body
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let reason = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    let err = ApiError::internal();
    error!(request_id = %err.request_id(), reason = %reason, "Handler panicked");
    err.into_response()
}
