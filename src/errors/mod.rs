//! Error models and their JSON rendering

pub mod details;
pub mod response;
pub mod validation;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use thiserror::Error;
use tracing::warn;

pub use details::{ErrorDetails, ValidationError, ValidationProblemDetails};
pub use response::{
    HttpResponseSink, JsonErrorResponse, ResponderError, ResponseSink, APPLICATION_JSON,
};
pub use validation::collect_validation_errors;

/// Every failure the API reports to a client
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more request fields failed validation
    #[error("request validation failed with {} error(s)", .0.validation_errors.len())]
    Validation(ValidationProblemDetails),

    /// Anything else, reported with a status and message only
    #[error("{} ({})", .0.message, .0.status)]
    Fault(ErrorDetails),
}

impl ApiError {
    pub fn fault(status: StatusCode, message: Option<String>) -> Self {
        Self::Fault(ErrorDetails::new(status, message))
    }

    pub fn internal() -> Self {
        Self::Fault(ErrorDetails::internal())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => ValidationProblemDetails::STATUS,
            Self::Fault(details) => {
                StatusCode::from_u16(details.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            Self::Validation(problem) => &problem.request_id,
            Self::Fault(details) => &details.request_id,
        }
    }

    /// Write this error to any sink
    pub async fn write_to<S>(&self, sink: &mut S) -> Result<(), ResponderError<S::Error>>
    where
        S: ResponseSink + ?Sized,
    {
        let status = self.status();
        match self {
            Self::Validation(problem) => JsonErrorResponse::new(problem, status).write_to(sink).await,
            Self::Fault(details) => JsonErrorResponse::new(details, status).write_to(sink).await,
        }
    }

    /// Render through an [`HttpResponseSink`]
    pub async fn respond(self) -> Response {
        let mut sink = HttpResponseSink::default();
        let written = self.write_to(&mut sink).await;
        if written.is_err() {
            warn!(request_id = %self.request_id(), "Falling back to a plain 500 body");
        }
        response::finish(sink, Some(written))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut sink = HttpResponseSink::default();
        let written = self.write_to(&mut sink).now_or_never();
        response::finish(sink, written)
    }
}
