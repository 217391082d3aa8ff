use async_trait::async_trait;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::error;

use super::details::ErrorDetails;
use crate::json::{to_snake_case_json, SerializationError};

pub const APPLICATION_JSON: &str = "application/json";

/// Destination for an error response: status, content type and body
#[async_trait]
pub trait ResponseSink: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn set_status(&mut self, status: StatusCode);

    fn set_content_type(&mut self, content_type: &str);

    /// Write the complete body. The only await point of a response write.
    async fn write_body(&mut self, body: String) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum ResponderError<E> {
    #[error("failed to serialize error body: {0}")]
    Serialization(#[from] SerializationError),

    #[error("failed to write error body: {0}")]
    Sink(#[source] E),
}

/// Sink that buffers into an axum [`Response`]
#[derive(Debug)]
pub struct HttpResponseSink {
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: String,
}

impl Default for HttpResponseSink {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            body: String::new(),
        }
    }
}

#[async_trait]
impl ResponseSink for HttpResponseSink {
    type Error = Infallible;

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = HeaderValue::from_str(content_type).ok();
    }

    async fn write_body(&mut self, body: String) -> Result<(), Self::Error> {
        self.body = body;
        Ok(())
    }
}

impl IntoResponse for HttpResponseSink {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

/// An error model paired with the status it is sent under
#[derive(Debug, Clone)]
pub struct JsonErrorResponse<T> {
    error: T,
    status: StatusCode,
}

impl<T> JsonErrorResponse<T>
where
    T: Serialize + Sync,
{
    pub fn new(error: T, status: StatusCode) -> Self {
        Self { error, status }
    }

    pub fn error(&self) -> &T {
        &self.error
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Serialize with snake_case keys and write to `sink`.
    ///
    /// Nothing is written when serialization fails. A failed body write is
    /// returned as is; there is no retry.
    pub async fn write_to<S>(&self, sink: &mut S) -> Result<(), ResponderError<S::Error>>
    where
        S: ResponseSink + ?Sized,
    {
        let body = to_snake_case_json(&self.error)?;

        sink.set_content_type(APPLICATION_JSON);
        sink.set_status(self.status);
        sink.write_body(body).await.map_err(ResponderError::Sink)
    }
}

impl<T> IntoResponse for JsonErrorResponse<T>
where
    T: Serialize + Sync,
{
    fn into_response(self) -> Response {
        let mut sink = HttpResponseSink::default();
        let written = self.write_to(&mut sink).now_or_never();
        finish(sink, written)
    }
}

/// Turn a buffered sink into the response, or the plain 500 when the write
/// failed or did not complete
pub(crate) fn finish(
    sink: HttpResponseSink,
    written: Option<Result<(), ResponderError<Infallible>>>,
) -> Response {
    match written {
        Some(Ok(())) => sink.into_response(),
        Some(Err(e)) => {
            error!(error = %e, "Failed to write error response");
            fallback_response()
        }
        None => {
            error!("Error response write did not complete");
            fallback_response()
        }
    }
}

/// Plain 500 body built without the naming pipeline
pub(crate) fn fallback_response() -> Response {
    let details = ErrorDetails::internal();
    let body = serde_json::json!({
        "status": details.status,
        "message": details.message,
        "request_id": details.request_id,
    });

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, APPLICATION_JSON)],
        body.to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::details::{ValidationError, ValidationProblemDetails};
    use serde_json::Value;
    use std::collections::HashMap;
    use std::io;

    /// Records what was written
    #[derive(Debug, Default)]
    struct RecordingSink {
        status: Option<StatusCode>,
        content_type: Option<String>,
        body: Option<String>,
    }

    #[async_trait]
    impl ResponseSink for RecordingSink {
        type Error = io::Error;

        fn set_status(&mut self, status: StatusCode) {
            self.status = Some(status);
        }

        fn set_content_type(&mut self, content_type: &str) {
            self.content_type = Some(content_type.to_string());
        }

        async fn write_body(&mut self, body: String) -> Result<(), Self::Error> {
            self.body = Some(body);
            Ok(())
        }
    }

    /// Rejects every body write
    #[derive(Debug, Default)]
    struct BrokenPipeSink;

    #[async_trait]
    impl ResponseSink for BrokenPipeSink {
        type Error = io::Error;

        fn set_status(&mut self, _status: StatusCode) {}

        fn set_content_type(&mut self, _content_type: &str) {}

        async fn write_body(&mut self, _body: String) -> Result<(), Self::Error> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }
    }

    #[tokio::test]
    async fn test_write_sets_status_content_type_and_body() {
        let problem = ValidationProblemDetails::new(vec![ValidationError::new(
            "first_name",
            "The first_name field is required.",
        )]);
        let response = JsonErrorResponse::new(problem.clone(), ValidationProblemDetails::STATUS);

        let mut sink = RecordingSink::default();
        response.write_to(&mut sink).await.unwrap();

        assert_eq!(sink.status, Some(StatusCode::BAD_REQUEST));
        assert_eq!(sink.content_type.as_deref(), Some("application/json"));

        let body = sink.body.unwrap();
        let expected = format!(
            r#"{{"status":400,"title":"Request Validation Error","instance":"CT Portal","validation_errors":[{{"name":"first_name","description":"The first_name field is required."}}],"request_id":"{}"}}"#,
            problem.request_id
        );
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let response = JsonErrorResponse::new(ErrorDetails::internal(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = response.write_to(&mut BrokenPipeSink).await.unwrap_err();
        match err {
            ResponderError::Sink(io_err) => assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_serialization_failure_writes_nothing() {
        let mut bad_keys = HashMap::new();
        bad_keys.insert((1u8, 2u8), "value");
        let response = JsonErrorResponse::new(bad_keys, StatusCode::BAD_REQUEST);

        let mut sink = RecordingSink::default();
        let result = tokio_test::block_on(response.write_to(&mut sink));

        assert!(matches!(result, Err(ResponderError::Serialization(_))));
        assert!(sink.status.is_none());
        assert!(sink.body.is_none());
    }

    #[tokio::test]
    async fn test_http_sink_builds_json_response() {
        let details = ErrorDetails::new(StatusCode::NOT_FOUND, Some("Not Found".to_string()));
        let mut sink = HttpResponseSink::default();
        JsonErrorResponse::new(details, StatusCode::NOT_FOUND)
            .write_to(&mut sink)
            .await
            .unwrap();

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["message"], "Not Found");
        assert!(json["request_id"].is_string());
    }

    #[test]
    fn test_into_response_status_and_header() {
        let response =
            JsonErrorResponse::new(ErrorDetails::internal(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_unserializable_error_falls_back_to_500() {
        let mut bad_keys = HashMap::new();
        bad_keys.insert(vec![1u8], "value");
        let response = JsonErrorResponse::new(bad_keys, StatusCode::BAD_REQUEST).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
