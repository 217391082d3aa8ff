use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{handle_panic, health, not_found, register, AppState};
use super::middleware::logging_middleware;
use super::openapi::ApiDoc;
use crate::metrics;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    let router = Router::new()
        // Health check
        .route("/health", get(health))
        // Account endpoints
        .route("/account/register", post(register))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found);

    apply_layers(router, body_limit)
        // Add shared state
        .with_state(state)
}

fn apply_layers(router: Router<AppState>, body_limit: usize) -> Router<AppState> {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Order matters: body limit -> panics -> logging -> metrics -> cors -> trace.
    // Panics become 500s before logging and metrics see the response.
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::AppStateInner;
    use crate::metrics::registry::HTTP_REQUESTS_TOTAL;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("database password is hunter2")
    }

    #[tokio::test]
    async fn test_panicking_route_is_logged_and_counted() {
        let state = Arc::new(AppStateInner {
            instance_name: "CT Portal".to_string(),
            max_body_bytes: 1024,
        });
        let app = apply_layers(Router::new().route("/explode", get(explode)), 1024).with_state(state);

        let before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/explode", "500"])
            .get();

        let response = app
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "Internal Server Error");
        assert!(!String::from_utf8_lossy(&bytes).contains("hunter2"));

        let after = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/explode", "500"])
            .get();
        assert_eq!(after, before + 1);
    }
}
