use utoipa::OpenApi;

use crate::errors::{ErrorDetails, ValidationError, ValidationProblemDetails};
use crate::models::FormData;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Snake Case API",
        version = "0.1.0",
        description = "Account registration API whose JSON bodies, including every error body, use snake_case property names."
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::register,
    ),
    components(
        schemas(
            FormData,
            ErrorDetails,
            ValidationError,
            ValidationProblemDetails,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "account", description = "Account registration endpoints"),
    )
)]
pub struct ApiDoc;
