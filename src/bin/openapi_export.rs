// Prints the OpenAPI document as JSON: cargo run --bin openapi_export

use anyhow::{Context, Result};
use snake_case_api::api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI spec to JSON")?;

    println!("{}", json);

    Ok(())
}
