use askama::Template;
use axum::Json;
use axum::response::Html;
use serde_json::Value;

use super::{AppError, StaticAssets};
use crate::error::Error;

/// Where the OpenAPI document is served.
pub const SPEC_ROUTE: &str = "/docs/apispec.json";

/// Swagger UI shell pointing at `SPEC_ROUTE`.
#[derive(Template)]
#[template(path = "docs.html")]
struct DocsPage<'a> {
    name: &'a str,
    version: &'a str,
    spec_url: &'a str,
}

pub async fn page() -> Result<Html<String>, AppError> {
    let page = DocsPage {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        spec_url: SPEC_ROUTE,
    };
    Ok(Html(page.render().map_err(Error::from)?))
}

/// The embedded OpenAPI document, stamped with the running version.
pub async fn api_spec() -> Result<Json<Value>, AppError> {
    let file = StaticAssets::get("apispec.json")
        .ok_or_else(|| AppError::Internal("apispec.json is not embedded".to_string()))?;
    let mut spec: Value = serde_json::from_slice(&file.data).map_err(Error::from)?;
    if let Some(info) = spec.get_mut("info").and_then(Value::as_object_mut) {
        info.insert(
            "version".to_string(),
            Value::String(env!("CARGO_PKG_VERSION").to_string()),
        );
    }
    Ok(Json(spec))
}
