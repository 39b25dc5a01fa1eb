use std::collections::HashMap;
use std::sync::MutexGuard;

use axum::Json;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::{AppError, AppState};
use crate::db::Database;
use crate::error::Error;
use crate::models::PageRequest;

pub mod tasks;
pub mod users;

/// Service info at `/`.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
    }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Database>, AppError> {
    state
        .db
        .lock()
        .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
}

/// Path ids that are not positive integers can never match a row.
fn parse_id(raw: &str, not_found: fn() -> Error) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(not_found().into()),
    }
}

/// Read `page` / `page_size` from the query string (defaults 1 and 20).
fn page_request(params: &HashMap<String, String>) -> Result<PageRequest, AppError> {
    let defaults = PageRequest::default();
    let parse = |key: &str, default: u64| -> Result<i64, AppError> {
        match params.get(key) {
            None => Ok(i64::try_from(default).unwrap_or(i64::MAX)),
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                AppError::Validation(
                    "Invalid pagination parameters. 'page' and 'page_size' must be integers."
                        .to_string(),
                )
            }),
        }
    };
    let page = parse("page", defaults.page)?;
    let page_size = parse("page_size", defaults.page_size)?;
    Ok(PageRequest::new(page, page_size)?)
}

/// Parse a request body as a JSON object. `None` when there is nothing to read:
/// blank input, a non-object value or `{}`. Syntax errors are still errors.
fn parse_object(body: &Bytes) -> Result<Option<Map<String, Value>>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?;
    match value {
        Value::Object(map) if !map.is_empty() => Ok(Some(map)),
        _ => Ok(None),
    }
}

/// Parse a request body that must be a non-empty JSON object.
fn json_object(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    parse_object(body)?.ok_or_else(|| AppError::Validation("Missing JSON body".to_string()))
}

fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    let map = json_object(body)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
}
