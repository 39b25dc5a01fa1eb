use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::{json_body, lock, page_request, parse_id, parse_object};
use crate::error::Error;
use crate::models::{NewTask, Status, Task, TaskChanges, TaskPage, TaskQuery, TaskSort};
use crate::web::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// `GET /tasks` with `filter_status`, `sort_by`, `ascending`, `page`, `page_size`.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TaskPage>, AppError> {
    let status = params
        .get("filter_status")
        .map(|s| {
            Status::parse(s).map_err(|_| {
                Error::validation("Invalid filter_status. Allowed values: TODO, ONGOING, DONE")
            })
        })
        .transpose()?;
    let sort = match params.get("sort_by") {
        Some(s) => TaskSort::parse(s)?,
        None => TaskSort::default(),
    };
    let ascending = params
        .get("ascending")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    let page = page_request(&params)?;

    let query = TaskQuery {
        status,
        sort,
        ascending,
    };
    let db = lock(&state)?;
    Ok(Json(db.list_tasks(&query, page)?))
}

/// `GET /tasks/search?keyword=...`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TaskPage>, AppError> {
    let keyword = params.get("keyword").map(String::as_str).unwrap_or("");
    let page = page_request(&params)?;
    let db = lock(&state)?;
    Ok(Json(db.search_tasks(keyword, page)?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let req: CreateTaskRequest = json_body(&body)?;
    let new_task = NewTask::new(req.title.as_deref().unwrap_or(""), req.description.as_deref())?;
    let db = lock(&state)?;
    let task = db.insert_task(&new_task)?;
    tracing::info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, Error::task_not_found)?;
    let db = lock(&state)?;
    Ok(Json(db.require_task(id)?))
}

/// `PUT /tasks/{id}`: title and/or description. Other keys are ignored.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, Error::task_not_found)?;
    let req: UpdateTaskRequest = json_body(&body)?;
    let db = lock(&state)?;
    db.require_task(id)?;
    let changes = TaskChanges::new(req.title.as_deref(), req.description.as_deref())?;
    Ok(Json(db.update_task(id, &changes)?))
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, Error::task_not_found)?;
    let missing = || AppError::Validation("Missing 'status' field in request body".to_string());
    let payload = parse_object(&body)?.ok_or_else(missing)?;
    let raw = payload.get("status").ok_or_else(missing)?;

    let db = lock(&state)?;
    db.require_task(id)?;
    let status = match raw {
        Value::String(s) => Status::parse(s)?,
        _ => Status::parse("")?,
    };
    let task = db.set_task_status(id, status)?;
    tracing::info!(task_id = id, status = %status, "task status changed");
    Ok(Json(task))
}

/// `PATCH /tasks/{id}/assign` with `{"user_id": 3}` or `{"user_id": null}`.
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, Error::task_not_found)?;
    let missing = || AppError::Validation("Missing 'user_id' in request body".to_string());
    let payload = parse_object(&body)?.ok_or_else(missing)?;
    let user_id = match payload.get("user_id").ok_or_else(missing)? {
        Value::Null => None,
        v => Some(v.as_i64().ok_or_else(|| {
            AppError::Validation("'user_id' must be an integer or null".to_string())
        })?),
    };

    let db = lock(&state)?;
    let task = db.assign_task(id, user_id)?;
    tracing::info!(task_id = id, user_id = ?user_id, "task assignment changed");
    Ok(Json(task))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, Error::task_not_found)?;
    let db = lock(&state)?;
    db.delete_task(id)?;
    tracing::info!(task_id = id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}
