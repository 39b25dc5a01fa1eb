use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::{json_body, lock, page_request, parse_id};
use crate::error::Error;
use crate::models::{NewUser, Task, User, UserChanges, UserPage};
use crate::web::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// `GET /users`: sorted by name, paginated.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<UserPage>, AppError> {
    let page = page_request(&params)?;
    let db = lock(&state)?;
    Ok(Json(db.list_users(page)?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<User>), AppError> {
    let req: CreateUserRequest = json_body(&body)?;
    let new_user = NewUser::new(
        req.name.as_deref().unwrap_or(""),
        req.email.as_deref().unwrap_or(""),
    )?;
    let db = lock(&state)?;
    let user = db.insert_user(&new_user)?;
    tracing::info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id, Error::user_not_found)?;
    let db = lock(&state)?;
    Ok(Json(db.require_user(id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id, Error::user_not_found)?;
    let req: UpdateUserRequest = json_body(&body)?;
    let db = lock(&state)?;
    db.require_user(id)?;
    let changes = UserChanges::new(req.name.as_deref(), req.email.as_deref())?;
    Ok(Json(db.update_user(id, &changes)?))
}

/// Delete a user; their tasks become unassigned.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, Error::user_not_found)?;
    let db = lock(&state)?;
    db.delete_user(id)?;
    tracing::info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Tasks currently assigned to the user.
pub async fn tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    let id = parse_id(&id, Error::user_not_found)?;
    let db = lock(&state)?;
    Ok(Json(db.tasks_for_user(id)?))
}
