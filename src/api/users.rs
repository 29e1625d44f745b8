use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::extract::{UserId, ValidatedJson};
use crate::api::server::AppState;
use crate::db::models::{UserRequest, UserResponse};

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state.users.create(&payload).await?;
    tracing::info!(id, "user created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> Result<StatusCode, ApiError> {
    state.users.update(&payload, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<StatusCode, ApiError> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
