//! User registration and lookup handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, AppState, not_found};
use crate::users::{UserDirectory, UserRecord};

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
}

/// Registers a new user and returns its record.
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Json<UserRecord> {
    Json(state.users.register(request.name))
}

/// Looks up a user by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserRecord>, ApiError> {
    match state.users.get(user_id).await {
        Some(user) => Ok(Json(user)),
        None => Err(not_found("user not found")),
    }
}
