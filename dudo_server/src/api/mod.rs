//! HTTP/WebSocket API for the dice game server.
//!
//! # Endpoints Overview
//!
//! ## Users (the directory collaborator)
//! - `POST /users` - Register a user, returns its record
//! - `GET /users/{user_id}` - Look up a user
//!
//! ## Games
//! - `POST /games` - Create a game, returns the room code
//! - `GET /games/{code}` - Session snapshot (no dice, ever)
//! - `GET /games/{code}/state` - Progression only, poll before joining
//! - `GET /games/{code}/{user_id}` - Whether the user is seated
//!
//! ## WebSocket
//! - `GET /games/{code}/ws` - Live game connection; the first frame
//!   must carry the joining user's id
//!
//! ## Health Check
//! - `GET /health` - Server health status

pub mod games;
pub mod users;
pub mod websocket;

use axum::{
    Router,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::users::MemoryUserDirectory;
use dudo::Playground;

/// Application state shared across handlers and WebSocket connections.
/// Cloned per request; cheap due to the Arc wrappers.
#[derive(Clone, Default)]
pub struct AppState {
    /// Registry of live game sessions.
    pub playground: Arc<Playground>,
    /// User directory collaborator.
    pub users: Arc<MemoryUserDirectory>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// JSON error body for non-2xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn not_found(message: impl ToString) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Create the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(users::register_user))
        .route("/users/{user_id}", get(users::get_user))
        .route("/games", post(games::create_game))
        .route("/games/{code}", get(games::get_game))
        .route("/games/{code}/state", get(games::get_game_state))
        .route("/games/{code}/ws", get(websocket::websocket_handler))
        .route("/games/{code}/{user_id}", get(games::check_player_in_game))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
