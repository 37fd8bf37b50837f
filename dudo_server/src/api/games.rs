//! Game creation and lookup handlers.
//!
//! These only read published session state (or ask the playground to
//! create a session); all gameplay happens over the WebSocket path.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, AppState, not_found};
use dudo::{Code, GameProgression, GameRules, SessionSnapshot};

#[derive(Debug, Default, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub rules: GameRules,
}

/// Creates a new game and returns its room code.
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Json<Code> {
    Json(state.playground.create_game(request.rules))
}

/// Gets the published info about a game: progression, rules, and the
/// narrowed player list.
pub async fn get_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = state.playground.get_game(&code).map_err(not_found)?;
    let snapshot = handle.snapshot().await.map_err(not_found)?;
    Ok(Json(snapshot))
}

/// Gets the progression of a game; poll this before attempting to
/// join.
pub async fn get_game_state(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<GameProgression>, ApiError> {
    let handle = state.playground.get_game(&code).map_err(not_found)?;
    let snapshot = handle.snapshot().await.map_err(not_found)?;
    Ok(Json(snapshot.progression))
}

/// Checks whether the user currently holds a seat in the game.
pub async fn check_player_in_game(
    State(state): State<AppState>,
    Path((code, user_id)): Path<(String, Uuid)>,
) -> Result<Json<bool>, ApiError> {
    let handle = state.playground.get_game(&code).map_err(not_found)?;
    let seated = handle.is_seated(user_id).await.map_err(not_found)?;
    Ok(Json(seated))
}
