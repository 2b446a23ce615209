//! Public user lookups.

use crate::error::ApiError;
use crate::state::{AppState, User};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

pub const NAME: &str = "UserController";

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/{id}", get(get_user))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<User>, ApiError> {
    state
        .user(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))
}
