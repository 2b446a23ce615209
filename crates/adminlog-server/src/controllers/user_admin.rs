//! Admin operations on users.

use crate::error::ApiError;
use crate::state::{AppState, User, UserRole};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, patch},
};
use serde::Deserialize;

pub const NAME: &str = "UserAdminController";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/role", patch(change_role))
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.users().await)
}

async fn change_role(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    let user = state
        .set_role(id, body.role)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))?;

    tracing::info!(user_id = id, role = ?user.role, "User role changed");
    Ok(Json(user))
}
