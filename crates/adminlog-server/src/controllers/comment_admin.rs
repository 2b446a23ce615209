//! Admin moderation of comments.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
};

pub const NAME: &str = "CommentAdminController";

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/comments/{id}", delete(delete_comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .delete_comment(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("comment {}", id)))?;

    Ok(StatusCode::NO_CONTENT)
}
