use crate::state::AppState;
use axum::{Json, Router, routing::get};
use serde_json::json;

pub const NAME: &str = "HealthController";

pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "adminlog-server" }))
}
