//! Route assembly.

use crate::config::AppConfig;
use crate::controllers::{comment_admin, health, user, user_admin};
use crate::state::AppState;
use adminlog_audit::{AuditInterceptor, ControllerRegistry, JwtResolver, create_sink};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the audit interceptor described by `cfg`.
pub fn interceptor_from_config(cfg: &AppConfig) -> anyhow::Result<AuditInterceptor> {
    let resolver = JwtResolver::with_prefix(&cfg.auth.jwt_secret, cfg.auth.bearer_prefix.clone());
    let sink = create_sink(&cfg.audit)?;

    Ok(AuditInterceptor::new(
        cfg.audit.clone(),
        Arc::new(resolver),
        Arc::from(sink),
    ))
}

/// Register every controller and wrap them in the audit layers.
pub fn create_router(state: AppState, interceptor: Arc<AuditInterceptor>) -> Router {
    let registry = ControllerRegistry::new(interceptor)
        .controller(user_admin::NAME, user_admin::routes())
        .controller(comment_admin::NAME, comment_admin::routes())
        .controller(user::NAME, user::routes())
        .controller(health::NAME, health::routes());

    tracing::info!(controllers = ?registry.audited(), "Audited controllers");

    registry
        .into_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
