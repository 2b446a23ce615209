//! Declarative controller registration.
//!
//! Controllers are registered by name. A controller whose name contains the
//! configured marker (`"Admin"` by default) gets the audit route layer when it
//! is registered; every other controller is merged untouched, so non-admin
//! routes carry no interception at all.

use crate::body::{BodyCache, cache_bodies};
use crate::interceptor::{AuditInterceptor, audit_admin_operation};
use crate::path_logger::{PathLogger, log_admin_paths};
use axum::{Router, middleware};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

/// Collects controller routers and assembles the audited application router.
pub struct ControllerRegistry<S = ()> {
    interceptor: Arc<AuditInterceptor>,
    router: Router<S>,
    audited: Vec<String>,
}

impl<S> ControllerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(interceptor: Arc<AuditInterceptor>) -> Self {
        Self {
            interceptor,
            router: Router::new(),
            audited: Vec::new(),
        }
    }

    /// Whether a controller with this name is selected for auditing.
    pub fn is_admin_controller(&self, name: &str) -> bool {
        name.contains(self.interceptor.config().controller_marker.as_str())
    }

    /// Register a controller.
    ///
    /// # Panics
    ///
    /// Panics if `name` selects the controller for auditing and `routes` has
    /// no routes, since axum's `Router::route_layer` rejects an empty router.
    pub fn controller(mut self, name: &str, routes: Router<S>) -> Self {
        let routes = if self.is_admin_controller(name) {
            tracing::debug!(controller = name, "Attaching audit layer");
            self.audited.push(name.to_string());
            routes.route_layer(middleware::from_fn_with_state(
                Arc::clone(&self.interceptor),
                audit_admin_operation,
            ))
        } else {
            routes
        };

        self.router = self.router.merge(routes);
        self
    }

    /// Names of the controllers that received the audit layer.
    pub fn audited(&self) -> &[String] {
        &self.audited
    }

    /// Wrap the registered routes in the path logger and body-caching wrapper.
    ///
    /// Layer order, outermost first: body caching, panic capture, path
    /// logger, router. Panics surface as 500 responses inside the caching
    /// wrapper so the buffered response is still released.
    pub fn into_router(self) -> Router<S> {
        let config = self.interceptor.config();
        let body_cache = BodyCache::new(config.max_body_bytes);
        let path_logger = Arc::new(
            PathLogger::new(config.admin_path_prefix.clone(), self.interceptor.sink())
                .enabled(config.enabled),
        );

        self.router
            .layer(middleware::from_fn_with_state(path_logger, log_admin_paths))
            .layer(CatchPanicLayer::new())
            .layer(middleware::from_fn_with_state(body_cache, cache_bodies))
    }
}
