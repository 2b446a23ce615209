//! Coarse pre-dispatch access line for admin paths.

use crate::record::format_timestamp;
use crate::sink::AuditSink;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

/// Logs `[<timestamp>][<uri>]` for every request under a path prefix.
pub struct PathLogger {
    prefix: String,
    enabled: bool,
    sink: Arc<dyn AuditSink>,
}

impl PathLogger {
    pub fn new(prefix: impl Into<String>, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            prefix: prefix.into(),
            enabled: true,
            sink,
        }
    }

    /// Turn line emission on or off. Requests always pass through.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The line for `path` at `now`, if the path is under the prefix.
    pub fn line_for(&self, path: &str, now: NaiveDateTime) -> Option<String> {
        if !self.enabled || !path.starts_with(self.prefix.as_str()) {
            return None;
        }
        Some(format!("[{}][{}]", format_timestamp(now), path))
    }
}

/// Axum middleware; never blocks or rejects.
pub async fn log_admin_paths(
    State(logger): State<Arc<PathLogger>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(line) = logger.line_for(request.uri().path(), Local::now().naive_local()) {
        if let Err(e) = logger.sink.write_line(&line).await {
            tracing::warn!(error = %e, "Failed to write path log line");
        }
    }

    next.run(request).await
}
