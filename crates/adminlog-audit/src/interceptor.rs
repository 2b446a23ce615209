//! Dual-phase audit interceptor for admin operations.
//!
//! Installed as a route layer on admin controllers only (see
//! [`crate::registry`]). For each invocation it logs a request line before
//! the handler runs and, if the handler succeeded, a response line after it.
//! The handler's response is returned byte-for-byte.
//!
//! A response reports a failed invocation when it carries [`HandlerFailed`]
//! or has a 4xx/5xx status. The status rule covers responses the router
//! produces without running the handler: extractor rejections and the 405
//! for an unregistered method.

use crate::body::{CachedRequest, buffer_response};
use crate::config::{AuditConfig, FailurePolicy};
use crate::error::AuditError;
use crate::identity::{TokenResolver, resolve_identity};
use crate::record::{AuditRecord, Phase};
use crate::sink::AuditSink;
use axum::{
    body::Bytes,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Response extension marking a handler failure.
///
/// Application error types set it (via [`mark_failed`]) when they convert
/// into a response. Needed only for failures reported with a success status;
/// error statuses are failures already.
#[derive(Debug, Clone, Copy)]
pub struct HandlerFailed;

/// Mark `response` as the product of a failed handler.
pub fn mark_failed(response: &mut Response) {
    response.extensions_mut().insert(HandlerFailed);
}

/// Shared state of the audit route layer.
pub struct AuditInterceptor {
    config: AuditConfig,
    resolver: Arc<dyn TokenResolver>,
    sink: Arc<dyn AuditSink>,
}

impl AuditInterceptor {
    pub fn new(
        config: AuditConfig,
        resolver: Arc<dyn TokenResolver>,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            resolver,
            sink,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// The sink audit lines are written to.
    pub fn sink(&self) -> Arc<dyn AuditSink> {
        Arc::clone(&self.sink)
    }

    /// Run `next` wrapped in request and response logging.
    pub async fn around(&self, request: Request, next: Next) -> Result<Response, AuditError> {
        if !self.config.enabled {
            return Ok(next.run(request).await);
        }

        let context = request
            .extensions()
            .get::<CachedRequest>()
            .cloned()
            .ok_or(AuditError::MissingRequestContext)?;

        let id = resolve_identity(
            request.headers(),
            self.resolver.as_ref(),
            self.config.identity_policy,
        )?;
        let record = AuditRecord::new(id, context.url(), context.method().as_str());

        let request_body = self.apply_policy(Phase::Request, request_body_text(&context))?;
        self.emit(record.line(Phase::Request, request_body.as_deref())).await;

        let response = next.run(request).await;
        if is_failure(&response) {
            tracing::debug!(
                status = %response.status(),
                url = record.url(),
                "Invocation failed, no response line"
            );
            return Ok(response);
        }

        let (response, bytes) = buffer_response(response, self.config.max_body_bytes).await?;
        let response_body = self.apply_policy(Phase::Response, response_body_text(&bytes))?;
        self.emit(record.line(Phase::Response, response_body.as_deref())).await;

        Ok(response)
    }

    fn apply_policy(
        &self,
        phase: Phase,
        rendered: Result<Option<String>, AuditError>,
    ) -> Result<Option<String>, AuditError> {
        match (rendered, self.config.failure_policy) {
            (Ok(body), _) => Ok(body),
            (Err(e), FailurePolicy::Isolate) => {
                tracing::warn!(phase = %phase, error = %e, "Audit body dropped from log line");
                Ok(None)
            }
            (Err(e), FailurePolicy::Propagate) => Err(e),
        }
    }

    async fn emit(&self, line: String) {
        if let Err(e) = self.sink.write_line(&line).await {
            tracing::warn!(error = %e, "Failed to write audit line");
        }
    }
}

/// Axum middleware entry point for the audit route layer.
pub async fn audit_admin_operation(
    State(interceptor): State<Arc<AuditInterceptor>>,
    request: Request,
    next: Next,
) -> Result<Response, AuditError> {
    interceptor.around(request, next).await
}

/// Whether `response` reports a failed invocation.
pub fn is_failure(response: &Response) -> bool {
    let status = response.status();
    response.extensions().get::<HandlerFailed>().is_some()
        || status.is_client_error()
        || status.is_server_error()
}

/// Canonical request body text. `GET` requests and empty bodies have none.
pub fn request_body_text(context: &CachedRequest) -> Result<Option<String>, AuditError> {
    if context.method().as_str().eq_ignore_ascii_case("GET") || context.body().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_slice(context.body())?;
    Ok(Some(value.to_string()))
}

/// Canonical response body text.
///
/// JSON is re-serialized compactly with sorted keys; other UTF-8 text is
/// serialized as a JSON string.
pub fn response_body_text(bytes: &Bytes) -> Result<Option<String>, AuditError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
        return Ok(Some(value.to_string()));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|e| AuditError::UnserializableBody(e.to_string()))?;
    Ok(Some(serde_json::to_string(text)?))
}
