//! Error types for the audit crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while resolving the caller identity from a bearer credential.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The `Authorization` header does not start with the bearer prefix.
    #[error("authorization header is missing the bearer prefix")]
    MissingBearerPrefix,

    /// The header value is not valid visible ASCII.
    #[error("authorization header is not valid text")]
    UnreadableHeader,

    /// The credential could not be decoded or verified.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Errors that can occur while capturing or logging an audited exchange.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The body-caching wrapper did not run for this request.
    #[error("no request context: body caching layer is not installed upstream")]
    MissingRequestContext,

    /// The request body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The response body exceeded the configured limit.
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// The client's request body stream failed while it was being buffered.
    #[error("failed to read request body: {0}")]
    RequestRead(String),

    /// The response body stream failed while it was being buffered.
    #[error("failed to read response body: {0}")]
    ResponseRead(String),

    /// A request or response body could not be rendered as JSON.
    #[error("body serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A response body is neither JSON nor UTF-8 text.
    #[error("response body is not serializable: {0}")]
    UnserializableBody(String),

    /// Identity resolution failed under the strict identity policy.
    #[error("identity resolution failed: {0}")]
    Identity(#[from] IdentityError),

    /// Failed to write an audit line to its sink.
    #[error("failed to write audit line: {0}")]
    SinkFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuditError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AuditError::RequestRead(_) => StatusCode::BAD_REQUEST,
            AuditError::Identity(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!(error = %self, status = %status, "Audit layer aborted request");
        (status, self.to_string()).into_response()
    }
}
