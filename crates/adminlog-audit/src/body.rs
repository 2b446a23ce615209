//! Body-caching wrapper.
//!
//! Buffers the request body once, before anything downstream reads it, and
//! publishes the bytes as a [`CachedRequest`] extension. Downstream handlers
//! still receive a body with the identical bytes. On the way out the response
//! body is buffered and released to the client exactly once, whether the
//! handler succeeded or produced an error response.

use crate::error::AuditError;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{Method, header, request::Parts},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;

/// Limits for the caching wrapper.
#[derive(Debug, Clone, Copy)]
pub struct BodyCache {
    pub max_body_bytes: usize,
}

impl BodyCache {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }
}

/// Replayable view of the current request.
///
/// Inserted by [`cache_bodies`]; its presence is what tells the audit
/// interceptor that it is running inside a live request context.
#[derive(Debug, Clone)]
pub struct CachedRequest {
    method: Method,
    url: String,
    body: Bytes,
}

impl CachedRequest {
    /// Capture method and URL from `parts` together with the buffered body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            url: request_url(parts),
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request body exactly as the client sent it.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Axum middleware that makes request and response bodies re-readable.
pub async fn cache_bodies(
    State(cache): State<BodyCache>,
    request: Request,
    next: Next,
) -> Result<Response, AuditError> {
    let (mut parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > cache.max_body_bytes) {
        return Err(AuditError::BodyTooLarge {
            limit: cache.max_body_bytes,
        });
    }

    let bytes = buffer(body, cache.max_body_bytes)
        .await
        .map_err(|e| e.into_request_error(cache.max_body_bytes))?;
    let context = CachedRequest::from_parts(&parts, bytes.clone());
    parts.extensions.insert(context);

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    // Release the buffered response. This runs for error responses too.
    let (response, _) = buffer_response(response, cache.max_body_bytes).await?;
    Ok(response)
}

/// Buffer a response body of at most `limit` bytes and return a response
/// carrying the same bytes.
pub async fn buffer_response(
    response: Response,
    limit: usize,
) -> Result<(Response, Bytes), AuditError> {
    let (parts, body) = response.into_parts();
    let bytes = buffer(body, limit)
        .await
        .map_err(|e| e.into_response_error(limit))?;
    Ok((Response::from_parts(parts, Body::from(bytes.clone())), bytes))
}

#[derive(Debug)]
enum BufferError {
    TooLarge,
    Read(String),
}

impl BufferError {
    fn into_request_error(self, limit: usize) -> AuditError {
        match self {
            Self::TooLarge => AuditError::BodyTooLarge { limit },
            Self::Read(e) => AuditError::RequestRead(e),
        }
    }

    fn into_response_error(self, limit: usize) -> AuditError {
        match self {
            Self::TooLarge => AuditError::ResponseTooLarge { limit },
            Self::Read(e) => AuditError::ResponseRead(e),
        }
    }
}

async fn buffer(body: Body, limit: usize) -> Result<Bytes, BufferError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            BufferError::TooLarge
        } else {
            BufferError::Read(inner.to_string())
        }
    })
}

/// Reconstruct the full request URL (scheme, host, path; no query).
pub fn request_url(parts: &Parts) -> String {
    let scheme = parts.uri.scheme_str().unwrap_or("http");
    let host = parts
        .uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            parts
                .headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        });

    match host {
        Some(host) => format!("{}://{}{}", scheme, host, parts.uri.path()),
        None => parts.uri.path().to_string(),
    }
}
