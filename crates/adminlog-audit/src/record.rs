//! Audit record and log line layout.
//!
//! One [`AuditRecord`] is built per intercepted admin invocation and rendered
//! twice, once per [`Phase`]:
//!
//! ```text
//! [LogAOP][<timestamp>][<method>][<url>][<identity>][<phase>][Body: <body>]
//! ```
//!
//! The body segment is omitted when there is no body text.

use chrono::{Local, NaiveDateTime};

/// Fixed tag that starts every interceptor line.
pub const LOG_TAG: &str = "[LogAOP]";

/// Layout shared by the interceptor and path logger timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Which side of a handler invocation a line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Response,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Response => write!(f, "response"),
        }
    }
}

/// Captured facts about one admin invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    id: Option<String>,
    url: String,
    method: String,
    timestamp: NaiveDateTime,
}

impl AuditRecord {
    /// Create a record stamped with the current local time.
    pub fn new(id: Option<String>, url: impl Into<String>, method: impl Into<String>) -> Self {
        Self::at(id, url, method, Local::now().naive_local())
    }

    /// Create a record with an explicit timestamp.
    pub fn at(
        id: Option<String>,
        url: impl Into<String>,
        method: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            method: method.into(),
            timestamp,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Render the line for `phase`, appending the body segment when `body` is non-empty.
    pub fn line(&self, phase: Phase, body: Option<&str>) -> String {
        let line = format!(
            "{}[{}][{}][{}][{}][{}]",
            LOG_TAG,
            format_timestamp(self.timestamp),
            self.method,
            self.url,
            self.id.as_deref().unwrap_or(""),
            phase
        );

        match body.filter(|b| !b.is_empty()) {
            Some(body) => format!("{}[Body: {}]", line, body),
            None => line,
        }
    }
}

/// Format a timestamp the way every audit line prints it.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
