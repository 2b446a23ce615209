//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for admin audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit lines are emitted at all. Bodies are cached either way.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Path prefix matched by the path logger (case-sensitive).
    #[serde(default = "default_admin_path_prefix")]
    pub admin_path_prefix: String,

    /// Substring a controller name must contain to be audited.
    #[serde(default = "default_controller_marker")]
    pub controller_marker: String,

    /// Largest request or response body the audit layers will buffer.
    ///
    /// An oversized request is rejected with 413; an oversized response
    /// fails with 500.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// What to do when a body cannot be rendered for the log.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// What to do when a present credential cannot be resolved.
    #[serde(default)]
    pub identity_policy: IdentityPolicy,

    /// Where audit lines are written.
    #[serde(default)]
    pub output: AuditOutput,

    /// File path (for file output).
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Handling of body serialization failures in the audit path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Warn, drop the body segment, keep serving the request.
    #[default]
    Isolate,
    /// Abort the request with the serialization error.
    Propagate,
}

/// Handling of a present but unusable `Authorization` header.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Log an empty identity and continue.
    #[default]
    Lenient,
    /// Reject the invocation with 401 before the handler runs.
    Strict,
}

/// Audit line destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutput {
    /// Emit through `tracing`.
    #[default]
    Tracing,
    /// Append to a file.
    File,
    /// Keep lines in memory.
    Memory,
    /// Discard.
    Null,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            admin_path_prefix: default_admin_path_prefix(),
            controller_marker: default_controller_marker(),
            max_body_bytes: default_max_body_bytes(),
            failure_policy: FailurePolicy::default(),
            identity_policy: IdentityPolicy::default(),
            output: AuditOutput::default(),
            file_path: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_admin_path_prefix() -> String {
    "/admin".to_string()
}

fn default_controller_marker() -> String {
    "Admin".to_string()
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}
