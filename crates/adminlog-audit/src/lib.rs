//! # adminlog-audit
//!
//! Audit logging for administrative HTTP endpoints served with axum.
//!
//! This crate provides:
//! - A body-caching wrapper that makes request and response bodies re-readable
//! - A path logger that writes a coarse line for every request under `/admin`
//! - An audit interceptor that logs request and response bodies, with the
//!   caller identity, around every admin controller operation
//!
//! ## Line Format
//!
//! | Source | Layout |
//! |--------|--------|
//! | Path logger | `[<timestamp>][<uri>]` |
//! | Interceptor | `[LogAOP][<timestamp>][<method>][<url>][<identity>][<phase>][Body: <body>]` |
//!
//! The body segment is only present when there is body text.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use adminlog_audit::{AuditConfig, AuditInterceptor, ControllerRegistry, JwtResolver, TracingSink};
//! use axum::{Router, routing::get};
//!
//! let interceptor = AuditInterceptor::new(
//!     AuditConfig::default(),
//!     Arc::new(JwtResolver::new("secret")),
//!     Arc::new(TracingSink),
//! );
//!
//! let app: Router = ControllerRegistry::new(Arc::new(interceptor))
//!     .controller("UserAdminController", Router::new().route("/admin/users", get(|| async { "[]" })))
//!     .controller("HealthController", Router::new().route("/healthz", get(|| async { "ok" })))
//!     .into_router();
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod identity;
pub mod interceptor;
pub mod path_logger;
pub mod record;
pub mod registry;
pub mod sink;

pub use body::{BodyCache, CachedRequest, cache_bodies};
pub use config::{AuditConfig, AuditOutput, FailurePolicy, IdentityPolicy};
pub use error::{AuditError, IdentityError};
pub use identity::{JwtResolver, SubjectClaims, TokenResolver, resolve_identity};
pub use interceptor::{
    AuditInterceptor, HandlerFailed, audit_admin_operation, is_failure, mark_failed,
};
pub use path_logger::{PathLogger, log_admin_paths};
pub use record::{AuditRecord, Phase};
pub use registry::ControllerRegistry;
pub use sink::{AuditSink, FileSink, MemorySink, NullSink, TracingSink, create_sink};
