//! # adminlog-server
//!
//! HTTP server that serves a small user/comment admin API behind the
//! `adminlog-audit` layers.

pub mod config;
pub mod controllers;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{AppConfig, load_config};
pub use error::ApiError;
pub use routes::{create_router, interceptor_from_config};
pub use state::AppState;
