//! Controller routers.
//!
//! Each controller is registered under its own name in
//! [`crate::routes::create_router`]; names containing `Admin` are audited.

pub mod comment_admin;
pub mod health;
pub mod user;
pub mod user_admin;
