//! HTTP request handlers organized by resource type

pub mod auth;
pub mod health;
pub mod users;

pub use auth::{login_handler, logout_handler, register_handler, WithCookie};
pub use health::{health_handler, HealthResponse};
pub use users::{get_me_handler, update_me_handler};
