//! # Configuration Management
//!
//! Layered configuration for usergate: built-in defaults, an optional TOML file,
//! `USERGATE__*` environment overrides and the plain variables (`PORT`, `JWT_SECRET`,
//! `COOKIE_SECURE`, ...) understood by earlier deployments.

pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, DatabaseConfig, ObservabilityConfig, SameSitePolicy, ServerConfig,
    ENV_PREFIX, MIN_JWT_SECRET_LEN,
};
