//! # usergate
//!
//! Account registration, login and profile management over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! REST API (axum) → AccountService → AccountRepository → SQLite
//!        ↓                ↓
//!  identity middleware   credential hashing + token codec
//! ```
//!
//! - **auth**: Argon2id credential hashing, HS256 session tokens, identity extraction from the
//!   `Authorization` header or the `jwt` cookie, and the account workflow.
//! - **storage**: SQLx pool, embedded migrations and the account repository.
//! - **api**: routes, handlers, error mapping and OpenAPI docs.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
