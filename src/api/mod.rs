//! # HTTP API
//!
//! Axum routes exposing the account workflow: `/auth/*` for registration and login,
//! `/users/*` for the authenticated profile, plus `/health` and the OpenAPI docs.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiJson, AuthenticatedIdentity, ErrorBody};
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
