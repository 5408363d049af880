//! # Observability Infrastructure
//!
//! Structured logging for usergate.

pub mod logging;

pub use logging::{init_logging, log_config_info, sanitize_database_url};
