//! # Error Handling
//!
//! Crate-wide error type and result alias.

pub mod types;

pub use types::{Error, Result};
