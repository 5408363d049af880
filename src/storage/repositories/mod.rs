//! Repository modules for data access

pub mod account;

pub use account::{AccountRepository, SqlxAccountRepository};
