//! Domain primitives shared by the auth and storage layers.

pub mod id;

pub use id::UserId;
