//! # Authentication
//!
//! Credential hashing, session tokens, request identity resolution and the account workflow
//! built on top of them.

pub mod account;
pub mod account_service;
pub mod clock;
pub mod cookie;
pub mod hashing;
pub mod identity;
pub mod middleware;
pub mod token;
pub mod validation;

pub use account::{
    Account, AccountResponse, AuthResponse, LoginRequest, MessageResponse, ProfilePatch,
    RegisterRequest,
};
pub use account_service::{AccountService, AuthOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use cookie::{SessionCookieSettings, SESSION_COOKIE_NAME};
pub use identity::{extract_identity, Identity, RequestIdentity};
pub use token::{IssuedToken, TokenCodec, TokenError, TOKEN_LIFETIME_SECS};
