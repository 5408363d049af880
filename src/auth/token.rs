//! Signed session tokens.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(hmac)` with
//! claims `{userId, email, iat, exp}`. The algorithm is fixed when the codec is built; a header
//! naming anything else is rejected before the signature is looked at.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::identity::Identity;
use crate::domain::UserId;
use crate::errors::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Token and session cookie lifetime in seconds (one day).
pub const TOKEN_LIFETIME_SECS: i64 = 86_400;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// A freshly minted token with its validity window.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[redacted]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Mints and parses session tokens with a process-wide signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("algorithm", &ALGORITHM).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::config("Token signing secret cannot be empty"));
        }

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| Error::config(format!("Invalid token signing secret: {}", e)))?;

        Ok(Self { mac, clock: Arc::new(SystemClock) })
    }

    /// Replace the time source used by [`TokenCodec::mint`] and [`TokenCodec::parse`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn lifetime(&self) -> Duration {
        Duration::seconds(TOKEN_LIFETIME_SECS)
    }

    pub fn mint(&self, identity: &Identity) -> Result<IssuedToken> {
        self.mint_at(identity, self.clock.now())
    }

    pub fn mint_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + TOKEN_LIFETIME_SECS;

        let header = Header { alg: ALGORITHM.to_string(), typ: Some(TOKEN_TYPE.to_string()) };
        let claims = Claims {
            user_id: identity.user_id.as_str().to_string(),
            email: identity.email.clone(),
            iat: issued_at,
            exp: expires_at,
        };

        let header = serde_json::to_vec(&header)
            .map_err(|e| Error::internal(format!("Failed to encode token header: {}", e)))?;
        let claims = serde_json::to_vec(&claims)
            .map_err(|e| Error::internal(format!("Failed to encode token claims: {}", e)))?;

        let signing_input =
            format!("{}.{}", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(claims));
        let signature = self.sign(&signing_input);

        Ok(IssuedToken {
            token: format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)),
            issued_at: timestamp(issued_at)?,
            expires_at: timestamp(expires_at)?,
        })
    }

    pub fn parse(&self, token: &str) -> std::result::Result<Identity, TokenError> {
        self.parse_at(token, self.clock.now())
    }

    /// Validate `token` as of `now`.
    ///
    /// Structure and encoding are checked first, then the algorithm and signature, and only
    /// then the claims and expiry.
    pub fn parse_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Identity, TokenError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header_bytes = decode_segment(header_b64)?;
        let claims_bytes = decode_segment(claims_b64)?;
        let signature = decode_segment(signature_b64)?;

        let header: Header =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::BadSignature);
        }

        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature).map_err(|_| TokenError::BadSignature)?;

        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;
        let user_id = UserId::parse(&claims.user_id).map_err(|_| TokenError::Malformed)?;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(Identity { user_id, email: claims.email })
    }

    fn sign(&self, signing_input: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn decode_segment(segment: &str) -> std::result::Result<Vec<u8>, TokenError> {
    if segment.is_empty() {
        return Err(TokenError::Malformed);
    }
    URL_SAFE_NO_PAD.decode(segment).map_err(|_| TokenError::Malformed)
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::internal(format!("Token timestamp out of range: {}", seconds)))
}
