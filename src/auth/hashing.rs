//! Password hashing and verification.
//!
//! New hashes are Argon2id PHC strings with the salt embedded. Hashes written by earlier
//! deployments of the service are bcrypt (`$2a$`/`$2b$`/`$2y$`); they still verify and are
//! reported by [`needs_rehash`] so a successful login can upgrade them.

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// Pre-computed hash verified against when the account does not exist, so an unknown email
/// costs the same as a wrong password.
lazy_static! {
    static ref DUMMY_HASH: String = hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$dW5rbm93bg".to_string());
}

pub fn password_hasher() -> Argon2<'static> {
    // OWASP baseline for Argon2id: 19 MiB, two passes, single lane
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::DEFAULT)
}

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(Error::invalid_credential_input("Password cannot be empty"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    if hash.is_empty() {
        return Err(Error::internal("Password hasher produced an empty hash"));
    }

    Ok(hash)
}

/// Verify a plaintext password against a stored hash.
///
/// Never fails: a malformed or unsupported stored hash verifies as `false`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if is_legacy_bcrypt(stored) {
        return match bcrypt::verify(password, stored) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "stored bcrypt hash could not be parsed");
                false
            }
        };
    }

    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "stored password hash could not be parsed");
            return false;
        }
    };

    match password_hasher().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => true,
        Err(PasswordHashError::Password) => false,
        Err(e) => {
            warn!(error = %e, "stored password hash is not verifiable");
            false
        }
    }
}

/// Whether the stored hash should be replaced by a fresh Argon2id hash.
pub fn needs_rehash(stored: &str) -> bool {
    !stored.starts_with("$argon2id$")
}

fn is_legacy_bcrypt(stored: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|prefix| stored.starts_with(prefix))
}

pub(crate) fn dummy_hash() -> &'static str {
    DUMMY_HASH.as_str()
}

/// [`hash_password`] on the blocking pool. The plaintext is zeroised once hashed.
pub async fn hash_password_async(password: impl Into<Zeroizing<String>>) -> Result<String> {
    let password = password.into();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::internal(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool. The plaintext is zeroised once verified.
pub async fn verify_password_async(password: impl Into<Zeroizing<String>>, stored: String) -> bool {
    let password = password.into();
    match tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await {
        Ok(matches) => matches,
        Err(e) => {
            error!(error = %e, "password verification task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
    }

    #[test]
    fn hashing_is_salted() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(hash_password(""), Err(Error::InvalidCredentialInput(_))));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("secret1", ""));
        assert!(!verify_password("secret1", "not-a-hash"));
        assert!(!verify_password("secret1", "$argon2id$v=19$garbage"));
        assert!(!verify_password("secret1", "$2b$10$short"));
    }

    #[test]
    fn legacy_bcrypt_hashes_verify_and_need_rehash() {
        let legacy = bcrypt::hash("secret1", 4).unwrap();
        assert!(verify_password("secret1", &legacy));
        assert!(!verify_password("wrong", &legacy));
        assert!(needs_rehash(&legacy));
        assert!(!needs_rehash(&hash_password("secret1").unwrap()));
    }

    #[test]
    fn dummy_hash_is_parseable() {
        assert!(PasswordHash::new(dummy_hash()).is_ok());
        assert!(!verify_password("anything", dummy_hash()));
    }

    #[tokio::test]
    async fn async_wrappers_match_sync_behaviour() {
        let hash = hash_password_async("secret1".to_string()).await.unwrap();
        assert!(verify_password_async("secret1".to_string(), hash.clone()).await);
        assert!(!verify_password_async("other".to_string(), hash).await);
        assert!(hash_password_async(String::new()).await.is_err());
    }
}
