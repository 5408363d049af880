//! Field validation for accounts and account requests.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use super::account::{Account, ProfilePatch, RegisterRequest};
use crate::errors::{Error, Result};

lazy_static! {
    // Email validation: basic RFC 5322 compliant pattern
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("EMAIL_REGEX should be a valid regex pattern");
}

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length to prevent DoS
pub const MAX_PASSWORD_LENGTH: usize = 128;

const MAX_NAME_LENGTH: usize = 255;
const MAX_EMAIL_LENGTH: usize = 254;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Validate email format
pub fn validate_email(email: &str) -> std::result::Result<(), ValidationError> {
    if email.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(error("invalid_email", "Invalid email format"))
    }
}

/// Validate first/last name (non-empty after trimming, reasonable length)
pub fn validate_user_name(name: &str) -> std::result::Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(error("name_empty", "Name cannot be empty"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(error("name_too_long", "Name must be at most 255 characters"));
    }

    Ok(())
}

/// Enforce the password length policy on a plaintext password.
pub fn validate_password_policy(password: &str) -> Result<()> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(Error::password_policy(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(Error::password_policy(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    Ok(())
}

impl Validate for RegisterRequest {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_email(&self.email) {
            errors.add("email", err);
        }

        if let Err(err) = validate_user_name(&self.first_name) {
            errors.add("firstName", err);
        }

        if let Err(err) = validate_user_name(&self.last_name) {
            errors.add("lastName", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for ProfilePatch {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(email) = &self.email {
            if let Err(err) = validate_email(email) {
                errors.add("email", err);
            }
        }

        if let Some(first_name) = &self.first_name {
            if let Err(err) = validate_user_name(first_name) {
                errors.add("firstName", err);
            }
        }

        if let Some(last_name) = &self.last_name {
            if let Err(err) = validate_user_name(last_name) {
                errors.add("lastName", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// Required-field invariants checked right before an account is persisted

impl Validate for Account {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_email(&self.email) {
            errors.add("email", err);
        }

        if self.password_hash.is_empty() {
            errors.add("password", error("password_hash_empty", "Password hash cannot be empty"));
        }

        if let Err(err) = validate_user_name(&self.first_name) {
            errors.add("firstName", err);
        }

        if let Err(err) = validate_user_name(&self.last_name) {
            errors.add("lastName", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::UserId;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@x.com").is_err());
        assert!(validate_email("trailing@dot.").is_err());
        assert!(validate_email(&format!("{}@x.com", "a".repeat(260))).is_err());
    }

    #[test]
    fn test_validate_user_name() {
        assert!(validate_user_name("Ada").is_ok());
        assert!(validate_user_name("   ").is_err());
        assert!(validate_user_name(&"n".repeat(256)).is_err());
    }

    #[test]
    fn test_password_policy_boundaries() {
        assert!(matches!(
            validate_password_policy("abc"),
            Err(Error::PasswordPolicyViolation(msg)) if msg == "Password must be at least 6 characters"
        ));
        assert!(validate_password_policy("abcde").is_err());
        assert!(validate_password_policy("abcdef").is_ok());
        assert!(validate_password_policy(&"p".repeat(128)).is_ok());
        assert!(validate_password_policy(&"p".repeat(129)).is_err());
        // Length is counted in characters, not bytes
        assert!(validate_password_policy("ééééé").is_err());
        assert!(validate_password_policy("éééééé").is_ok());
    }

    #[test]
    fn test_register_request_collects_field_errors() {
        let request = RegisterRequest {
            email: "bad".into(),
            password: "secret1".into(),
            first_name: "".into(),
            last_name: "B".into(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("firstName"));
        assert!(!fields.contains_key("lastName"));
    }

    #[test]
    fn test_profile_patch_only_checks_supplied_fields() {
        assert!(ProfilePatch::default().validate().is_ok());
        assert!(ProfilePatch { first_name: Some("".into()), ..Default::default() }
            .validate()
            .is_err());
        assert!(ProfilePatch { email: Some("x@y.io".into()), ..Default::default() }
            .validate()
            .is_ok());
    }

    #[test]
    fn test_account_requires_hash() {
        let now = Utc::now();
        let account = Account {
            id: UserId::new(),
            email: "a@x.com".into(),
            password_hash: String::new(),
            first_name: "A".into(),
            last_name: "B".into(),
            created_at: now,
            updated_at: now,
        };
        assert!(account.validate().unwrap_err().field_errors().contains_key("password"));
    }
}
