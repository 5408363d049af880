//! Account records and the request/response shapes of the account workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::auth::identity::Identity;
use crate::domain::UserId;

/// Stored account, including the password hash. Never serialized to callers.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Account {
    /// Normalize email for uniqueness checks and lookups
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn identity(&self) -> Identity {
        Identity { user_id: self.id.clone(), email: self.email.clone() }
    }
}

/// Public view of an account. Carries no password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "a@x.com")]
    pub email: String,
    #[schema(example = "secret1", format = Password)]
    pub password: String,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl RegisterRequest {
    pub(crate) fn normalized(self) -> Self {
        Self {
            email: Account::normalize_email(&self.email),
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "a@x.com")]
    pub email: String,
    #[schema(example = "secret1", format = Password)]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Partial profile update. `None` leaves a field unchanged; there is no way to clear a field.
#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    pub email: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl fmt::Debug for ProfilePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilePatch")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }

    pub(crate) fn normalized(self) -> Self {
        Self {
            email: self.email.map(|email| Account::normalize_email(&email)),
            password: self.password,
            first_name: self.first_name.map(|name| name.trim().to_string()),
            last_name: self.last_name.map(|name| name.trim().to_string()),
        }
    }
}

/// Body returned by register and login; the token is also set as the session cookie.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: AccountResponse,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: UserId::new(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn response_has_no_password_field() {
        let json = serde_json::to_value(AccountResponse::from(account())).unwrap();
        let object = json.as_object().unwrap();

        assert!(object.contains_key("firstName"));
        assert!(object.contains_key("createdAt"));
        assert!(!object.keys().any(|key| key.to_lowercase().contains("password")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", account());
        assert!(!rendered.contains("argon2id"));

        let request = RegisterRequest { password: "secret1".into(), ..Default::default() };
        assert!(!format!("{:?}", request).contains("secret1"));

        let patch = ProfilePatch { password: Some("secret1".into()), ..Default::default() };
        assert!(!format!("{:?}", patch).contains("secret1"));
    }

    #[test]
    fn patch_deserializes_missing_and_null_as_unchanged() {
        let patch: ProfilePatch =
            serde_json::from_str(r#"{"firstName":"Grace","lastName":null}"#).unwrap();
        assert_eq!(patch.first_name.as_deref(), Some("Grace"));
        assert!(patch.last_name.is_none());
        assert!(patch.email.is_none());
        assert!(!patch.is_empty());
        assert!(ProfilePatch::default().is_empty());
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        let request = RegisterRequest {
            email: "  A@X.Com ".into(),
            password: " keep spaces ".into(),
            first_name: " Ada ".into(),
            last_name: "Lovelace ".into(),
        }
        .normalized();

        assert_eq!(request.email, "a@x.com");
        assert_eq!(request.password, " keep spaces ");
        assert_eq!(request.first_name, "Ada");
        assert_eq!(request.last_name, "Lovelace");
    }
}
