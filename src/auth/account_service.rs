//! Account workflow: registration, login, logout and profile management.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;
use zeroize::Zeroizing;

use crate::auth::account::{Account, AccountResponse, LoginRequest, ProfilePatch, RegisterRequest};
use crate::auth::hashing;
use crate::auth::identity::Identity;
use crate::auth::token::{IssuedToken, TokenCodec};
use crate::auth::validation::validate_password_policy;
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::{AccountRepository, DbPool, SqlxAccountRepository};

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub account: AccountResponse,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    codec: Arc<TokenCodec>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, codec: Arc<TokenCodec>) -> Self {
        Self { repository, codec }
    }

    pub fn with_sqlx(pool: DbPool, codec: Arc<TokenCodec>) -> Self {
        Self::new(Arc::new(SqlxAccountRepository::new(pool)), codec)
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Create an account and issue its first session token.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email or empty names
    /// - `PasswordPolicyViolation` for a password outside 6..=128 characters
    /// - `DuplicateAccount` when the email is taken, including a concurrent insert
    #[instrument(skip(self, request), fields(email = %request.email.trim()))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthOutcome> {
        let request = request.normalized();
        request.validate()?;
        validate_password_policy(&request.password)?;

        let RegisterRequest { email, password, first_name, last_name } = request;

        if self.repository.find_by_email(&email).await?.is_some() {
            warn!("registration attempt for existing email");
            return Err(Error::duplicate_account(email));
        }

        let password_hash = hashing::hash_password_async(password).await?;

        let now = Utc::now();
        let account = Account {
            id: UserId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            created_at: now,
            updated_at: now,
        };
        account.validate()?;

        let account = self.repository.create(account).await?;
        let token = self.codec.mint(&account.identity())?;

        info!(user_id = %account.id, "account registered");
        Ok(AuthOutcome { account: account.into(), token })
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password both fail with `InvalidCredentials` after the same
    /// amount of hashing work.
    #[instrument(skip(self, request), fields(email = %request.email.trim()))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthOutcome> {
        let LoginRequest { email, password } = request;
        let password = Zeroizing::new(password);

        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::validation("Email and password are required"));
        }

        let email = Account::normalize_email(&email);

        let Some(account) = self.repository.find_by_email(&email).await? else {
            // Burn the same verification cost as a real account
            let _ = hashing::verify_password_async(password, hashing::dummy_hash().to_string())
                .await;
            warn!("login attempt for unknown email");
            return Err(Error::InvalidCredentials);
        };

        let rehash_with =
            hashing::needs_rehash(&account.password_hash).then(|| Zeroizing::new(password.to_string()));

        if !hashing::verify_password_async(password, account.password_hash.clone()).await {
            warn!(user_id = %account.id, "login attempt with incorrect password");
            return Err(Error::InvalidCredentials);
        }

        let account = match rehash_with {
            Some(password) => self.upgrade_password_hash(account, password).await,
            None => account,
        };

        let token = self.codec.mint(&account.identity())?;

        info!(user_id = %account.id, "login succeeded");
        Ok(AuthOutcome { account: account.into(), token })
    }

    /// End the caller's session. Tokens are stateless, so only the cookie is cleared upstream.
    pub fn logout(&self, identity: Option<&Identity>) {
        match identity {
            Some(identity) => info!(user_id = %identity.user_id, "session ended"),
            None => info!("logout without an active session"),
        }
    }

    /// Current account of the authenticated caller.
    #[instrument(skip(self, identity), fields(user_id = identity.map(|i| i.user_id.as_str())))]
    pub async fn get_profile(&self, identity: Option<&Identity>) -> Result<AccountResponse> {
        let account = self.load_authenticated(identity).await?;
        Ok(account.into())
    }

    /// Apply a partial profile update for the authenticated caller.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without an identity
    /// - `AccountNotFound` when the account was removed after the token was minted
    /// - `PasswordPolicyViolation` for a supplied password outside 6..=128 characters
    /// - `Validation` for a malformed email or empty names
    /// - `DuplicateAccount` when the new email belongs to another account
    #[instrument(skip(self, identity, patch), fields(user_id = identity.map(|i| i.user_id.as_str())))]
    pub async fn update_profile(
        &self,
        identity: Option<&Identity>,
        patch: ProfilePatch,
    ) -> Result<AccountResponse> {
        let mut account = self.load_authenticated(identity).await?;

        if patch.is_empty() {
            return Ok(account.into());
        }

        let patch = patch.normalized();
        if let Some(password) = &patch.password {
            validate_password_policy(password)?;
        }
        patch.validate()?;

        let ProfilePatch { email, password, first_name, last_name } = patch;

        if let Some(email) = email {
            if email != account.email {
                if let Some(existing) = self.repository.find_by_email(&email).await? {
                    if existing.id != account.id {
                        warn!(user_id = %account.id, "profile update to an email in use");
                        return Err(Error::duplicate_account(email));
                    }
                }
            }
            account.email = email;
        }

        if let Some(first_name) = first_name {
            account.first_name = first_name;
        }

        if let Some(last_name) = last_name {
            account.last_name = last_name;
        }

        let password_changed = password.is_some();
        if let Some(password) = password {
            account.password_hash = hashing::hash_password_async(password).await?;
        }

        account.updated_at = Utc::now();
        account.validate()?;

        let account = self.repository.save(account).await?;

        info!(user_id = %account.id, password_changed, "profile updated");
        Ok(account.into())
    }

    async fn load_authenticated(&self, identity: Option<&Identity>) -> Result<Account> {
        let identity = identity.ok_or(Error::Unauthorized)?;

        self.repository
            .find_by_id(&identity.user_id)
            .await?
            .ok_or_else(|| Error::account_not_found(identity.user_id.as_str()))
    }

    /// Replace a legacy hash after a successful login. Failures keep the old hash.
    async fn upgrade_password_hash(&self, account: Account, password: Zeroizing<String>) -> Account {
        let password_hash = match hashing::hash_password_async(password).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(user_id = %account.id, error = %e, "failed to rehash legacy password");
                return account;
            }
        };

        let upgraded = Account { password_hash, updated_at: Utc::now(), ..account.clone() };
        match self.repository.save(upgraded).await {
            Ok(saved) => {
                info!(user_id = %saved.id, "upgraded legacy password hash");
                saved
            }
            Err(e) => {
                warn!(user_id = %account.id, error = %e, "failed to store upgraded password hash");
                account
            }
        }
    }
}
