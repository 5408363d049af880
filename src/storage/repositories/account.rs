//! Account repository
//!
//! Persistence for accounts, keyed by id and by normalized email. The store's unique email
//! index is authoritative: a racing insert or update that collides surfaces as
//! `DuplicateAccount`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

use crate::auth::account::Account;
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: UserId::from_string(row.id),
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find an account by id
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>>;

    /// Insert a new account
    async fn create(&self, account: Account) -> Result<Account>;

    /// Overwrite an existing account
    async fn save(&self, account: Account) -> Result<Account>;
}

const SELECT_ACCOUNT: &str =
    "SELECT id, email, password_hash, first_name, last_name, created_at, updated_at FROM users";

#[derive(Debug, Clone)]
pub struct SqlxAccountRepository {
    pool: DbPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn map_write_error(err: sqlx::Error, email: &str, context: &str) -> Error {
    let unique_violation =
        err.as_database_error().map(|db_err| db_err.is_unique_violation()).unwrap_or(false);

    if unique_violation {
        Error::duplicate_account(email)
    } else {
        Error::store(err, context)
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    #[instrument(skip(self), fields(user_email = %email), name = "db_find_account_by_email")]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNT} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::store(err, "Failed to fetch account by email"))?;

        Ok(row.map(Account::from))
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_find_account_by_id")]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::store(err, "Failed to fetch account"))?;

        Ok(row.map(Account::from))
    }

    #[instrument(skip(self, account), fields(user_id = %account.id, user_email = %account.email), name = "db_create_account")]
    async fn create(&self, account: Account) -> Result<Account> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, &account.email, "Failed to create account"))?;

        self.find_by_id(&account.id)
            .await?
            .ok_or_else(|| Error::internal("Account not found after creation"))
    }

    #[instrument(skip(self, account), fields(user_id = %account.id), name = "db_save_account")]
    async fn save(&self, account: Account) -> Result<Account> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $1, password_hash = $2, first_name = $3, last_name = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.updated_at)
        .bind(account.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, &account.email, "Failed to save account"))?;

        if result.rows_affected() == 0 {
            return Err(Error::account_not_found(account.id.as_str()));
        }

        self.find_by_id(&account.id)
            .await?
            .ok_or_else(|| Error::account_not_found(account.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repository() -> SqlxAccountRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("create sqlite pool");
        crate::storage::run_migrations(&pool).await.expect("run migrations");
        SqlxAccountRepository::new(pool)
    }

    fn account(email: &str) -> Account {
        let now = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
        Account {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = repository().await;
        let created = repo.create(account("a@x.com")).await.unwrap();

        assert_eq!(repo.find_by_email("a@x.com").await.unwrap(), Some(created.clone()));
        assert_eq!(repo.find_by_id(&created.id).await.unwrap(), Some(created));
        assert_eq!(repo.find_by_email("nobody@x.com").await.unwrap(), None);
        assert_eq!(repo.find_by_id(&UserId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unique_email_violation_is_duplicate_account() {
        let repo = repository().await;
        repo.create(account("a@x.com")).await.unwrap();

        let err = repo.create(account("a@x.com")).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateAccount { ref email } if email == "a@x.com"));

        // The index is case-insensitive
        let err = repo.create(account("A@X.COM")).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateAccount { .. }));
    }

    #[tokio::test]
    async fn save_overwrites_fields() {
        let repo = repository().await;
        let mut stored = repo.create(account("a@x.com")).await.unwrap();

        stored.first_name = "Grace".to_string();
        stored.email = "grace@x.com".to_string();
        let saved = repo.save(stored.clone()).await.unwrap();

        assert_eq!(saved.first_name, "Grace");
        assert_eq!(repo.find_by_email("grace@x.com").await.unwrap(), Some(saved));
        assert_eq!(repo.find_by_email("a@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_into_taken_email_is_duplicate_account() {
        let repo = repository().await;
        repo.create(account("a@x.com")).await.unwrap();
        let mut other = repo.create(account("b@x.com")).await.unwrap();

        other.email = "a@x.com".to_string();
        assert!(matches!(repo.save(other).await, Err(Error::DuplicateAccount { .. })));
    }

    #[tokio::test]
    async fn save_missing_account_is_not_found() {
        let repo = repository().await;
        let err = repo.save(account("ghost@x.com")).await.unwrap_err();
        assert!(matches!(err, Error::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn closed_pool_is_store_unavailable() {
        let repo = repository().await;
        repo.pool().close().await;

        let err = repo.find_by_email("a@x.com").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
    }
}
