// User store: the credential collaborator of the auth core

use axum::async_trait;
use sqlx::PgPool;

use crate::auth::{
    error::AuthError,
    models::{NewUser, User},
};

/// Read/insert access to stored credentials
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    /// Insert a user; a duplicate email is `EmailAlreadyExists`
    async fn create_user(&self, user: &NewUser) -> Result<User, AuthError>;

    async fn list_users(&self) -> Result<Vec<User>, AuthError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, role, name, phone, created_at";

/// PostgreSQL-backed user store
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, role, name, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.name)
        .bind(&user.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Check for unique constraint violation
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::EmailAlreadyExists;
                }
            }
            AuthError::from(e)
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
