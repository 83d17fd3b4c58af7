use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Role, User, UserCredentials};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound(i64),
    #[error("User {0} already exists")]
    UserAlreadyExists(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Could not hash or verify password: {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthApiError::PasswordHashError(e.to_string())
    }
}

/// Storage for staff accounts. Password hashing and verification happen in [`crate::AuthApi`]; backends only ever
/// see hashes.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_credentials(&self, username: &str) -> Result<Option<UserCredentials>, AuthApiError>;

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, AuthApiError>;

    /// Fails with [`AuthApiError::UserAlreadyExists`] if the username is taken.
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<User, AuthApiError>;

    async fn count_users(&self) -> Result<i64, AuthApiError>;
}
