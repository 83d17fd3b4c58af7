//! Staff account persistence.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`crate::AuthApi`] methods
//! instead, which take care of password hashing.
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Role, User, UserCredentials},
    traits::AuthApiError,
};

pub async fn fetch_credentials(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserCredentials>, AuthApiError> {
    let creds = sqlx::query_as::<_, UserCredentials>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(conn)
        .await?;
    Ok(creds)
}

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let user = sqlx::query_as::<_, User>("SELECT id, username, role, created_at FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn insert_user(
    username: &str,
    password_hash: &str,
    role: Role,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<User, AuthApiError> {
    let result = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (username, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, role, created_at;
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .bind(created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => {
            debug!("🗃️ Created {role} account for {username} with id {}", user.id);
            Ok(user)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AuthApiError::UserAlreadyExists(username.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn count_users(conn: &mut SqliteConnection) -> Result<i64, AuthApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(conn).await?;
    Ok(count)
}
