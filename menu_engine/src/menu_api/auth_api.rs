//! Staff authentication.
//!
//! Passwords are stored as bcrypt hashes. Hashing and verification are deliberately slow, so they run on tokio's
//! blocking thread pool rather than on the async executor.
use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Role, User},
    traits::{AuthApiError, AuthManagement},
};

pub const PASSWORD_HASH_COST: u32 = 10;

pub struct AuthApi<B> {
    db: B,
    hash_cost: u32,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db, hash_cost: PASSWORD_HASH_COST }
    }

    /// Overrides the bcrypt cost used for new passwords. Mostly useful for keeping tests fast.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Checks a username/password pair. Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthApiError> {
        let creds = match self.db.fetch_credentials(username).await? {
            Some(c) => c,
            None => {
                debug!("🔑️ Login attempt for unknown user {username}");
                return Err(AuthApiError::InvalidCredentials);
            },
        };
        let password = password.to_string();
        let hash = creds.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))??;
        if valid {
            info!("🔑️ {username} logged in as {}", creds.role);
            Ok(creds.into())
        } else {
            debug!("🔑️ Wrong password for {username}");
            Err(AuthApiError::InvalidCredentials)
        }
    }

    pub async fn fetch_user(&self, id: i64) -> Result<User, AuthApiError> {
        self.db.fetch_user(id).await?.ok_or(AuthApiError::UserNotFound(id))
    }

    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User, AuthApiError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthApiError::ValidationError("Username is required".into()));
        }
        if password.is_empty() {
            return Err(AuthApiError::ValidationError("Password is required".into()));
        }
        let password = password.to_string();
        let cost = self.hash_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))??;
        let user = self.db.insert_user(username, &hash, role, Utc::now()).await?;
        info!("🔑️ Created {role} account '{username}'");
        Ok(user)
    }

    /// Creates an owner account if, and only if, there are no accounts at all. Returns the new account, or `None` if
    /// accounts already existed.
    pub async fn ensure_bootstrap_owner(&self, username: &str, password: &str) -> Result<Option<User>, AuthApiError> {
        if self.db.count_users().await? > 0 {
            debug!("🔑️ Staff accounts already exist. No bootstrap owner needed");
            return Ok(None);
        }
        let user = self.create_user(username, password, Role::Owner).await?;
        warn!("🔑️ Created bootstrap owner account '{}'. Change its password before going live", user.username);
        Ok(Some(user))
    }
}
