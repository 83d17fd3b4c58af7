//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
use std::str::FromStr;

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod analytics;
pub mod orders;
pub mod products;
pub mod users;

/// Creates a connection pool. The database file is created if it does not exist yet, and foreign keys are always
/// enforced, since order items rely on them for cascading deletes.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Brings the schema up to date. Safe to call on every start-up.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqlxError> {
    sqlx::migrate!("./src/sqlite/migrations").run(pool).await?;
    info!("🗃️ Database migrations complete");
    Ok(())
}
