//! SQLite backend for the menu engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
