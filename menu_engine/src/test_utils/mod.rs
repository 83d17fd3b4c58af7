//! Helpers for tests that need a real, freshly migrated database.
pub mod prepare_env;

pub use prepare_env::{prepare_test_env, random_db_path};
