use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewProduct, Product, ProductUpdate};

#[derive(Debug, Clone, Error)]
pub enum ProductApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Product not found")]
    ProductNotFound(i64),
}

impl From<sqlx::Error> for ProductApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_check_violation() => {
                ProductApiError::ValidationError(format!("Product data is invalid: {}", db.message()))
            },
            e => ProductApiError::DatabaseError(e.to_string()),
        }
    }
}

/// Catalog storage. Deleting a product never touches order history; order items keep their snapshots.
#[allow(async_fn_in_trait)]
pub trait ProductManagement {
    /// All products, ordered by category and then by name.
    async fn fetch_products(&self) -> Result<Vec<Product>, ProductApiError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, ProductApiError>;

    async fn insert_product(&self, product: NewProduct, created_at: DateTime<Utc>) -> Result<Product, ProductApiError>;

    /// Returns `None` if the product does not exist.
    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, ProductApiError>;

    /// Returns `None` if the product does not exist.
    async fn update_stock(&self, id: i64, in_stock: bool) -> Result<Option<Product>, ProductApiError>;

    /// Returns false if there was no such product.
    async fn delete_product(&self, id: i64) -> Result<bool, ProductApiError>;
}
