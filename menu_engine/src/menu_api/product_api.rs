//! Catalog management.
use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Money, NewProduct, Product, ProductUpdate},
    traits::{ProductApiError, ProductManagement},
};

/// `ProductApi` fronts the menu catalog. Reads are public; the HTTP layer restricts writes to owners (stock changes
/// to any staff member).
pub struct ProductApi<B> {
    db: B,
}

impl<B: Debug> Debug for ProductApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductApi ({:?})", self.db)
    }
}

impl<B> ProductApi<B>
where B: ProductManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The whole menu, ordered by category and then by name.
    pub async fn fetch_products(&self) -> Result<Vec<Product>, ProductApiError> {
        self.db.fetch_products().await
    }

    pub async fn fetch_product(&self, id: i64) -> Result<Product, ProductApiError> {
        self.db.fetch_product(id).await?.ok_or(ProductApiError::ProductNotFound(id))
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ProductApiError> {
        validate_fields(&product.name, &product.category, product.price)?;
        let product = self.db.insert_product(product, Utc::now()).await?;
        info!("🍽️ Product #{} ({}) added to the menu", product.id, product.name);
        Ok(product)
    }

    pub async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Product, ProductApiError> {
        validate_fields(&update.name, &update.category, update.price)?;
        let product = self.db.update_product(id, update).await?.ok_or(ProductApiError::ProductNotFound(id))?;
        info!("🍽️ Product #{id} updated");
        Ok(product)
    }

    pub async fn set_stock(&self, id: i64, in_stock: bool) -> Result<Product, ProductApiError> {
        let product = self.db.update_stock(id, in_stock).await?.ok_or(ProductApiError::ProductNotFound(id))?;
        info!("🍽️ Product #{id} ({}) is {}", product.name, if in_stock { "back in stock" } else { "out of stock" });
        Ok(product)
    }

    /// Hard delete. Historical orders keep their snapshotted name and price.
    pub async fn delete_product(&self, id: i64) -> Result<(), ProductApiError> {
        if self.db.delete_product(id).await? {
            info!("🍽️ Product #{id} removed from the menu");
            Ok(())
        } else {
            Err(ProductApiError::ProductNotFound(id))
        }
    }
}

fn validate_fields(name: &str, category: &str, price: Money) -> Result<(), ProductApiError> {
    if name.trim().is_empty() {
        return Err(ProductApiError::ValidationError("Product name is required".into()));
    }
    if category.trim().is_empty() {
        return Err(ProductApiError::ValidationError("Product category is required".into()));
    }
    if price.is_negative() {
        return Err(ProductApiError::ValidationError("Product price cannot be negative".into()));
    }
    Ok(())
}
