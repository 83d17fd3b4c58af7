//! Catalog persistence.
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    traits::ProductApiError,
};

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, ProductApiError> {
    let products =
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY category, name").fetch_all(conn).await?;
    Ok(products)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, ProductApiError> {
    let product =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product(
    product: NewProduct,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Product, ProductApiError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
            INSERT INTO products (name, category, price, image_url, in_stock, popular, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.category)
    .bind(product.price)
    .bind(product.image_url)
    .bind(product.in_stock)
    .bind(product.popular)
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

/// Replaces the editable fields of a product. `in_stock` is left alone unless the update carries a value.
pub async fn update_product(
    id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, ProductApiError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
            UPDATE products SET
                name = $1,
                category = $2,
                price = $3,
                image_url = $4,
                popular = $5,
                in_stock = COALESCE($6, in_stock)
            WHERE id = $7
            RETURNING *;
        "#,
    )
    .bind(update.name)
    .bind(update.category)
    .bind(update.price)
    .bind(update.image_url)
    .bind(update.popular)
    .bind(update.in_stock)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

pub async fn update_stock(
    id: i64,
    in_stock: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, ProductApiError> {
    let product = sqlx::query_as::<_, Product>("UPDATE products SET in_stock = $1 WHERE id = $2 RETURNING *;")
        .bind(in_stock)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Hard delete. Order items that referenced the product keep their snapshots and lose the link.
pub async fn delete_product(id: i64, conn: &mut SqliteConnection) -> Result<bool, ProductApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
