//! `SqliteDatabase` is the concrete backend of the menu engine.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{analytics, new_pool, orders, products, run_migrations, users};
use crate::{
    db_types::{Money, NewOrder, NewProduct, Order, OrderStatusType, Product, ProductUpdate, Role, User, UserCredentials},
    menu_api::analytics_objects::{OrderAverages, OrderStatistics, TimeWindow, TopProduct},
    traits::{
        AnalyticsError,
        AnalyticsManagement,
        AuthApiError,
        AuthManagement,
        OrderFlowError,
        OrderManagement,
        ProductApiError,
        ProductManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        run_migrations(&self.pool).await
    }
}

impl OrderManagement for SqliteDatabase {
    /// The header row and every item are written inside one transaction. If any insert fails, the transaction is
    /// dropped without committing, which rolls everything back.
    async fn insert_order(
        &self,
        order: NewOrder,
        total_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let id = orders::insert_order_row(&order, total_amount, created_at, &mut tx).await?;
        for item in &order.items {
            orders::insert_order_item(id, item, &mut tx).await?;
        }
        let saved = orders::fetch_order(id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{id} for table {} has been saved with {} items", saved.table_number, saved.items.len());
        Ok(saved)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(status, &mut conn).await
    }

    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatusType,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_status(id, status, now, &mut conn).await
    }

    async fn delete_order(&self, id: i64) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::delete_order(id, &mut conn).await?;
        if deleted {
            debug!("🗃️ Order #{id} and its items have been deleted");
        }
        Ok(deleted)
    }
}

impl ProductManagement for SqliteDatabase {
    async fn fetch_products(&self) -> Result<Vec<Product>, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_products(&mut conn).await
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(id, &mut conn).await
    }

    async fn insert_product(&self, product: NewProduct, created_at: DateTime<Utc>) -> Result<Product, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, created_at, &mut conn).await?;
        debug!("🗃️ Product #{} ({}) added to the catalog", product.id, product.name);
        Ok(product)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        products::update_product(id, update, &mut conn).await
    }

    async fn update_stock(&self, id: i64, in_stock: bool) -> Result<Option<Product>, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        products::update_stock(id, in_stock, &mut conn).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        products::delete_product(id, &mut conn).await
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_credentials(&self, username: &str) -> Result<Option<UserCredentials>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_credentials(username, &mut conn).await
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(id, &mut conn).await
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(username, password_hash, role, created_at, &mut conn).await
    }

    async fn count_users(&self) -> Result<i64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::count_users(&mut conn).await
    }
}

impl AnalyticsManagement for SqliteDatabase {
    async fn order_statistics(
        &self,
        window: Option<TimeWindow>,
    ) -> Result<OrderStatistics, AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        analytics::order_statistics(window, &mut conn).await
    }

    async fn top_products(
        &self,
        window: Option<TimeWindow>,
        limit: u32,
    ) -> Result<Vec<TopProduct>, AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        analytics::top_products(window, limit, &mut conn).await
    }

    async fn order_averages(
        &self,
        week_start: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<OrderAverages, AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        analytics::order_averages(week_start, month_start, &mut conn).await
    }
}
