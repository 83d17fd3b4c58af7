use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Money, NewOrder, Order, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Order not found")]
    OrderNotFound(i64),
    #[error("Order #{id} cannot move from {from} to {to}")]
    IllegalTransition { id: i64, from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                OrderFlowError::ValidationError("Order refers to a product that does not exist".to_string())
            },
            sqlx::Error::Database(ref db) if db.is_check_violation() => {
                OrderFlowError::ValidationError(format!("Order data is invalid: {}", db.message()))
            },
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

/// The `OrderManagement` trait defines how orders and their line items are persisted.
///
/// An order and its items are always written and read as a unit. Backends never return a partially hydrated order.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order and all its items in a single atomic transaction, stamping `created_at` with the given time.
    /// If any item fails to insert, nothing is stored.
    ///
    /// The caller is responsible for validating the order and for computing `total_amount`, which is stored verbatim.
    async fn insert_order(
        &self,
        order: NewOrder,
        total_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError>;

    /// Fetches a single order, with its items in insertion order. Returns `None` if the order does not exist.
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Fetches all orders, newest first, optionally restricted to a single status.
    async fn fetch_orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>, OrderFlowError>;

    /// Writes the new status. Entering `completed` stamps `completed_at` with `now`, unless the order was already
    /// completed, in which case the original stamp is kept. Every other status clears `completed_at`.
    ///
    /// Returns the updated order, or `None` if the order does not exist.
    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatusType,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, OrderFlowError>;

    /// Hard-deletes an order. Its items go with it. Returns false if there was no such order.
    async fn delete_order(&self, id: i64) -> Result<bool, OrderFlowError>;
}
