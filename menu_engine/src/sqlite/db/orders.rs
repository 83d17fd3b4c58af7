//! Order persistence. An order row is never returned without its items.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    traits::OrderFlowError,
};

/// Inserts the order header row only. This is not atomic. Call it from inside a transaction together with
/// [`insert_order_item`], and pass `&mut *tx` as the connection argument.
pub async fn insert_order_row(
    order: &NewOrder,
    total_amount: Money,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, OrderFlowError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO orders (table_number, status, payment_method, total_amount, additional_info, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id;
        "#,
    )
    .bind(order.table_number)
    .bind(OrderStatusType::New)
    .bind(order.payment_method)
    .bind(total_amount)
    .bind(order.additional_info.as_deref())
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Order header #{id} inserted for table {}", order.table_number);
    Ok(id)
}

pub async fn insert_order_item(
    order_id: i64,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<i64, OrderFlowError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, price_at_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.name.as_str())
    .bind(item.quantity)
    .bind(item.price)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Fetches a single order, hydrated with its items in insertion order.
pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderFlowError> {
    let order =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.items = fetch_items_for_order(id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, OrderFlowError> {
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches all orders, newest first, each hydrated with its items. Two queries are issued regardless of the number of
/// orders.
pub async fn fetch_orders(
    status: Option<OrderStatusType>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderFlowError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    if let Some(status) = status {
        builder.push(" WHERE status = ").push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    let mut orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    if orders.is_empty() {
        return Ok(orders);
    }
    let mut builder = QueryBuilder::new("SELECT * FROM order_items WHERE order_id IN (");
    let mut ids = builder.separated(", ");
    for order in &orders {
        ids.push_bind(order.id);
    }
    builder.push(") ORDER BY id");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    let mut by_order = HashMap::<i64, Vec<OrderItem>>::with_capacity(orders.len());
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    debug!("🗃️ Fetched {} orders", orders.len());
    Ok(orders)
}

/// Writes `status` and maintains `completed_at` in the same statement, so that a concurrent reader never sees one
/// without the other.
pub async fn update_status(
    id: i64,
    status: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderFlowError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders SET
                completed_at = CASE
                    WHEN $1 = 'completed' THEN COALESCE(CASE WHEN status = 'completed' THEN completed_at END, $2)
                    ELSE NULL
                END,
                status = $1
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match order {
        Some(mut order) => {
            order.items = fetch_items_for_order(id, conn).await?;
            trace!("🗃️ Order #{id} is now {status}");
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Deletes the order. The `ON DELETE CASCADE` constraint removes its items.
pub async fn delete_order(id: i64, conn: &mut SqliteConnection) -> Result<bool, OrderFlowError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
