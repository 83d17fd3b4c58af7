//! Sales aggregation queries. Windows are half-open ranges on `orders.created_at`, optionally open-ended.
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::{
    db_types::Money,
    menu_api::analytics_objects::{OrderAverages, OrderStatistics, TimeWindow, TopProduct},
    traits::AnalyticsError,
};

fn push_window(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, window: Option<TimeWindow>) {
    if let Some(window) = window {
        builder.push(format!(" WHERE {column} >= ")).push_bind(window.start);
        if let Some(end) = window.end {
            builder.push(format!(" AND {column} < ")).push_bind(end);
        }
    }
}

/// Average of integer cents, rounded to the nearest cent.
fn avg_cents(v: f64) -> Money {
    Money::try_from_f64(v / 100.0).unwrap_or_default()
}

pub async fn order_statistics(
    window: Option<TimeWindow>,
    conn: &mut SqliteConnection,
) -> Result<OrderStatistics, AnalyticsError> {
    let mut builder = QueryBuilder::new(
        r#"SELECT
            COUNT(*) AS total_orders,
            COALESCE(SUM(total_amount), 0) AS total_revenue,
            COALESCE(AVG(total_amount), 0.0) AS avg_order_value,
            COUNT(CASE WHEN payment_method = 'cash' THEN 1 END) AS cash_orders,
            COUNT(CASE WHEN payment_method = 'card' THEN 1 END) AS card_orders
        FROM orders"#,
    );
    push_window(&mut builder, "created_at", window);
    let row = builder.build().fetch_one(conn).await?;
    let stats = OrderStatistics {
        total_orders: row.try_get("total_orders")?,
        total_revenue: Money::from_cents(row.try_get("total_revenue")?),
        avg_order_value: avg_cents(row.try_get("avg_order_value")?),
        cash_orders: row.try_get("cash_orders")?,
        card_orders: row.try_get("card_orders")?,
    };
    Ok(stats)
}

pub async fn top_products(
    window: Option<TimeWindow>,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<TopProduct>, AnalyticsError> {
    let mut builder = QueryBuilder::new(
        r#"SELECT
            oi.product_name AS product_name,
            SUM(oi.quantity) AS total_quantity,
            COUNT(DISTINCT oi.order_id) AS order_count
        FROM order_items oi JOIN orders o ON oi.order_id = o.id"#,
    );
    push_window(&mut builder, "o.created_at", window);
    builder.push(" GROUP BY oi.product_name ORDER BY total_quantity DESC, oi.product_name ASC LIMIT ");
    builder.push_bind(i64::from(limit));
    let products = builder.build_query_as::<TopProduct>().fetch_all(conn).await?;
    Ok(products)
}

pub async fn order_averages(
    week_start: DateTime<Utc>,
    month_start: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OrderAverages, AnalyticsError> {
    let row = sqlx::query(
        r#"SELECT
            COALESCE(AVG(total_amount), 0.0) AS overall_avg,
            COALESCE(AVG(CASE WHEN created_at >= $1 THEN total_amount END), 0.0) AS weekly_avg,
            COALESCE(AVG(CASE WHEN created_at >= $2 THEN total_amount END), 0.0) AS monthly_avg
        FROM orders"#,
    )
    .bind(week_start)
    .bind(month_start)
    .fetch_one(conn)
    .await?;
    let averages = OrderAverages {
        overall_avg: avg_cents(row.try_get("overall_avg")?),
        weekly_avg: avg_cents(row.try_get("weekly_avg")?),
        monthly_avg: avg_cents(row.try_get("monthly_avg")?),
    };
    Ok(averages)
}
