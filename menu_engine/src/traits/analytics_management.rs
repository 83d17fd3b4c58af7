use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::menu_api::analytics_objects::{OrderAverages, OrderStatistics, TimeWindow, TopProduct};

#[derive(Debug, Clone, Error)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid analytics period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("Employees can only access shift analytics")]
    ShiftAnalyticsOnly,
}

impl From<sqlx::Error> for AnalyticsError {
    fn from(e: sqlx::Error) -> Self {
        AnalyticsError::DatabaseError(e.to_string())
    }
}

/// Read-only aggregation over orders. A [`TimeWindow`] restricts the orders by `created_at`; `None` means all time.
#[allow(async_fn_in_trait)]
pub trait AnalyticsManagement {
    async fn order_statistics(
        &self,
        window: Option<TimeWindow>,
    ) -> Result<OrderStatistics, AnalyticsError>;

    /// Best sellers by total quantity, grouped by the product name snapshotted on each order item.
    async fn top_products(
        &self,
        window: Option<TimeWindow>,
        limit: u32,
    ) -> Result<Vec<TopProduct>, AnalyticsError>;

    /// Average order value over all time, and over orders created since `week_start` and `month_start`.
    async fn order_averages(
        &self,
        week_start: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<OrderAverages, AnalyticsError>;
}
