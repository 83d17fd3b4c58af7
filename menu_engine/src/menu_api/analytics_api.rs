//! Sales reporting.
use std::fmt::Debug;

use chrono::{DateTime, Duration, Local, TimeZone};
use log::*;

use crate::{
    db_types::Role,
    menu_api::analytics_objects::{
        local_midnight,
        AnalyticsQuery,
        AnalyticsReport,
        OrderAverages,
        OrderStatistics,
        TOP_PRODUCTS_LIMIT,
    },
    traits::{AnalyticsError, AnalyticsManagement},
};

/// `AnalyticsApi` runs the sales reports. Windows are resolved against the server's local clock unless the caller
/// supplies a clock of their own through the `*_at` variants.
pub struct AnalyticsApi<B> {
    db: B,
}

impl<B: Debug> Debug for AnalyticsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnalyticsApi ({:?})", self.db)
    }
}

impl<B> AnalyticsApi<B>
where B: AnalyticsManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Builds the report a caller with the given role is allowed to see.
    ///
    /// Employees may only ask for the two shift windows. Owners may ask for any window and also get the best-selling
    /// products for that same window.
    pub async fn report_for(&self, role: Role, query: AnalyticsQuery) -> Result<AnalyticsReport, AnalyticsError> {
        self.report_at(role, query, &Local::now()).await
    }

    pub async fn report_at<Tz: TimeZone>(
        &self,
        role: Role,
        query: AnalyticsQuery,
        now: &DateTime<Tz>,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        if role == Role::Employee && !query.is_shift() {
            debug!("📊️ Employee asked for {query:?}, which is not a shift window");
            return Err(AnalyticsError::ShiftAnalyticsOnly);
        }
        let window = query.window(now)?;
        let statistics = self.db.order_statistics(window).await?;
        let top_products = match role {
            Role::Owner => Some(self.db.top_products(window, TOP_PRODUCTS_LIMIT).await?),
            Role::Employee => None,
        };
        trace!("📊️ {query:?} resolved to {window:?}: {} orders", statistics.total_orders);
        Ok(AnalyticsReport { period: query.period(), statistics, top_products })
    }

    /// Statistics for any window, without role checks or top products.
    pub async fn statistics_at<Tz: TimeZone>(
        &self,
        query: AnalyticsQuery,
        now: &DateTime<Tz>,
    ) -> Result<OrderStatistics, AnalyticsError> {
        let window = query.window(now)?;
        self.db.order_statistics(window).await
    }

    /// Average order value over all time, the last 7 days and the last 30 days (both counted from local midnight).
    pub async fn averages(&self) -> Result<OrderAverages, AnalyticsError> {
        self.averages_at(&Local::now()).await
    }

    pub async fn averages_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<OrderAverages, AnalyticsError> {
        let midnight = local_midnight(now);
        self.db.order_averages(midnight - Duration::days(7), midnight - Duration::days(30)).await
    }
}
