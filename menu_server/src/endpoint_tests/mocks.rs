use chrono::{DateTime, Utc};
use menu_engine::{
    analytics_objects::{OrderAverages, OrderStatistics, TimeWindow, TopProduct},
    db_types::{NewProduct, Product, ProductUpdate},
    traits::{AnalyticsError, AnalyticsManagement, ProductApiError, ProductManagement},
};
use mockall::mock;

mock! {
    pub ProductManager {}
    impl ProductManagement for ProductManager {
        async fn fetch_products(&self) -> Result<Vec<Product>, ProductApiError>;
        async fn fetch_product(&self, id: i64) -> Result<Option<Product>, ProductApiError>;
        async fn insert_product(&self, product: NewProduct, created_at: DateTime<Utc>) -> Result<Product, ProductApiError>;
        async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, ProductApiError>;
        async fn update_stock(&self, id: i64, in_stock: bool) -> Result<Option<Product>, ProductApiError>;
        async fn delete_product(&self, id: i64) -> Result<bool, ProductApiError>;
    }
}

mock! {
    pub AnalyticsManager {}
    impl AnalyticsManagement for AnalyticsManager {
        async fn order_statistics(&self, window: Option<TimeWindow>) -> Result<OrderStatistics, AnalyticsError>;
        async fn top_products(&self, window: Option<TimeWindow>, limit: u32) -> Result<Vec<TopProduct>, AnalyticsError>;
        async fn order_averages(&self, week_start: DateTime<Utc>, month_start: DateTime<Utc>) -> Result<OrderAverages, AnalyticsError>;
    }
}
