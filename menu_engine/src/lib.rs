//! Menu Engine
//!
//! The menu engine is the backend of a table-side QR menu: customers place orders from their table, staff move the
//! orders through `new → in_progress → ready → completed`, and owners manage the catalog and read sales reports.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`SqliteDatabase`]). The backend contracts live in [`traits`], and SQLite is the supported backend.
//!    You should never need to touch the database directly. The exception is the data types, which are defined in
//!    [`db_types`] and are public.
//! 2. The public API ([`mod@menu_api`]): [`OrderFlowApi`], [`ProductApi`], [`AuthApi`] and [`AnalyticsApi`].
//! 3. Real-time notifications ([`events`]). Every order write is followed by an `order:created` or `order:updated`
//!    event, fanned out by the [`NotificationHub`] to everyone watching.
pub mod db_types;
pub mod events;
pub mod menu_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use events::{NotificationHub, OrderEvent, Subscription};
pub use menu_api::{
    analytics_api::AnalyticsApi,
    analytics_objects,
    auth_api::AuthApi,
    order_flow_api::OrderFlowApi,
    order_objects::{self, OrderPolicies, PricingPolicy, TransitionPolicy},
    product_api::ProductApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AnalyticsError, AuthApiError, OrderFlowError, ProductApiError};
