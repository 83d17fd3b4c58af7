//! # Backend contracts
//!
//! This module defines the behaviour a storage backend must expose in order to power the menu engine. Each API object
//! in [`crate::menu_api`] is generic over the subset of these traits it needs, and receives the backend as an explicit
//! dependency. [`crate::SqliteDatabase`] implements all of them.
//!
//! * [`OrderManagement`] reads and writes orders together with their line items, as a single consistency unit.
//! * [`ProductManagement`] provides catalog CRUD.
//! * [`AuthManagement`] stores staff accounts and their password hashes.
//! * [`AnalyticsManagement`] runs the read-only sales aggregations.
mod analytics_management;
mod auth_management;
mod order_management;
mod product_management;

pub use analytics_management::{AnalyticsError, AnalyticsManagement};
pub use auth_management::{AuthApiError, AuthManagement};
pub use order_management::{OrderFlowError, OrderManagement};
pub use product_management::{ProductApiError, ProductManagement};
