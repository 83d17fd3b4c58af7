//! # Menu engine public API
//!
//! The `menu_api` module exposes the programmatic API of the engine. Each API object is created by handing it a
//! backend that implements the traits it needs, so handlers never reach for a global connection.
//!
//! * [`order_flow_api`] is the order service: creation, status changes and the notifications that go with them.
//! * [`product_api`] manages the menu catalog.
//! * [`auth_api`] verifies staff credentials and manages staff accounts.
//! * [`analytics_api`] produces the sales reports.
//!
//! ```rust,ignore
//! use menu_engine::{NotificationHub, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/menu.db", 5).await?;
//! let orders = OrderFlowApi::new(db, NotificationHub::default());
//! let mut viewer = orders.subscribe();
//! let order = orders.create_order(new_order).await?;
//! assert_eq!(viewer.recv().await.unwrap().order().id, order.id);
//! ```
pub mod analytics_api;
pub mod analytics_objects;
pub mod auth_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod product_api;
