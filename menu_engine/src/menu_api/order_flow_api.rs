use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Money, NewOrder, Order, OrderStatusType},
    events::{NotificationHub, OrderEvent, Subscription},
    menu_api::order_objects::{OrderPolicies, PricingPolicy},
    traits::{OrderFlowError, OrderManagement, ProductApiError, ProductManagement},
};

impl From<ProductApiError> for OrderFlowError {
    fn from(e: ProductApiError) -> Self {
        match e {
            ProductApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            ProductApiError::ValidationError(s) => OrderFlowError::ValidationError(s),
            ProductApiError::ProductNotFound(id) => {
                OrderFlowError::ValidationError(format!("Product {id} does not exist"))
            },
        }
    }
}

/// `OrderFlowApi` is the order service. It validates and persists orders, moves them through the status pipeline,
/// and tells every connected viewer about each change via the [`NotificationHub`].
///
/// Events are only broadcast after the write has succeeded, and broadcasting never waits on a viewer.
pub struct OrderFlowApi<B> {
    db: B,
    hub: NotificationHub,
    policies: OrderPolicies,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.policies)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, hub: NotificationHub) -> Self {
        Self { db, hub, policies: OrderPolicies::default() }
    }

    pub fn with_policies(mut self, policies: OrderPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn policies(&self) -> OrderPolicies {
        self.policies
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Registers a viewer for all order events from now on.
    pub fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + ProductManagement
{
    /// Places a new order.
    ///
    /// The order is validated, priced according to the [`PricingPolicy`], and written atomically together with all
    /// its items. The total is the sum of `price * quantity` over the (possibly re-priced) lines and is never
    /// recomputed afterwards. On success an `order:created` event carrying the hydrated order is broadcast.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        validate_new_order(&order)?;
        let order = match self.policies.pricing {
            PricingPolicy::ClientSupplied => order,
            PricingPolicy::Catalog => self.price_from_catalog(order).await?,
        };
        let total = order_total(&order)?;
        let table = order.table_number;
        let saved = self.db.insert_order(order, total, Utc::now()).await?;
        info!("🔄️📦️ Order #{} placed for table {table}. Total: {}", saved.id, saved.total_amount);
        let n = self.hub.broadcast(OrderEvent::Created(saved.clone()));
        trace!("🔄️📦️ order:created for #{} sent to {n} viewers", saved.id);
        Ok(saved)
    }

    async fn price_from_catalog(&self, mut order: NewOrder) -> Result<NewOrder, OrderFlowError> {
        for item in &mut order.items {
            let id = item.product_id.ok_or_else(|| {
                OrderFlowError::ValidationError(format!("{} is not a menu item", item.name))
            })?;
            let product = self.db.fetch_product(id).await?.ok_or(ProductApiError::ProductNotFound(id))?;
            if !product.in_stock {
                return Err(OrderFlowError::ValidationError(format!("{} is out of stock", product.name)));
            }
            if item.price != product.price {
                debug!("🔄️📦️ Re-pricing {} from {} to the catalog price of {}", product.name, item.price, product.price);
            }
            item.name = product.name;
            item.price = product.price;
        }
        Ok(order)
    }

    /// Moves an order to `status`.
    ///
    /// Entering `completed` stamps `completed_at` (an already-completed order keeps its original stamp); every other
    /// status clears it. Under [`crate::TransitionPolicy::Strict`], anything other than staying put or a single step
    /// forward is rejected with [`OrderFlowError::IllegalTransition`]. On success an `order:updated` event is
    /// broadcast.
    pub async fn set_order_status(&self, id: i64, status: OrderStatusType) -> Result<Order, OrderFlowError> {
        if !self.policies.transitions.allows_all() {
            let current = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
            if !current.status.can_transition_to(status, self.policies.transitions) {
                warn!("🔄️🚦️ Rejected status change for order #{id}: {} → {status}", current.status);
                return Err(OrderFlowError::IllegalTransition { id, from: current.status, to: status });
            }
        }
        let updated =
            self.db.update_order_status(id, status, Utc::now()).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        info!("🔄️🚦️ Order #{id} is now {status}");
        let n = self.hub.broadcast(OrderEvent::Updated(updated.clone()));
        trace!("🔄️🚦️ order:updated for #{id} sent to {n} viewers");
        Ok(updated)
    }

    /// All orders, newest first, optionally restricted to one status.
    pub async fn list_orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders(status).await
    }

    pub async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(id).await
    }

    /// Removes an order together with its items. No event is broadcast.
    pub async fn delete_order(&self, id: i64) -> Result<(), OrderFlowError> {
        match self.db.delete_order(id).await? {
            true => Ok(()),
            false => Err(OrderFlowError::OrderNotFound(id)),
        }
    }
}

/// Checks everything about an incoming order that does not need the database.
pub fn validate_new_order(order: &NewOrder) -> Result<(), OrderFlowError> {
    let invalid = |msg: &str| Err(OrderFlowError::ValidationError(msg.to_string()));
    if order.table_number <= 0 {
        return invalid("Table number must be a positive integer");
    }
    if order.items.is_empty() {
        return invalid("Order must contain at least one item");
    }
    for item in &order.items {
        if item.name.trim().is_empty() {
            return invalid("Every item needs a name");
        }
        if item.quantity <= 0 {
            return invalid("Item quantity must be a positive integer");
        }
        if item.price < Money::default() {
            return invalid("Item price cannot be negative");
        }
    }
    order_total(order).map(|_| ())
}

fn order_total(order: &NewOrder) -> Result<Money, OrderFlowError> {
    order.total().ok_or_else(|| OrderFlowError::ValidationError("Order total is too large".to_string()))
}
