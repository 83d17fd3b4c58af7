//! The staff view of the order queue.
//!
//! Notices from the live feed only say that something changed. The board answers each one with a full fetch and
//! never patches its list from the event payload.
use anyhow::Result;
use futures::{Stream, StreamExt};
use log::*;
use menu_engine::db_types::{Order, OrderStatusType};

use crate::client::{MenuClient, OrderEventNotice};

/// Where the board gets its orders from.
#[allow(async_fn_in_trait)]
pub trait OrderSource {
    async fn fetch_orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>>;
}

impl OrderSource for MenuClient {
    async fn fetch_orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>> {
        self.orders(status).await
    }
}

impl<T: OrderSource> OrderSource for &T {
    async fn fetch_orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>> {
        (**self).fetch_orders(status).await
    }
}

pub struct OrderBoard<S> {
    source: S,
    filter: Option<OrderStatusType>,
    orders: Vec<Order>,
    refreshes: usize,
}

impl<S: OrderSource> OrderBoard<S> {
    pub fn new(source: S) -> Self {
        Self { source, filter: None, orders: Vec::new(), refreshes: 0 }
    }

    /// Only show orders with this status.
    pub fn with_filter(mut self, status: OrderStatusType) -> Self {
        self.filter = Some(status);
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    pub fn count(&self, status: OrderStatusType) -> usize {
        self.orders.iter().filter(|o| o.status == status).count()
    }

    /// Replaces the list with a fresh fetch from the server.
    pub async fn refresh(&mut self) -> Result<&[Order]> {
        self.orders = self.source.fetch_orders(self.filter).await?;
        self.refreshes += 1;
        trace!("Order board refreshed: {} orders", self.orders.len());
        Ok(&self.orders)
    }

    /// Refreshes on every notice until the feed ends, calling `on_change` with the new list each time.
    ///
    /// A failed refresh is logged and skipped; the next notice tries again. An error on the feed itself ends the run.
    pub async fn run<E, F>(&mut self, events: E, mut on_change: F) -> Result<()>
    where
        E: Stream<Item = Result<OrderEventNotice>>,
        F: FnMut(&OrderEventNotice, &[Order]),
    {
        let mut events = std::pin::pin!(events);
        while let Some(notice) = events.next().await {
            let notice = notice?;
            debug!("{} for order #{}. Refreshing", notice.event, notice.order_id);
            match self.refresh().await {
                Ok(orders) => on_change(&notice, orders),
                Err(e) => warn!("Could not refresh the order board. {e}"),
            }
        }
        info!("The order feed has closed");
        Ok(())
    }
}
