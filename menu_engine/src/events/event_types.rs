use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// An order lifecycle event. The payload is always the fully hydrated order, items included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "order")]
pub enum OrderEvent {
    #[serde(rename = "order:created")]
    Created(Order),
    #[serde(rename = "order:updated")]
    Updated(Order),
}

impl OrderEvent {
    /// The wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "order:created",
            OrderEvent::Updated(_) => "order:updated",
        }
    }

    pub fn order(&self) -> &Order {
        match self {
            OrderEvent::Created(o) | OrderEvent::Updated(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            OrderEvent::Created(o) | OrderEvent::Updated(o) => o,
        }
    }
}
