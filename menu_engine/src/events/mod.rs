//! Real-time order notifications.
//!
//! Every order write is followed by exactly one [`OrderEvent`], which the [`NotificationHub`] fans out to everyone
//! currently subscribed. Delivery is best effort: there is no replay, and a subscriber that joins late never sees
//! earlier events. Consumers should treat an event as a signal to re-fetch, not as authoritative state.
mod event_types;
mod hub;

pub use event_types::OrderEvent;
pub use hub::{NotificationHub, Subscription, DEFAULT_BUFFER_SIZE};
