//! Fan-out of order events to connected viewers
//!
//! Each subscriber owns a bounded queue. [`NotificationHub::broadcast`] never waits on a subscriber: if a queue is
//! full the event is dropped for that subscriber alone, and if the receiving end has gone away the subscriber is
//! removed. The publisher is never slowed down by a slow or dead viewer.
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
        MutexGuard,
        Weak,
    },
};

use log::*;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::events::OrderEvent;

pub const DEFAULT_BUFFER_SIZE: usize = 64;

type Subscribers = HashMap<u64, mpsc::Sender<OrderEvent>>;

struct HubInner {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl HubInner {
    // A panic while holding the lock cannot leave the map in a broken state, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }
}

/// A cheaply cloneable handle to the hub. All clones share the same subscriber set.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationHub ({} subscribers)", self.subscriber_count())
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl NotificationHub {
    /// Creates a hub where each subscriber can have up to `buffer_size` undelivered events queued.
    pub fn new(buffer_size: usize) -> Self {
        let inner = HubInner {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size: buffer_size.max(1),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Registers a new viewer. The subscription receives every event broadcast from now on, and nothing from before.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.buffer_size);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let count = {
            let mut subs = self.inner.lock();
            subs.insert(id, sender);
            subs.len()
        };
        debug!("📬️ Subscriber #{id} connected. {count} subscribers are listening");
        Subscription { id, receiver, hub: Arc::downgrade(&self.inner) }
    }

    /// Queues the event for every current subscriber and returns how many subscribers it was queued for.
    pub fn broadcast(&self, event: OrderEvent) -> usize {
        let mut delivered = 0;
        let mut subs = self.inner.lock();
        subs.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            },
            Err(TrySendError::Full(_)) => {
                warn!("📬️ Subscriber #{id} is not keeping up. Dropping {} for it", event.name());
                true
            },
            Err(TrySendError::Closed(_)) => {
                debug!("📬️ Subscriber #{id} has gone away. Removing it");
                false
            },
        });
        trace!("📬️ {} for order #{} queued for {delivered}/{} subscribers", event.name(), event.order().id, subs.len());
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().len()
    }
}

/// A viewer's handle on the hub. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<OrderEvent>,
    hub: Weak<HubInner>,
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription #{}", self.id)
    }
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next event. Returns `None` once the subscription has been cancelled or the hub is gone.
    pub async fn recv(&mut self) -> Option<OrderEvent> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<OrderEvent> {
        self.receiver.try_recv().ok()
    }

    /// Stops delivery to this subscription. Events already queued can still be drained with [`Self::try_recv`].
    pub fn unsubscribe(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            if hub.remove(self.id) {
                debug!("📬️ Subscriber #{} unsubscribed", self.id);
            }
        }
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
