//! Server-sent events
//!
//! Each connection to `/api/events` gets its own [`Subscription`] on the notification hub. The stream opens with a
//! `: connected` comment, then writes one frame per order event:
//!
//! ```text
//! event: order:created
//! data: {"id":12,"table_number":4,...}
//! ```
//!
//! A comment line is sent every so often while the kitchen is quiet so that dead connections are noticed. When the
//! client goes away, actix drops the stream, and with it the subscription.
use std::{future::ready, time::Duration};

use actix_web::Error;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use log::*;
use menu_engine::{OrderEvent, Subscription};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const CONNECTED_FRAME: &[u8] = b": connected\n\n";
pub const HEARTBEAT_FRAME: &[u8] = b": ping\n\n";
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Formats an event as a single SSE frame.
pub fn sse_frame(event: &OrderEvent) -> Bytes {
    match serde_json::to_string(event.order()) {
        Ok(json) => Bytes::from(format!("event: {}\ndata: {json}\n\n", event.name())),
        Err(e) => {
            error!("💻️ Could not serialize {} for order #{}. {e}", event.name(), event.order().id);
            Bytes::from_static(b": dropped event\n\n")
        },
    }
}

pub fn event_stream(subscription: Subscription, heartbeat: Duration) -> impl Stream<Item = Result<Bytes, Error>> {
    let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let connected = stream::once(ready(Ok::<_, Error>(Bytes::from_static(CONNECTED_FRAME))));
    let events = stream::unfold((subscription, ticker), |(mut subscription, mut ticker)| async move {
        let frame = tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => sse_frame(&event),
                None => {
                    debug!("💻️ Subscription was closed. Ending the event stream");
                    return None;
                },
            },
            _ = ticker.tick() => Bytes::from_static(HEARTBEAT_FRAME),
        };
        Some((Ok::<_, Error>(frame), (subscription, ticker)))
    });
    connected.chain(events)
}
