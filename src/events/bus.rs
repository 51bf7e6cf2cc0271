//! Publish/subscribe bus for [`ClientEvent`]s.
//!
//! Two kinds of subscribers:
//!
//! - handlers, called synchronously on the publishing thread in subscription
//!   order (the error banner, link menus, view reloads)
//! - bounded channel receivers, fed with `try_send` so a slow consumer never
//!   blocks publishing; overflow is dropped and counted
//!
//! Handlers are snapshotted before they run, so a handler may subscribe,
//! unsubscribe or publish without deadlocking the bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;

use super::types::{ClientEvent, EventFilter};
use crate::lock;

/// Identifies one handler subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

struct HandlerSubscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Handler,
}

struct ChannelSubscription {
    filter: EventFilter,
    sender: Sender<EventEnvelope>,
}

/// An event with the time it was published, as delivered to channels.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub published_at: DateTime<Utc>,
    pub event: ClientEvent,
}

#[derive(Default)]
struct BusInner {
    handlers: Mutex<Vec<HandlerSubscription>>,
    channels: Mutex<Vec<ChannelSubscription>>,
    next_id: AtomicU64,
    published: AtomicU64,
    dropped: AtomicU64,
}

/// The shared event bus. Clones publish to the same subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &lock(&self.inner.handlers).len())
            .field("channels", &lock(&self.inner.channels).len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for events matching `filter`.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.handlers).push(HandlerSubscription {
            id,
            filter,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = lock(&self.inner.handlers);
        let before = handlers.len();
        handlers.retain(|subscription| subscription.id != id);
        handlers.len() != before
    }

    /// Open a bounded channel receiving events matching `filter`.
    ///
    /// Dropping the receiver unsubscribes it on the next publish.
    pub fn channel(&self, filter: EventFilter, capacity: usize) -> EventReceiver {
        let (sender, receiver) = bounded(capacity);
        lock(&self.inner.channels).push(ChannelSubscription { filter, sender });
        EventReceiver { receiver }
    }

    /// Deliver an event to every matching subscriber.
    pub fn publish(&self, event: ClientEvent) {
        tracing::debug!(event = %event.name(), "publishing client event");
        self.inner.published.fetch_add(1, Ordering::Relaxed);

        let handlers: Vec<Handler> = lock(&self.inner.handlers)
            .iter()
            .filter(|subscription| subscription.filter.matches(&event))
            .map(|subscription| Arc::clone(&subscription.handler))
            .collect();

        for handler in handlers {
            handler(&event);
        }

        let mut channels = lock(&self.inner.channels);
        if channels.is_empty() {
            return;
        }
        let envelope = EventEnvelope {
            published_at: Utc::now(),
            event,
        };
        channels.retain(|subscription| {
            if !subscription.filter.matches(&envelope.event) {
                return true;
            }
            match subscription.sender.try_send(envelope.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        });
    }

    /// Drop every subscriber and zero the stats.
    pub fn reset(&self) {
        lock(&self.inner.handlers).clear();
        lock(&self.inner.channels).clear();
        self.inner.published.store(0, Ordering::Relaxed);
        self.inner.dropped.store(0, Ordering::Relaxed);
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.inner.handlers).len()
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.inner.published.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Bus statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events published
    pub published: u64,
    /// Channel deliveries dropped because the channel was full
    pub dropped: u64,
}

/// Receiving end of [`EventBus::channel`].
pub struct EventReceiver {
    receiver: Receiver<EventEnvelope>,
}

impl EventReceiver {
    /// Blocking receive. Returns `None` once the bus dropped this channel.
    pub fn recv(&self) -> Option<EventEnvelope> {
        self.receiver.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EventEnvelope> {
        self.receiver.try_recv().ok()
    }

    /// Take up to `max` pending events without blocking.
    pub fn try_recv_batch(&self, max: usize) -> Vec<EventEnvelope> {
        let mut batch = Vec::with_capacity(max.min(64));
        while batch.len() < max {
            match self.receiver.try_recv() {
                Ok(envelope) => batch.push(envelope),
                Err(_) => break,
            }
        }
        batch
    }

    /// Take every pending event, dropping the envelopes.
    pub fn drain_events(&self) -> Vec<ClientEvent> {
        self.receiver.try_iter().map(|envelope| envelope.event).collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_handlers_receive_matching_events() {
        let bus = EventBus::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);

        bus.subscribe(EventFilter::failures(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(ClientEvent::UnknownError);
        bus.publish(ClientEvent::HashChanged {
            key: "step".into(),
            value: None,
        });

        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert_eq!(bus.stats().published, 2);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = bus.subscribe(EventFilter::All, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(ClientEvent::UnknownError);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_publish_reentrantly() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        bus.subscribe(EventFilter::kind(EventKind::UnknownError), move |_| {
            inner_bus.publish(ClientEvent::NotFound { url: "/x".into() });
        });
        let receiver = bus.channel(EventFilter::kind(EventKind::NotFound), 4);

        bus.publish(ClientEvent::UnknownError);

        assert_eq!(
            receiver.drain_events(),
            vec![ClientEvent::NotFound { url: "/x".into() }]
        );
    }

    #[test]
    fn test_channel_drops_when_full() {
        let bus = EventBus::new();
        let receiver = bus.channel(EventFilter::All, 2);

        bus.publish(ClientEvent::UnknownError);
        bus.publish(ClientEvent::UnknownError);
        bus.publish(ClientEvent::UnknownError);

        assert_eq!(receiver.len(), 2);
        assert_eq!(bus.stats().dropped, 1);
        assert_eq!(receiver.try_recv_batch(10).len(), 2);
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_disconnected_channel_is_removed() {
        let bus = EventBus::new();
        let receiver = bus.channel(EventFilter::All, 2);
        drop(receiver);

        bus.publish(ClientEvent::UnknownError);
        assert_eq!(bus.stats().dropped, 0);
        assert_eq!(lock(&bus.inner.channels).len(), 0);
    }

    #[test]
    fn test_reset_clears_subscribers() {
        let bus = EventBus::new();
        bus.subscribe(EventFilter::All, |_| {});
        let _receiver = bus.channel(EventFilter::All, 1);
        bus.publish(ClientEvent::UnknownError);

        bus.reset();

        assert_eq!(bus.handler_count(), 0);
        assert_eq!(bus.stats(), BusStats::default());
    }
}
