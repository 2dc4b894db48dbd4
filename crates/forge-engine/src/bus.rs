// bus.rs — In-process publish/subscribe fan-out of SystemEvents.
//
// Each subscription owns an independent bounded queue; there is no shared
// broadcast list for consumers to mutate. Publication is non-blocking: a
// full queue triggers the configured overflow policy instead of stalling
// the publisher. All subscribers see the same events in the same relative
// order because delivery happens under the registry lock, one event at a
// time.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::schema::SystemEvent;

/// What to do when a subscriber's queue is full at publication time.
///
/// This is an explicit configuration choice, not a hidden behavior: pick
/// `DropOldest` for consumers that only care about fresh state (UI panels),
/// `Disconnect` for consumers that must never miss an event silently and
/// would rather resubscribe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued event to make room for the new one.
    #[default]
    DropOldest,
    /// End the subscription: the queue is cleared and `recv` returns `None`.
    Disconnect,
}

struct SubscriberShared {
    queue: Mutex<VecDeque<SystemEvent>>,
    notify: Notify,
    closed: AtomicBool,
    schema_version: u16,
}

/// Fan-out delivery of emitted events to all current subscriptions.
pub struct EventBus {
    subscribers: Mutex<Vec<Arc<SubscriberShared>>>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl EventBus {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
            policy,
        }
    }

    /// Register a consumer supporting the given schema major version.
    ///
    /// The subscription sees events published from this point on — history
    /// is not replayed. Events whose major version differs from
    /// `schema_version` are not delivered to this subscriber.
    pub fn subscribe(&self, schema_version: u16) -> Subscription {
        let shared = Arc::new(SubscriberShared {
            queue: Mutex::new(VecDeque::with_capacity(self.capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            schema_version,
        });
        self.subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .push(Arc::clone(&shared));
        Subscription { shared }
    }

    /// Deliver one event to every live subscription.
    ///
    /// The registry lock is held for the whole delivery loop, so each event
    /// observes a consistent snapshot of subscribers and every subscriber
    /// receives the same relative order. Individual deliveries are
    /// non-blocking pushes.
    pub fn publish(&self, event: &SystemEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber registry lock poisoned");
        subscribers.retain(|s| !s.closed.load(Ordering::SeqCst));

        for sub in subscribers.iter() {
            if sub.schema_version != event.schema_version {
                continue;
            }
            let mut queue = sub.queue.lock().expect("subscriber queue lock poisoned");
            if queue.len() >= self.capacity {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        queue.pop_front();
                        tracing::warn!(
                            capacity = self.capacity,
                            "slow subscriber: dropped oldest queued event"
                        );
                    }
                    OverflowPolicy::Disconnect => {
                        queue.clear();
                        drop(queue);
                        sub.closed.store(true, Ordering::SeqCst);
                        sub.notify.notify_waiters();
                        tracing::warn!(
                            capacity = self.capacity,
                            "slow subscriber: disconnected on overflow"
                        );
                        continue;
                    }
                }
            }
            queue.push_back(event.clone());
            drop(queue);
            sub.notify.notify_one();
        }
    }

    /// Number of live subscriptions (overflow-disconnected and dropped ones
    /// are swept lazily on publish).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .iter()
            .filter(|s| !s.closed.load(Ordering::SeqCst))
            .count()
    }
}

/// A live consumer registration: a lazy, effectively-unbounded sequence of
/// events. Ends when dropped, when the overflow policy disconnects it, or
/// at process exit. Restart by subscribing again.
pub struct Subscription {
    shared: Arc<SubscriberShared>,
}

impl Subscription {
    /// Receive the next event, in publication order.
    ///
    /// Returns `None` once the subscription has been disconnected and its
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<SystemEvent> {
        loop {
            if let Some(event) = self.try_pop() {
                return Some(event);
            }
            if self.shared.closed.load(Ordering::SeqCst) {
                return None;
            }

            // Register interest before re-checking, so a publish landing
            // between the check and the await still wakes us.
            let mut notified = pin!(self.shared.notify.notified());
            notified.as_mut().enable();
            if let Some(event) = self.try_pop() {
                return Some(event);
            }
            if self.shared.closed.load(Ordering::SeqCst) {
                return None;
            }
            notified.await;
        }
    }

    /// Receive the next event if one is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<SystemEvent> {
        self.try_pop()
    }

    /// Adapt this subscription into a `Stream` of events.
    pub fn into_stream(mut self) -> impl tokio_stream::Stream<Item = SystemEvent> {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                yield event;
            }
        }
    }

    /// The schema major version this subscriber registered with.
    pub fn schema_version(&self) -> u16 {
        self.shared.schema_version
    }

    fn try_pop(&self) -> Option<SystemEvent> {
        self.shared
            .queue
            .lock()
            .expect("subscriber queue lock poisoned")
            .pop_front()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}
