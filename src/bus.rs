//! In-process publish/subscribe hub for media server events.
//!
//! Listeners are keyed by `(leg, event type)`. [`EventBus::publish`] runs every
//! matching listener synchronously on the publishing task, in registration
//! order. The listener table is only locked while it is read or changed, never
//! while a listener runs, so listeners may subscribe or unsubscribe freely.

mod stats;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::lock;
use crate::types::{Event, LegId};

pub use stats::BusStats;

pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    leg: LegId,
    event_type: String,
}

impl Subscription {
    pub fn leg(&self) -> &LegId {
        &self.leg
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}

type ListenerTable = HashMap<LegId, HashMap<String, Vec<(u64, Listener)>>>;

#[derive(Default)]
struct Inner {
    listeners: Mutex<ListenerTable>,
    next_id: AtomicU64,
    stats: Mutex<BusStats>,
}

/// Cheap to clone; clones share the same listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, leg: &LegId, event_type: &str, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners)
            .entry(leg.clone())
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        tracing::trace!("subscribed #{} to {} on leg {}", id, event_type, leg);
        Subscription {
            id,
            leg: leg.clone(),
            event_type: event_type.to_string(),
        }
    }

    /// Removes a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut table = lock(&self.inner.listeners);
        let Some(types) = table.get_mut(&subscription.leg) else {
            return false;
        };
        let mut removed = false;
        if let Some(listeners) = types.get_mut(&subscription.event_type) {
            let before = listeners.len();
            listeners.retain(|(id, _)| *id != subscription.id);
            removed = listeners.len() != before;
            if listeners.is_empty() {
                types.remove(&subscription.event_type);
            }
        }
        if types.is_empty() {
            table.remove(&subscription.leg);
        }
        removed
    }

    /// Delivers `event` to every listener registered for its leg and type and
    /// returns how many listeners ran to completion. Events nobody listens for
    /// are dropped. A panicking listener is logged and skipped.
    pub fn publish(&self, event: &Event) -> usize {
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .get(event.leg_id())
            .and_then(|types| types.get(event.event_type()))
            .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        if listeners.is_empty() {
            tracing::debug!(
                "dropping event: {}, leg={} (no listener)",
                event.event_type(),
                event.leg_id()
            );
        }

        let mut delivered = 0;
        let mut panics = 0;
        for listener in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    panics += 1;
                    tracing::error!(
                        "listener for {} on leg {} panicked: {}",
                        event.event_type(),
                        event.leg_id(),
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        lock(&self.inner.stats).record_publish(delivered as u64, panics);
        delivered
    }

    /// Ingestion point for raw `{type, data, legId}` text from the transport.
    pub fn ingest(&self, raw: &str) -> Result<usize, serde_json::Error> {
        match serde_json::from_str::<Event>(raw) {
            Ok(event) => {
                tracing::debug!("received event: {}, leg={}", event.event_type(), event.leg_id());
                Ok(self.publish(&event))
            }
            Err(e) => {
                lock(&self.inner.stats).record_unparseable();
                Err(e)
            }
        }
    }

    pub fn listener_count(&self, leg: &LegId, event_type: &str) -> usize {
        lock(&self.inner.listeners)
            .get(leg)
            .and_then(|types| types.get(event_type))
            .map_or(0, Vec::len)
    }

    pub fn stats(&self) -> BusStats {
        lock(&self.inner.stats).clone()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
