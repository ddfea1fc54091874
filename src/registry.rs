//! Correlates asynchronous events with the pending operations waiting on them.
//!
//! An operation claims a set of event types on one leg. Each `(leg, type)` pair
//! can be claimed by a single operation at a time. The first matching event
//! resolves the operation and retracts all of its claims in the same step, so
//! later events for the same pair find no listener and are dropped by the bus.
//!
//! Every operation carries a deadline fixed at registration. A timer task
//! expires it even if nobody ever waits on it.
//!
//! Lock order is registry state, then bus listener table. The resolve path
//! never holds both: it releases the state lock before unsubscribing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::bus::{EventBus, Subscription};
use crate::error::CorrelationError;
use crate::lock;
use crate::types::{Event, LegId};

pub type OperationId = u64;

// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

struct Pending {
    leg: LegId,
    types: Vec<String>,
    subscriptions: Vec<Subscription>,
    tx: oneshot::Sender<Result<Event, CorrelationError>>,
    timer: Option<AbortHandle>,
    created_at: Instant,
}

#[derive(Default)]
struct State {
    interests: HashMap<LegId, HashMap<String, OperationId>>,
    operations: HashMap<OperationId, Pending>,
}

struct Inner {
    bus: EventBus,
    state: Mutex<State>,
    next_id: AtomicU64,
}

impl Inner {
    /// Removes an operation and all of its claims. Only one caller can ever
    /// receive `Some` for a given id.
    fn take(&self, id: OperationId) -> Option<Pending> {
        let pending = {
            let mut state = lock(&self.state);
            let pending = state.operations.remove(&id)?;
            let leg_is_idle = match state.interests.get_mut(&pending.leg) {
                Some(claimed) => {
                    for event_type in &pending.types {
                        if claimed.get(event_type) == Some(&id) {
                            claimed.remove(event_type);
                        }
                    }
                    claimed.is_empty()
                }
                None => false,
            };
            if leg_is_idle {
                state.interests.remove(&pending.leg);
            }
            pending
        };

        if let Some(timer) = &pending.timer {
            timer.abort();
        }
        for subscription in &pending.subscriptions {
            self.bus.unsubscribe(subscription);
        }
        Some(pending)
    }

    fn expire(&self, id: OperationId, timeout: Duration) {
        if let Some(pending) = self.take(id) {
            tracing::warn!(
                "operation #{} on leg {} timed out after {:?}",
                id,
                pending.leg,
                timeout
            );
            let leg = pending.leg.clone();
            let _ = pending.tx.send(Err(CorrelationError::Timeout { leg, timeout }));
        }
    }

    fn resolve(&self, id: OperationId, event: &Event) {
        match self.take(id) {
            Some(pending) => {
                tracing::debug!(
                    "operation #{} on leg {} resolved by {} after {:?}",
                    id,
                    pending.leg,
                    event.event_type(),
                    pending.created_at.elapsed()
                );
                if pending.tx.send(Ok(event.clone())).is_err() {
                    tracing::debug!("operation #{} resolved with no waiter left", id);
                }
            }
            None => {
                tracing::debug!(
                    "operation #{} already settled, ignoring {}",
                    id,
                    event.event_type()
                );
            }
        }
    }
}

#[derive(Clone)]
pub struct CorrelationRegistry {
    inner: Arc<Inner>,
}

impl CorrelationRegistry {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                state: Mutex::new(State::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Claims `types` on `leg` and returns the operation that will receive the
    /// first matching event within `timeout`.
    ///
    /// Registration is atomic: either every type is claimed and subscribed, or
    /// nothing is and [`CorrelationError::DuplicateInterest`] names the first
    /// pair already held by another operation.
    ///
    /// The deadline runs from this call. Once it passes the claims are
    /// retracted whether or not [`PendingOperation::wait`] is being awaited.
    pub fn register<I, S>(
        &self,
        leg: &LegId,
        types: I,
        timeout: Duration,
    ) -> Result<PendingOperation, CorrelationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut types: Vec<String> = types.into_iter().map(Into::into).collect();
        types.sort();
        types.dedup();
        if types.is_empty() {
            return Err(CorrelationError::NoInterest { leg: leg.clone() });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut state = lock(&self.inner.state);

        if let Some(claimed) = state.interests.get(leg) {
            if let Some((event_type, owner)) = types
                .iter()
                .find_map(|t| claimed.get(t).map(|owner| (t, owner)))
            {
                tracing::error!(
                    "duplicate interest in {} on leg {}: already held by operation #{}",
                    event_type,
                    leg,
                    owner
                );
                return Err(CorrelationError::DuplicateInterest {
                    leg: leg.clone(),
                    event_type: event_type.clone(),
                });
            }
        }

        let subscriptions = types
            .iter()
            .map(|event_type| {
                let inner: Weak<Inner> = Arc::downgrade(&self.inner);
                self.inner.bus.subscribe(leg, event_type, move |event| {
                    if let Some(inner) = inner.upgrade() {
                        inner.resolve(id, event);
                    }
                })
            })
            .collect();

        let claimed = state.interests.entry(leg.clone()).or_default();
        for event_type in &types {
            claimed.insert(event_type.clone(), id);
        }

        tracing::debug!("operation #{} on leg {} waiting on {:?}", id, leg, types);

        let created_at = Instant::now();
        let deadline = created_at
            .checked_add(timeout)
            .unwrap_or_else(|| created_at + FAR_FUTURE);
        let timer = match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner: Weak<Inner> = Arc::downgrade(&self.inner);
                let task = handle.spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    if let Some(inner) = inner.upgrade() {
                        inner.expire(id, timeout);
                    }
                });
                Some(task.abort_handle())
            }
            Err(_) => {
                tracing::warn!(
                    "operation #{} registered outside a runtime, deadline enforced on wait",
                    id
                );
                None
            }
        };

        let (tx, rx) = oneshot::channel();
        state.operations.insert(
            id,
            Pending {
                leg: leg.clone(),
                types,
                subscriptions,
                tx,
                timer,
                created_at,
            },
        );

        Ok(PendingOperation {
            id,
            leg: leg.clone(),
            rx,
            deadline,
            timeout,
            registry: self.clone(),
        })
    }

    /// Registers interest in `types` and waits for the first matching event.
    pub async fn await_one<I, S>(
        &self,
        leg: &LegId,
        types: I,
        timeout: Duration,
    ) -> Result<Event, CorrelationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(leg, types, timeout)?.wait().await
    }

    /// Retracts every claim of the operation without resolving it. Its waiter
    /// settles with [`CorrelationError::Cancelled`]. Returns `false` if the
    /// operation had already settled.
    pub fn cancel(&self, id: OperationId) -> bool {
        match self.inner.take(id) {
            Some(pending) => {
                tracing::debug!("operation #{} on leg {} cancelled", id, pending.leg);
                true
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner.state).operations.len()
    }

    pub fn has_interest(&self, leg: &LegId, event_type: &str) -> bool {
        lock(&self.inner.state)
            .interests
            .get(leg)
            .is_some_and(|claimed| claimed.contains_key(event_type))
    }
}

/// A registered operation. Dropping it retracts any claims it still holds.
pub struct PendingOperation {
    id: OperationId,
    leg: LegId,
    rx: oneshot::Receiver<Result<Event, CorrelationError>>,
    deadline: Instant,
    timeout: Duration,
    registry: CorrelationRegistry,
}

impl PendingOperation {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn leg(&self) -> &LegId {
        &self.leg
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.id,
            inner: Arc::downgrade(&self.registry.inner),
        }
    }

    /// Suspends until the operation is resolved, cancelled, or its deadline
    /// passes. If an event won the race against the deadline, that event is
    /// returned instead of the timeout.
    pub async fn wait(mut self) -> Result<Event, CorrelationError> {
        match tokio::time::timeout_at(self.deadline, &mut self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CorrelationError::Cancelled {
                leg: self.leg.clone(),
            }),
            Err(_) => {
                self.registry.inner.expire(self.id, self.timeout);
                match self.rx.try_recv() {
                    Ok(result) => result,
                    Err(_) => Err(CorrelationError::Cancelled {
                        leg: self.leg.clone(),
                    }),
                }
            }
        }
    }
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        if self.registry.inner.take(self.id).is_some() {
            tracing::debug!(
                "operation #{} on leg {} abandoned, interests retracted",
                self.id,
                self.leg
            );
        }
    }
}

/// Cancels a pending operation from another task.
#[derive(Clone)]
pub struct CancelHandle {
    id: OperationId,
    inner: Weak<Inner>,
}

impl CancelHandle {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn cancel(&self) -> bool {
        match self.inner.upgrade() {
            Some(inner) => inner.take(self.id).is_some(),
            None => false,
        }
    }
}
