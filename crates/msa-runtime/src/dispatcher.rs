//! Event subscription and ordered delivery

use dashmap::DashMap;
use msa_plugin_api::{
    DispatchOutcome, Event, EventHandler, HandlerReport, HandlerStatus, HandlerSync, HostApi,
    SubscriptionId,
};
use parking_lot::{ReentrantMutex, RwLock};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a dispatch waits for a suspended handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Wait until every handler releases its sync handle
    #[default]
    Forever,
    /// Give up on a handler after this long and cancel it
    Timeout(Duration),
}

impl WaitPolicy {
    fn timeout(self) -> Option<Duration> {
        match self {
            WaitPolicy::Forever => None,
            WaitPolicy::Timeout(timeout) => Some(timeout),
        }
    }
}

struct Subscriber {
    id: SubscriptionId,
    event: String,
    handler: Arc<dyn EventHandler>,
}

/// Delivers named events to their subscribers
///
/// Delivery for one event name is serialized through a per-name lane, so
/// concurrent dispatches of the same event never interleave their handlers.
/// The lane is re-entrant: a handler may dispatch the same event again from
/// its own thread. Different event names are delivered in parallel.
///
/// Nested dispatch across names takes lanes in call order, so two threads
/// that nest the same pair of names in opposite orders (a handler of `X`
/// dispatching `Y` while a handler of `Y` dispatches `X`) can deadlock.
/// Handlers that must cross names should hand the inner dispatch to another
/// thread instead of nesting it.
pub struct EventDispatcher {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
    lanes: DashMap<String, Arc<ReentrantMutex<()>>>,
    policy: WaitPolicy,
}

impl EventDispatcher {
    /// Create a dispatcher with the given wait policy
    pub fn new(policy: WaitPolicy) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
            lanes: DashMap::new(),
            policy,
        }
    }

    /// Current wait policy
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Add a handler for `event`; it runs after every earlier subscriber
    pub fn subscribe(&self, event: &str, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            id,
            event: event.to_string(),
            handler,
        });
        id
    }

    /// Remove a subscription; returns `false` if it was not present
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Number of handlers subscribed to `event`
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.event == event)
            .count()
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.subscribers.write().clear();
        self.lanes.clear();
    }

    fn lane(&self, event: &str) -> Arc<ReentrantMutex<()>> {
        // clone out so the map shard is not held while handlers run
        self.lanes
            .entry(event.to_string())
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .clone()
    }

    /// Deliver `event` to its subscribers, in subscription order
    ///
    /// Returns once every handler has finished or released its sync handle,
    /// or the wait policy gave up on it. Handlers subscribed while a dispatch
    /// is in flight first see the next dispatch.
    pub fn dispatch(&self, host: &dyn HostApi, event: &Event) -> DispatchOutcome {
        let lane = self.lane(&event.name);
        let _turn = lane.lock();

        let handlers: Vec<(SubscriptionId, Arc<dyn EventHandler>)> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.event == event.name)
            .map(|s| (s.id, Arc::clone(&s.handler)))
            .collect();

        if handlers.is_empty() {
            host.trace(&format!("No handlers for event {}", event.name));
            return DispatchOutcome::unhandled(event.name.clone());
        }

        let reports = handlers
            .into_iter()
            .map(|(id, handler)| HandlerReport {
                subscription: id,
                status: self.deliver(host, event, id, handler.as_ref()),
            })
            .collect();

        DispatchOutcome {
            event: event.name.clone(),
            reports,
        }
    }

    fn deliver(
        &self,
        host: &dyn HostApi,
        event: &Event,
        id: SubscriptionId,
        handler: &dyn EventHandler,
    ) -> HandlerStatus {
        let sync = HandlerSync::new();
        let returned =
            panic::catch_unwind(AssertUnwindSafe(|| handler.handle(host, event, &sync)));

        match returned {
            Ok(Ok(())) => {
                let status = sync.wait(self.policy.timeout());
                if status == HandlerStatus::TimedOut {
                    host.error(&format!(
                        "Handler {} for event {} timed out and was cancelled",
                        id, event.name
                    ));
                }
                status
            }
            Ok(Err(err)) => {
                // work it suspended before failing must still be released
                let _ = sync.wait(self.policy.timeout());
                host.error(&format!(
                    "Handler {} for event {} failed: {}",
                    id, event.name, err
                ));
                HandlerStatus::Failed(err.to_string())
            }
            Err(_) => {
                let _ = sync.wait(self.policy.timeout());
                host.error(&format!(
                    "Handler {} for event {} panicked",
                    id, event.name
                ));
                HandlerStatus::Panicked
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(WaitPolicy::Forever)
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscribers.read().len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
