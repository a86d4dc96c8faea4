//! Events, handlers and the per-dispatch synchronization handle

use crate::error::Result;
use crate::host::HostApi;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Well-known event names
pub mod topics {
    /// A line of user input; payload is `{"text": "<line>"}`
    pub const TEXT_INPUT: &str = "TEXT_INPUT";
}

/// A named event with an arbitrary JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name
    pub name: String,
    /// Event payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Event {
    /// Create an event
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Create a [`topics::TEXT_INPUT`] event for one line of input
    pub fn text_input(line: impl Into<String>) -> Self {
        Self::new(
            topics::TEXT_INPUT,
            serde_json::json!({ "text": line.into() }),
        )
    }

    /// The `text` field of the payload, if any
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(|v| v.as_str())
    }
}

/// Something that reacts to events
///
/// The handler runs on the dispatching thread. To finish later, call
/// [`HandlerSync::suspend`] and hand the returned [`Pending`] to whatever
/// completes the work; the dispatch does not return until it is released.
pub trait EventHandler: Send + Sync {
    /// Handle one event
    fn handle(&self, host: &dyn HostApi, event: &Event, sync: &HandlerSync) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: Fn(&dyn HostApi, &Event, &HandlerSync) -> Result<()> + Send + Sync,
{
    fn handle(&self, host: &dyn HostApi, event: &Event, sync: &HandlerSync) -> Result<()> {
        self(host, event, sync)
    }
}

/// An event handler paired with the event it wants, as contributed by a plugin
#[derive(Clone)]
pub struct Subscription {
    /// Event name
    pub event: String,
    /// Handler
    pub handler: Arc<dyn EventHandler>,
}

impl Subscription {
    /// Pair a handler with an event name
    pub fn new(event: impl Into<String>, handler: impl EventHandler + 'static) -> Self {
        Self {
            event: event.into(),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Identifier returned by a subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct SyncState {
    outstanding: usize,
    result: Option<i32>,
    abandoned: bool,
}

#[derive(Debug, Default)]
struct SyncInner {
    state: Mutex<SyncState>,
    released: Condvar,
    cancelled: AtomicBool,
}

impl SyncInner {
    fn finish(&self, result: Option<i32>, abandoned: bool) {
        let mut state = self.state.lock();
        if result.is_some() {
            state.result = result;
        }
        state.abandoned |= abandoned;
        state.outstanding = state.outstanding.saturating_sub(1);
        self.released.notify_all();
    }
}

/// Synchronization handle given to one handler for one dispatch
///
/// A handler may report a result directly, or suspend and complete later
/// from another thread. Cancellation is cooperative: the dispatcher only sets
/// a flag the handler may poll.
#[derive(Debug, Clone, Default)]
pub struct HandlerSync {
    inner: Arc<SyncInner>,
}

impl HandlerSync {
    /// Create a fresh handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result for this handler
    pub fn report(&self, result: i32) {
        self.inner.state.lock().result = Some(result);
    }

    /// The result recorded so far
    pub fn result(&self) -> Option<i32> {
        self.inner.state.lock().result
    }

    /// Keep the dispatch waiting until the returned [`Pending`] is released
    pub fn suspend(&self) -> Pending {
        self.inner.state.lock().outstanding += 1;
        Pending {
            inner: Some(Arc::clone(&self.inner)),
        }
    }

    /// Whether any [`Pending`] is still outstanding
    pub fn is_suspended(&self) -> bool {
        self.inner.state.lock().outstanding > 0
    }

    /// Ask the handler to give up
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Block until every [`Pending`] is released
    ///
    /// With `None` this waits forever. When a timeout elapses the handle is
    /// cancelled and [`HandlerStatus::TimedOut`] is returned.
    pub fn wait(&self, timeout: Option<Duration>) -> HandlerStatus {
        let mut state = self.inner.state.lock();

        match timeout {
            None => {
                while state.outstanding > 0 {
                    self.inner.released.wait(&mut state);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while state.outstanding > 0 {
                    if self.inner.released.wait_until(&mut state, deadline).timed_out()
                        && state.outstanding > 0
                    {
                        drop(state);
                        self.cancel();
                        return HandlerStatus::TimedOut;
                    }
                }
            }
        }

        if state.abandoned {
            HandlerStatus::Abandoned
        } else {
            HandlerStatus::Completed {
                result: state.result,
            }
        }
    }
}

/// Outstanding completion of a suspended handler
///
/// Dropping it without calling [`Pending::complete`] or [`Pending::release`]
/// releases the dispatch and marks the handler as abandoned.
#[derive(Debug)]
#[must_use = "dropping a Pending releases the dispatch immediately"]
pub struct Pending {
    inner: Option<Arc<SyncInner>>,
}

impl Pending {
    /// Finish with a result
    pub fn complete(mut self, result: i32) {
        if let Some(inner) = self.inner.take() {
            inner.finish(Some(result), false);
        }
    }

    /// Finish without a result
    pub fn release(mut self) {
        if let Some(inner) = self.inner.take() {
            inner.finish(None, false);
        }
    }

    /// Whether the dispatcher gave up waiting
    pub fn is_cancelled(&self) -> bool {
        self.inner
            .as_ref()
            .map(|inner| inner.cancelled.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.finish(None, true);
        }
    }
}

/// How one handler's delivery ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerStatus {
    /// Handler finished, possibly reporting a result
    Completed {
        /// Result reported through the sync handle
        result: Option<i32>,
    },
    /// Handler returned an error
    Failed(String),
    /// A suspended handler dropped its completion without finishing
    Abandoned,
    /// The wait policy expired before the handler finished
    TimedOut,
    /// Handler panicked
    Panicked,
}

impl HandlerStatus {
    /// Whether the handler finished normally
    pub fn is_completed(&self) -> bool {
        matches!(self, HandlerStatus::Completed { .. })
    }
}

/// Delivery result for one subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReport {
    /// Subscription that received the event
    pub subscription: SubscriptionId,
    /// How delivery ended
    pub status: HandlerStatus,
}

/// Result of dispatching one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Event name
    pub event: String,
    /// One report per handler, in delivery order
    pub reports: Vec<HandlerReport>,
}

impl DispatchOutcome {
    /// Outcome for an event nobody listens to
    pub fn unhandled(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            reports: Vec::new(),
        }
    }

    /// Number of handlers that received the event
    pub fn handled(&self) -> usize {
        self.reports.len()
    }

    /// Whether every handler completed normally
    pub fn all_completed(&self) -> bool {
        self.reports.iter().all(|r| r.status.is_completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_report_without_suspend() {
        let sync = HandlerSync::new();
        sync.report(7);
        assert_eq!(sync.wait(None), HandlerStatus::Completed { result: Some(7) });
    }

    #[test]
    fn test_suspend_completed_from_other_thread() {
        let sync = HandlerSync::new();
        let pending = sync.suspend();
        assert!(sync.is_suspended());

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            pending.complete(3);
        });

        assert_eq!(sync.wait(None), HandlerStatus::Completed { result: Some(3) });
        worker.join().unwrap();
    }

    #[test]
    fn test_dropped_pending_is_abandoned() {
        let sync = HandlerSync::new();
        drop(sync.suspend());
        assert_eq!(sync.wait(None), HandlerStatus::Abandoned);
    }

    #[test]
    fn test_release_without_result() {
        let sync = HandlerSync::new();
        sync.suspend().release();
        assert_eq!(sync.wait(None), HandlerStatus::Completed { result: None });
    }

    #[test]
    fn test_timeout_cancels() {
        let sync = HandlerSync::new();
        let pending = sync.suspend();

        let status = sync.wait(Some(Duration::from_millis(10)));
        assert_eq!(status, HandlerStatus::TimedOut);
        assert!(sync.is_cancelled());
        assert!(pending.is_cancelled());
    }

    #[test]
    fn test_text_input_event() {
        let event = Event::text_input("love");
        assert_eq!(event.name, topics::TEXT_INPUT);
        assert_eq!(event.text(), Some("love"));
    }

    #[test]
    fn test_outcome_summary() {
        let outcome = DispatchOutcome {
            event: "X".into(),
            reports: vec![
                HandlerReport {
                    subscription: SubscriptionId(1),
                    status: HandlerStatus::Completed { result: None },
                },
                HandlerReport {
                    subscription: SubscriptionId(2),
                    status: HandlerStatus::Panicked,
                },
            ],
        };
        assert_eq!(outcome.handled(), 2);
        assert!(!outcome.all_completed());
        assert!(DispatchOutcome::unhandled("Y").all_completed());
    }
}
