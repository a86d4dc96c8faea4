//! User input intake

use msa_plugin_api::{DispatchOutcome, Event, HostApi, PluginError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default number of lines kept in history
pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// Turns lines of user input into `TEXT_INPUT` events
#[derive(Debug)]
pub struct InputPort {
    history: Mutex<VecDeque<String>>,
    capacity: usize,
    closed: AtomicBool,
}

impl InputPort {
    /// Create a port keeping the last `capacity` lines
    pub fn new(capacity: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Record `line` and dispatch it as a `TEXT_INPUT` event
    ///
    /// Blank lines are ignored and produce an unhandled outcome.
    pub fn submit(&self, host: &dyn HostApi, line: &str) -> Result<DispatchOutcome, PluginError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PluginError::unavailable("Input module is not running"));
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(DispatchOutcome::unhandled(msa_plugin_api::topics::TEXT_INPUT));
        }

        self.remember(line);
        host.trace(&format!("Received input: {line}"));
        host.dispatch(Event::text_input(line))
    }

    fn remember(&self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        let mut history = self.history.lock();
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(line.to_string());
    }

    /// Recent lines, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.lock().iter().cloned().collect()
    }

    /// Refuse further input
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the port refuses input
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for InputPort {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
