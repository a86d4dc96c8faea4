//! Plugin callbacks that keep their code loaded

use msa_plugin_api::{Event, EventHandler, HandlerSync, HostApi, PluginError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Keeps a plugin unit mapped; usually the plugin's shared library
pub type UnitGuard = Arc<dyn Any + Send + Sync>;

/// Event handler that holds its plugin unit open while any clone is alive
///
/// A dispatch in flight owns a clone, so unloading the plugin cannot unmap
/// the handler's code until the dispatch is done with it.
pub(crate) struct PinnedHandler {
    // dropped before the unit
    handler: Arc<dyn EventHandler>,
    _unit: UnitGuard,
}

impl PinnedHandler {
    /// Wrap `handler` when it comes from a unit; static code needs no pin
    pub(crate) fn wrap(
        handler: Arc<dyn EventHandler>,
        unit: Option<UnitGuard>,
    ) -> Arc<dyn EventHandler> {
        match unit {
            Some(unit) => Arc::new(PinnedHandler {
                handler,
                _unit: unit,
            }),
            None => handler,
        }
    }
}

impl EventHandler for PinnedHandler {
    fn handle(&self, host: &dyn HostApi, event: &Event, sync: &HandlerSync) -> Result<(), PluginError> {
        self.handler.handle(host, event, sync)
    }
}

impl fmt::Debug for PinnedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_holds_unit() {
        let unit: Arc<()> = Arc::new(());
        let weak = Arc::downgrade(&unit);

        let handler = PinnedHandler::wrap(
            Arc::new(|_: &dyn HostApi, _: &Event, _: &HandlerSync| -> Result<(), PluginError> {
                Ok(())
            }),
            Some(unit as UnitGuard),
        );
        let in_flight = Arc::clone(&handler);
        drop(handler);
        assert!(weak.upgrade().is_some());

        drop(in_flight);
        assert!(weak.upgrade().is_none());
    }
}
