//! Event module

use crate::dispatcher::{EventDispatcher, WaitPolicy};
use crate::module::Module;
use crate::pinned::{PinnedHandler, UnitGuard};
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use msa_plugin_api::HostApi;
use std::sync::Arc;
use std::time::Duration;

/// Runs the event dispatcher and wires plugin event handlers into it
#[derive(Debug, Default)]
pub struct EventModule;

impl EventModule {
    /// Create the module
    pub fn new() -> Self {
        Self
    }
}

fn wait_policy(section: &Section) -> Result<WaitPolicy, ModuleError> {
    match section.get_parsed::<u64>("HANDLER_TIMEOUT_MS")? {
        None => Ok(WaitPolicy::Forever),
        Some(0) => Err(ModuleError::failed("HANDLER_TIMEOUT_MS must be greater than 0")),
        Some(ms) => Ok(WaitPolicy::Timeout(Duration::from_millis(ms))),
    }
}

impl Module for EventModule {
    fn id(&self) -> ModuleId {
        ModuleId::Event
    }

    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError> {
        let policy = wait_policy(section)?;
        services.set_dispatcher(Some(Arc::new(EventDispatcher::new(policy))));
        Ok(())
    }

    fn setup(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        let dispatcher = services
            .dispatcher()
            .ok_or_else(|| ModuleError::failed("dispatcher missing"))?;
        let Some(plugins) = services.plugin_registry() else {
            return Ok(());
        };

        for entry in plugins.entries() {
            if !entry.is_active() {
                continue;
            }
            let subscriptions = match entry.event_handlers() {
                Ok(subscriptions) => subscriptions,
                Err(e) => {
                    services.error(&format!(
                        "Failed to get event handlers from plugin {}: {}",
                        entry.name(),
                        e
                    ));
                    continue;
                }
            };
            for subscription in subscriptions {
                let unit = entry.library().map(|library| library as UnitGuard);
                let handler = PinnedHandler::wrap(subscription.handler, unit);
                let id = dispatcher.subscribe(&subscription.event, handler);
                entry.record_subscription(id);
                services.debug(&format!(
                    "Subscribed plugin {} to {} as {}",
                    entry.name(),
                    subscription.event,
                    id
                ));
            }
        }
        Ok(())
    }

    fn teardown(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        let (Some(dispatcher), Some(plugins)) = (services.dispatcher(), services.plugin_registry())
        else {
            return Ok(());
        };
        for entry in plugins.entries() {
            for id in entry.take_subscriptions() {
                dispatcher.unsubscribe(id);
            }
        }
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        if let Some(dispatcher) = services.dispatcher() {
            dispatcher.clear();
        }
        services.set_dispatcher(None);
        Ok(())
    }
}
