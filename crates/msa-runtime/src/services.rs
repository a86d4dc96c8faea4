//! Service slots shared between modules, plugins and handlers

use crate::agent::Agent;
use crate::commands::CommandRegistry;
use crate::dispatcher::EventDispatcher;
use crate::input::InputPort;
use crate::log::Logger;
use crate::output::OutputSink;
use crate::shutdown::ShutdownSignal;
use msa_plugin_api::{
    AgentSnapshot, CommandSummary, DispatchOutcome, Event, HostApi, LogLevel, PluginError,
};
use msa_plugin_runtime::PluginRegistry;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

type Slot<T> = RwLock<Option<Arc<T>>>;

/// What the running modules offer each other and the outside world
///
/// Each slot is filled by its module's `init` and emptied by its `quit`.
/// Readers get a clone of the `Arc`, so a service stays usable for the
/// duration of a call even if its module quits concurrently.
#[derive(Default)]
pub struct Services {
    logger: Slot<Logger>,
    output: Slot<dyn OutputSink>,
    dispatcher: Slot<EventDispatcher>,
    input: Slot<InputPort>,
    agent: Slot<Agent>,
    commands: Slot<CommandRegistry>,
    plugins: Slot<PluginRegistry>,
    shutdown: ShutdownSignal,
}

fn read<T: ?Sized>(slot: &Slot<T>) -> Option<Arc<T>> {
    slot.read().clone()
}

fn require<T: ?Sized>(slot: &Slot<T>, name: &str) -> Result<Arc<T>, PluginError> {
    read(slot).ok_or_else(|| PluginError::unavailable(format!("{name} module is not running")))
}

impl Services {
    /// Create empty service slots
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty service slots sharing an existing shutdown signal
    pub fn with_shutdown(shutdown: ShutdownSignal) -> Self {
        Self {
            shutdown,
            ..Self::default()
        }
    }

    /// Logger, while the Log module runs
    pub fn logger(&self) -> Option<Arc<Logger>> {
        read(&self.logger)
    }

    /// Install or remove the logger
    pub fn set_logger(&self, logger: Option<Arc<Logger>>) {
        *self.logger.write() = logger;
    }

    /// Output sink, while the Output module runs
    pub fn output_sink(&self) -> Option<Arc<dyn OutputSink>> {
        read(&self.output)
    }

    /// Install or remove the output sink
    pub fn set_output_sink(&self, sink: Option<Arc<dyn OutputSink>>) {
        *self.output.write() = sink;
    }

    /// Event dispatcher, while the Event module runs
    pub fn dispatcher(&self) -> Option<Arc<EventDispatcher>> {
        read(&self.dispatcher)
    }

    /// Install or remove the event dispatcher
    pub fn set_dispatcher(&self, dispatcher: Option<Arc<EventDispatcher>>) {
        *self.dispatcher.write() = dispatcher;
    }

    /// Input port, while the Input module runs
    pub fn input_port(&self) -> Option<Arc<InputPort>> {
        read(&self.input)
    }

    /// Install or remove the input port
    pub fn set_input_port(&self, input: Option<Arc<InputPort>>) {
        *self.input.write() = input;
    }

    /// Agent, while the Agent module runs
    pub fn agent_handle(&self) -> Option<Arc<Agent>> {
        read(&self.agent)
    }

    /// Install or remove the agent
    pub fn set_agent(&self, agent: Option<Arc<Agent>>) {
        *self.agent.write() = agent;
    }

    /// Command registry, while the Command module runs
    pub fn command_registry(&self) -> Option<Arc<CommandRegistry>> {
        read(&self.commands)
    }

    /// Install or remove the command registry
    pub fn set_command_registry(&self, registry: Option<Arc<CommandRegistry>>) {
        *self.commands.write() = registry;
    }

    /// Plugin registry, while the Plugin module runs
    pub fn plugin_registry(&self) -> Option<Arc<PluginRegistry>> {
        read(&self.plugins)
    }

    /// Install or remove the plugin registry
    pub fn set_plugin_registry(&self, registry: Option<Arc<PluginRegistry>>) {
        *self.plugins.write() = registry;
    }

    /// Signal raised when someone asks the host to stop
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Feed one line of user input into the system
    pub fn submit_input(&self, line: &str) -> Result<DispatchOutcome, PluginError> {
        require(&self.input, "Input")?.submit(self, line)
    }

    /// Show the input prompt
    pub fn prompt(&self) -> Result<(), PluginError> {
        let prompt = require(&self.agent, "Agent")?.render_prompt();
        self.write_text(&prompt)?;
        if let Some(sink) = self.output_sink() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Unload one plugin while the host keeps running
    ///
    /// Returns `false` when no plugin has that name.
    pub fn unload_plugin(&self, name: &str) -> Result<bool, PluginError> {
        let registry = require(&self.plugins, "Plugin")?;
        let Some(entry) = registry.remove(name) else {
            return Ok(false);
        };
        crate::modules::plugin::release(self, &entry);
        Ok(true)
    }
}

impl HostApi for Services {
    fn log(&self, level: LogLevel, message: &str) {
        if let Some(logger) = self.logger() {
            logger.log(level, message);
        }
    }

    fn write_text(&self, text: &str) -> Result<(), PluginError> {
        require(&self.output, "Output")?.write_text(text)?;
        Ok(())
    }

    fn say(&self, text: &str) -> Result<(), PluginError> {
        let line = require(&self.agent, "Agent")?.render_speech(text);
        self.write_text(&line)
    }

    fn expand(&self, template: &str) -> String {
        match self.agent_handle() {
            Some(agent) => agent.expander().expand(template),
            None => template.to_string(),
        }
    }

    fn set_substitution(&self, name: &str, value: &str) -> Result<(), PluginError> {
        require(&self.agent, "Agent")?.expander().set(name, value);
        Ok(())
    }

    fn remove_substitution(&self, name: &str) -> Result<(), PluginError> {
        require(&self.agent, "Agent")?.expander().unregister(name);
        Ok(())
    }

    fn agent(&self) -> Option<AgentSnapshot> {
        self.agent_handle().map(|agent| agent.snapshot())
    }

    fn dispatch(&self, event: Event) -> Result<DispatchOutcome, PluginError> {
        let dispatcher = require(&self.dispatcher, "Event")?;
        Ok(dispatcher.dispatch(self, &event))
    }

    fn commands(&self) -> Vec<CommandSummary> {
        self.command_registry()
            .map(|registry| registry.summaries())
            .unwrap_or_default()
    }

    fn request_shutdown(&self) {
        self.shutdown.trigger();
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("logger", &self.logger.read().is_some())
            .field("output", &self.output.read().is_some())
            .field("dispatcher", &self.dispatcher.read().is_some())
            .field("input", &self.input.read().is_some())
            .field("agent", &self.agent.read().is_some())
            .field("commands", &self.commands.read().is_some())
            .field("plugins", &self.plugins.read().is_some())
            .field("shutdown", &self.shutdown)
            .finish()
    }
}
