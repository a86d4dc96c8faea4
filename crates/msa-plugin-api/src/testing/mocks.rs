//! Mock implementations for testing

use crate::command::{Command, CommandSummary};
use crate::event::{DispatchOutcome, Event, Subscription};
use crate::host::{AgentSnapshot, HostApi, LogLevel};
use crate::plugin::{Plugin, PluginContext, PluginInfo, Version};
use crate::{PluginError, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mock plugin for testing
///
/// Clones share the same call log, so a test can keep one clone and hand the
/// other to the host.
#[derive(Debug, Clone)]
pub struct MockPlugin {
    info: PluginInfo,
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_on: Option<&'static str>,
    commands: Vec<Arc<Command>>,
    subscriptions: Vec<Subscription>,
}

impl MockPlugin {
    /// Create a new mock plugin
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            info: PluginInfo::new(name.clone(), name, Version::new(1, 0, 0, 0))
                .with_author("tester"),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: None,
            commands: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Fail the named hook (`"init"`, `"setup"`, `"add_commands"`, ...)
    pub fn failing_on(mut self, hook: &'static str) -> Self {
        self.fail_on = Some(hook);
        self
    }

    /// Contribute a command during setup
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(Arc::new(command));
        self
    }

    /// Contribute an event handler during setup
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Hook names in call order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    /// Number of calls to one hook
    pub fn call_count(&self, hook: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == hook).count()
    }

    fn record(&self, hook: &'static str) -> Result<()> {
        self.calls.lock().push(hook);
        if self.fail_on == Some(hook) {
            return Err(PluginError::runtime(format!("{hook} failed on purpose")));
        }
        Ok(())
    }
}

impl Plugin for MockPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn init(&mut self, _ctx: &PluginContext) -> Result<()> {
        self.record("init")
    }

    fn setup(&mut self, _ctx: &PluginContext) -> Result<()> {
        self.record("setup")
    }

    fn add_commands(&mut self, _ctx: &PluginContext) -> Result<Vec<Arc<Command>>> {
        self.record("add_commands")?;
        Ok(self.commands.clone())
    }

    fn event_handlers(&mut self, _ctx: &PluginContext) -> Result<Vec<Subscription>> {
        self.record("event_handlers")?;
        Ok(self.subscriptions.clone())
    }

    fn teardown(&mut self, _ctx: &PluginContext) -> Result<()> {
        self.record("teardown")
    }

    fn quit(&mut self, _ctx: &PluginContext) -> Result<()> {
        self.record("quit")
    }
}

/// Host that records everything done to it
#[derive(Debug, Default)]
pub struct RecordingHost {
    logs: Mutex<Vec<(LogLevel, String)>>,
    output: Mutex<String>,
    said: Mutex<Vec<String>>,
    events: Mutex<Vec<Event>>,
    substitutions: Mutex<BTreeMap<String, String>>,
    shutdown: AtomicBool,
    agent: Option<AgentSnapshot>,
}

impl RecordingHost {
    /// Create a host with no agent
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host whose agent reports `snapshot`
    pub fn with_agent(snapshot: AgentSnapshot) -> Self {
        Self {
            agent: Some(snapshot),
            ..Self::default()
        }
    }

    /// Logged messages
    pub fn logs(&self) -> Vec<(LogLevel, String)> {
        self.logs.lock().clone()
    }

    /// Text written to output
    pub fn output(&self) -> String {
        self.output.lock().clone()
    }

    /// Lines the agent was asked to say
    pub fn said(&self) -> Vec<String> {
        self.said.lock().clone()
    }

    /// Events dispatched through this host
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Whether shutdown was requested
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl HostApi for RecordingHost {
    fn log(&self, level: LogLevel, message: &str) {
        self.logs.lock().push((level, message.to_string()));
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.output.lock().push_str(text);
        Ok(())
    }

    fn say(&self, text: &str) -> Result<()> {
        self.said.lock().push(text.to_string());
        Ok(())
    }

    fn expand(&self, template: &str) -> String {
        // longest names first so $AB is not clobbered by $A
        let substitutions = self.substitutions.lock();
        let mut names: Vec<&String> = substitutions.keys().collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        let mut text = template.to_string();
        for name in names {
            text = text.replace(&format!("${name}"), &substitutions[name]);
        }
        text
    }

    fn set_substitution(&self, name: &str, value: &str) -> Result<()> {
        self.substitutions
            .lock()
            .insert(name.to_uppercase(), value.to_string());
        Ok(())
    }

    fn remove_substitution(&self, name: &str) -> Result<()> {
        self.substitutions.lock().remove(&name.to_uppercase());
        Ok(())
    }

    fn agent(&self) -> Option<AgentSnapshot> {
        self.agent.clone()
    }

    fn dispatch(&self, event: Event) -> Result<DispatchOutcome> {
        let outcome = DispatchOutcome::unhandled(event.name.clone());
        self.events.lock().push(event);
        Ok(outcome)
    }

    fn commands(&self) -> Vec<CommandSummary> {
        Vec::new()
    }

    fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HandlerSync;
    use crate::ParamList;

    fn ctx() -> PluginContext {
        PluginContext::new(Arc::new(RecordingHost::new()), serde_json::json!({}))
    }

    #[test]
    fn test_mock_plugin_counts_calls() {
        let mock = MockPlugin::new("mock");
        let mut plugin = mock.clone();
        let ctx = ctx();

        plugin.init(&ctx).unwrap();
        plugin.setup(&ctx).unwrap();
        plugin.quit(&ctx).unwrap();

        assert_eq!(mock.calls(), vec!["init", "setup", "quit"]);
        assert_eq!(mock.call_count("init"), 1);
        assert_eq!(mock.call_count("teardown"), 0);
    }

    #[test]
    fn test_mock_plugin_failure() {
        let mut plugin = MockPlugin::new("mock").failing_on("init");
        assert!(plugin.init(&ctx()).is_err());
        assert!(plugin.setup(&ctx()).is_ok());
    }

    #[test]
    fn test_recording_host_runs_commands() {
        let host = RecordingHost::new();
        let cmd = Command::new("echo", "Echo", "ECHO <text>", |host, params, _| {
            host.say(&params.joined())
        });

        let params: ParamList = ["hi", "there"].into_iter().collect();
        cmd.invoke(&host, &params, &HandlerSync::new()).unwrap();

        assert_eq!(host.said(), vec!["hi there".to_string()]);
    }

    #[test]
    fn test_recording_host_expands_substitutions() {
        let host = RecordingHost::new();
        host.set_substitution("user_title", "Senpai").unwrap();
        host.set_substitution("user", "nobody").unwrap();
        assert_eq!(host.expand("Hi $USER_TITLE and $USER"), "Hi Senpai and nobody");

        host.remove_substitution("USER").unwrap();
        assert_eq!(host.expand("$USER_TITLE, $USER"), "Senpai, $USER");
    }
}
