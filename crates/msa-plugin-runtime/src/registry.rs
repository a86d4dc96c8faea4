//! Plugin registry for managing plugin lifecycle

use crate::error::{PluginRuntimeError, Result};
use crate::loader::{LoadedLibrary, LoadedPlugin, PluginOrigin};
use msa_plugin_api::{
    Command, Plugin, PluginContext, PluginError, PluginInfo, Subscription, SubscriptionId,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Plugin registry
///
/// Keeps loaded plugins in registration order. Registration happens on the
/// lifecycle thread while lookups may come from any dispatching thread.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<PluginEntry>>>,
}

/// Plugin state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginState {
    /// Registered, `init` not yet called
    Registered,

    /// `init` succeeded
    Initialized,

    /// `setup` succeeded
    SetUp,

    /// `teardown` ran
    TornDown,

    /// `quit` ran; the plugin is about to be dropped
    Quit,

    /// A hook failed; later hooks other than `quit` are skipped
    Failed(String),
}

impl PluginState {
    /// Whether the plugin should receive further lifecycle hooks
    pub fn is_active(&self) -> bool {
        !matches!(self, PluginState::Failed(_) | PluginState::Quit)
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginState::Registered => write!(f, "registered"),
            PluginState::Initialized => write!(f, "initialized"),
            PluginState::SetUp => write!(f, "set up"),
            PluginState::TornDown => write!(f, "torn down"),
            PluginState::Quit => write!(f, "quit"),
            PluginState::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// One loaded plugin with its host-side bookkeeping
pub struct PluginEntry {
    info: PluginInfo,
    origin: PluginOrigin,
    context: PluginContext,
    state: RwLock<PluginState>,
    commands: Mutex<Vec<Arc<Command>>>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    plugin: Mutex<Box<dyn Plugin>>,
    // Declared last: the library must be unloaded after the plugin is dropped.
    library: Option<Arc<LoadedLibrary>>,
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("info", &self.info)
            .field("origin", &self.origin)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl PluginEntry {
    /// Plugin name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Plugin metadata
    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    /// Where the plugin came from
    pub fn origin(&self) -> &PluginOrigin {
        &self.origin
    }

    /// Context passed to the plugin's hooks
    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    /// Shared library the plugin's code lives in; `None` for static plugins
    ///
    /// Anything that runs a callback the plugin handed out should hold a
    /// clone for as long as it may call in. The library stays mapped until
    /// the last clone is dropped, even after the entry itself is gone.
    pub fn library(&self) -> Option<Arc<LoadedLibrary>> {
        self.library.clone()
    }

    /// Current state
    pub fn state(&self) -> PluginState {
        self.state.read().clone()
    }

    /// Whether the plugin should receive further lifecycle hooks
    pub fn is_active(&self) -> bool {
        self.state.read().is_active()
    }

    /// Run the plugin's `init` hook
    pub fn init(&self) -> Result<()> {
        self.transition("init", PluginState::Initialized, |plugin, ctx| {
            plugin.init(ctx)
        })
    }

    /// Run the plugin's `setup` hook
    pub fn setup(&self) -> Result<()> {
        self.transition("setup", PluginState::SetUp, |plugin, ctx| plugin.setup(ctx))
    }

    /// Ask the plugin for its commands and keep them alive
    pub fn add_commands(&self) -> Result<Vec<Arc<Command>>> {
        let commands = self.run_hook("add_commands", |plugin, ctx| plugin.add_commands(ctx))?;
        self.commands.lock().extend(commands.iter().cloned());
        Ok(commands)
    }

    /// Ask the plugin for its event handlers
    pub fn event_handlers(&self) -> Result<Vec<Subscription>> {
        self.run_hook("event_handlers", |plugin, ctx| plugin.event_handlers(ctx))
    }

    /// Remember a subscription made on the plugin's behalf
    pub fn record_subscription(&self, id: SubscriptionId) {
        self.subscriptions.lock().push(id);
    }

    /// Forget and return all subscriptions made on the plugin's behalf
    pub fn take_subscriptions(&self) -> Vec<SubscriptionId> {
        std::mem::take(&mut *self.subscriptions.lock())
    }

    /// Commands currently kept alive for this plugin
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.commands.lock().clone()
    }

    /// Run the plugin's `teardown` hook
    pub fn teardown(&self) -> Result<()> {
        self.transition("teardown", PluginState::TornDown, |plugin, ctx| {
            plugin.teardown(ctx)
        })
    }

    /// Run the plugin's `quit` hook and release its commands
    ///
    /// The plugin is marked quit even if the hook fails.
    pub fn quit(&self) -> Result<()> {
        let result = self.run_hook("quit", |plugin, ctx| plugin.quit(ctx));
        self.commands.lock().clear();
        *self.state.write() = PluginState::Quit;
        result
    }

    fn transition<F>(&self, hook: &'static str, next: PluginState, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Plugin, &PluginContext) -> std::result::Result<(), PluginError>,
    {
        match self.run_hook(hook, f) {
            Ok(()) => {
                debug!(plugin = %self.name(), hook, "Plugin hook completed");
                *self.state.write() = next;
                Ok(())
            }
            Err(e) => {
                *self.state.write() = PluginState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn run_hook<T, F>(&self, hook: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Plugin, &PluginContext) -> std::result::Result<T, PluginError>,
    {
        let mut plugin = self.plugin.lock();
        match catch_unwind(AssertUnwindSafe(|| f(&mut **plugin, &self.context))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(plugin = %self.name(), hook, error = %e, "Plugin hook failed");
                Err(e.into())
            }
            Err(_) => {
                error!(plugin = %self.name(), hook, "Plugin hook panicked");
                Err(PluginError::runtime(format!("{hook} hook panicked")).into())
            }
        }
    }
}

impl PluginRegistry {
    /// Create a new plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loaded plugin
    ///
    /// The name must be non-empty and not already registered. A rejected
    /// plugin is dropped before its library.
    pub fn register(&self, loaded: LoadedPlugin, context: PluginContext) -> Result<Arc<PluginEntry>> {
        let LoadedPlugin {
            plugin,
            origin,
            library,
        } = loaded;
        let info = plugin.info().clone();

        let mut plugins = self.plugins.write();

        let rejection = if info.name.trim().is_empty() {
            Some(PluginRuntimeError::InvalidName(info.name.clone()))
        } else if plugins.iter().any(|p| p.name() == info.name) {
            Some(PluginRuntimeError::already_exists(&info.name))
        } else {
            None
        };

        if let Some(err) = rejection {
            drop(plugins);
            drop(plugin);
            drop(library);
            return Err(err);
        }

        let entry = Arc::new(PluginEntry {
            info,
            origin,
            context,
            state: RwLock::new(PluginState::Registered),
            commands: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            plugin: Mutex::new(plugin),
            library: library.map(Arc::new),
        });
        plugins.push(Arc::clone(&entry));

        info!(
            plugin = %entry.name(),
            version = %entry.info().version,
            origin = %entry.origin(),
            "Plugin registered"
        );

        Ok(entry)
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<Arc<PluginEntry>> {
        self.plugins.read().iter().find(|p| p.name() == name).cloned()
    }

    /// Whether a plugin is registered
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.read().iter().any(|p| p.name() == name)
    }

    /// All plugins, in registration order
    pub fn entries(&self) -> Vec<Arc<PluginEntry>> {
        self.plugins.read().clone()
    }

    /// Metadata of all plugins, in registration order
    pub fn list(&self) -> Vec<PluginInfo> {
        self.plugins.read().iter().map(|p| p.info().clone()).collect()
    }

    /// Remove a plugin by name
    pub fn remove(&self, name: &str) -> Option<Arc<PluginEntry>> {
        let mut plugins = self.plugins.write();
        let index = plugins.iter().position(|p| p.name() == name)?;
        Some(plugins.remove(index))
    }

    /// Remove every plugin, returning them in registration order
    pub fn drain(&self) -> Vec<Arc<PluginEntry>> {
        std::mem::take(&mut *self.plugins.write())
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    /// Whether no plugins are registered
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msa_plugin_api::testing::{MockPlugin, RecordingHost};
    use msa_plugin_api::HostHandle;

    fn context() -> PluginContext {
        let host: HostHandle = Arc::new(RecordingHost::new());
        PluginContext::new(host, serde_json::json!({}))
    }

    fn loaded(plugin: MockPlugin) -> LoadedPlugin {
        LoadedPlugin {
            plugin: Box::new(plugin),
            origin: PluginOrigin::Static,
            library: None,
        }
    }

    #[test]
    fn test_plugin_registration() {
        let registry = PluginRegistry::new();
        registry
            .register(loaded(MockPlugin::new("alpha")), context())
            .unwrap();

        assert!(registry.contains("alpha"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("alpha").unwrap().state(), PluginState::Registered);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = PluginRegistry::new();
        registry
            .register(loaded(MockPlugin::new("alpha")), context())
            .unwrap();
        let err = registry
            .register(loaded(MockPlugin::new("alpha")), context())
            .unwrap_err();

        assert!(matches!(err, PluginRuntimeError::PluginAlreadyExists(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = PluginRegistry::new();
        let err = registry
            .register(loaded(MockPlugin::new("  ")), context())
            .unwrap_err();
        assert!(matches!(err, PluginRuntimeError::InvalidName(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_plugin_lifecycle() {
        let mock = MockPlugin::new("alpha");
        let registry = PluginRegistry::new();
        let entry = registry.register(loaded(mock.clone()), context()).unwrap();

        entry.init().unwrap();
        assert_eq!(entry.state(), PluginState::Initialized);
        entry.setup().unwrap();
        entry.teardown().unwrap();
        entry.quit().unwrap();

        assert_eq!(entry.state(), PluginState::Quit);
        assert_eq!(mock.calls(), vec!["init", "setup", "teardown", "quit"]);
    }

    #[test]
    fn test_failed_hook_marks_plugin_failed() {
        let registry = PluginRegistry::new();
        let entry = registry
            .register(loaded(MockPlugin::new("alpha").failing_on("init")), context())
            .unwrap();

        assert!(entry.init().is_err());
        assert!(matches!(entry.state(), PluginState::Failed(_)));
        assert!(!entry.is_active());
    }

    #[test]
    fn test_commands_are_retained_until_quit() {
        let command = msa_plugin_api::Command::new("love", "", "", |_, _, _| Ok(()));
        let registry = PluginRegistry::new();
        let entry = registry
            .register(loaded(MockPlugin::new("alpha").with_command(command)), context())
            .unwrap();

        let commands = entry.add_commands().unwrap();
        let weak = Arc::downgrade(&commands[0]);
        drop(commands);
        assert!(weak.upgrade().is_some());

        entry.quit().unwrap();
        assert!(entry.commands().is_empty());

        drop(registry.drain());
        drop(entry);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_list_and_drain_keep_order() {
        let registry = PluginRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(loaded(MockPlugin::new(name)), context()).unwrap();
        }

        let names: Vec<_> = registry.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        let drained: Vec<_> = registry.drain().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(drained, vec!["c", "a", "b"]);
        assert!(registry.is_empty());
    }
}
