//! Module orchestration
//!
//! [`Host`] drives the modules through their lifecycle in the fixed orders
//! defined on [`ModuleId`]:
//!
//! - `init` in dependency order, Log first and Plugin last
//! - `setup` for Plugin, then Event, so plugin handlers can be wired
//! - `teardown` for Plugin, then Event, on a normal shutdown only
//! - `quit` for Plugin first and Log last, so failures can still be logged
//!
//! A failed `init` or `setup` rolls back everything started so far before
//! the error is returned, so a caller either holds a fully started host or
//! nothing at all.

use crate::module::{Module, ModuleSet};
use crate::modules::{OutputModule, PluginModule};
use crate::output::OutputSink;
use crate::services::Services;
use crate::shutdown::ShutdownSignal;
use msa_config::Config;
use msa_core::{Error, ModuleError, ModuleId, ModuleState, Result, Status};
use msa_plugin_api::{DispatchOutcome, HostApi, HostHandle, PluginError, RegisterFn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why the host is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Normal shutdown; modules are torn down before they quit
    Normal,
    /// Abnormal shutdown; teardown is skipped
    Abort(Status),
}

impl StopReason {
    /// Status reported for this reason
    pub fn status(self) -> Status {
        match self {
            StopReason::Normal => Status::Success,
            StopReason::Abort(status) => status,
        }
    }
}

struct Slot {
    module: Box<dyn Module>,
    state: ModuleState,
}

/// A running set of modules
///
/// Dropping a host quits any module still running, continuing past failures.
/// Call [`Host::stop`] and [`Host::dispose`] to observe errors instead.
pub struct Host {
    slots: Vec<Slot>,
    services: Arc<Services>,
}

/// Returned by [`Host::dispose`] when a module is still running
///
/// The host is handed back untouched.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct DisposeError {
    /// The host that could not be disposed
    pub host: Host,
    /// Which module is still live
    #[source]
    pub error: Error,
}

fn lifecycle_failure(
    services: &Services,
    module: ModuleId,
    verb: &str,
    hook: &str,
    err: &ModuleError,
) {
    services.error(&format!(
        "Failed to {verb} {} module: {}",
        module.name().to_lowercase(),
        err.message
    ));
    services.debug(&format!("{module} module's {hook}() returned {}", err.status));
}

impl Host {
    /// Start the built-in modules
    pub fn start(config: &Config) -> Result<Self> {
        Self::start_with(config, ModuleSet::builtin(), Arc::new(Services::new()))
    }

    /// Load configuration from a file and start the built-in modules
    pub fn start_with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = msa_config::load_config(path)?;
        Self::start(&config)
    }

    /// Start `modules`, sharing `services` with the caller
    pub fn start_with(config: &Config, modules: ModuleSet, services: Arc<Services>) -> Result<Self> {
        let mut host = Host {
            slots: modules
                .into_modules()
                .into_iter()
                .map(|module| Slot {
                    module,
                    state: ModuleState::Uninitialized,
                })
                .collect(),
            services,
        };

        for id in ModuleId::INIT_ORDER {
            let section = config.section(id.section_name());
            let slot = &mut host.slots[id.index()];
            match slot.module.init(&host.services, &section) {
                Ok(()) => {
                    slot.state = ModuleState::Initialized;
                    host.services
                        .trace(&format!("Started {} module", id.name().to_lowercase()));
                }
                Err(source) => {
                    lifecycle_failure(&host.services, id, "start", "init", &source);
                    return Err(host.roll_back(Error::ModuleInit { module: id, source }));
                }
            }
        }

        for id in ModuleId::SETUP_ORDER {
            let slot = &mut host.slots[id.index()];
            match slot.module.setup(&host.services) {
                Ok(()) => {
                    slot.state = ModuleState::SetUp;
                    host.services
                        .trace(&format!("Set up {} module", id.name().to_lowercase()));
                }
                Err(source) => {
                    lifecycle_failure(&host.services, id, "set up", "setup", &source);
                    return Err(host.roll_back(Error::ModuleSetup { module: id, source }));
                }
            }
        }

        host.services.info("Finished initializing Moe Serifu Agent");
        Ok(host)
    }

    fn roll_back(mut self, cause: Error) -> Error {
        if let Err(e) = self.stop(StopReason::Abort(cause.status())) {
            // whatever is still live is quit when self drops
            self.services
                .error(&format!("Rollback did not complete: {e}"));
        }
        cause
    }

    /// Shut the modules down
    ///
    /// On [`StopReason::Normal`] the Plugin and Event modules are torn down
    /// first; a teardown failure is logged and does not stop the shutdown.
    /// Modules then quit in [`ModuleId::QUIT_ORDER`]. The first quit failure
    /// halts the sequence, leaving later modules running, and is returned.
    /// Stopping an already stopped host does nothing.
    pub fn stop(&mut self, reason: StopReason) -> Result<()> {
        self.services.info("Moe Serifu Agent is now shutting down...");

        if reason == StopReason::Normal {
            for id in ModuleId::TEARDOWN_ORDER {
                let slot = &mut self.slots[id.index()];
                if slot.state != ModuleState::SetUp {
                    continue;
                }
                match slot.module.teardown(&self.services) {
                    Ok(()) => self
                        .services
                        .trace(&format!("Tore down {} module", id.name().to_lowercase())),
                    Err(e) => lifecycle_failure(&self.services, id, "tear down", "teardown", &e),
                }
                slot.state = ModuleState::TornDown;
            }
        }

        for id in ModuleId::QUIT_ORDER {
            let slot = &mut self.slots[id.index()];
            if !slot.state.is_live() {
                self.services.trace(&format!(
                    "{} module not started, no need to stop",
                    id.name().to_lowercase()
                ));
                continue;
            }
            if id == ModuleId::Log {
                self.services.debug("All primary modules shutdown cleanly");
            }
            if let Err(source) = slot.module.quit(&self.services) {
                lifecycle_failure(&self.services, id, "stop", "quit", &source);
                return Err(Error::ModuleQuit { module: id, source });
            }
            slot.state = ModuleState::Quit;
        }

        Ok(())
    }

    /// Release the host once every module has quit
    ///
    /// Refuses, handing the host back, while any module is still live.
    pub fn dispose(self) -> std::result::Result<(), DisposeError> {
        if let Some(id) = ModuleId::DISPOSE_CHECK_ORDER
            .into_iter()
            .find(|id| self.slots[id.index()].state.is_live())
        {
            return Err(DisposeError {
                host: self,
                error: Error::ModulesLive(id),
            });
        }
        Ok(())
    }

    /// Lifecycle state of a module
    pub fn state(&self, id: ModuleId) -> ModuleState {
        self.slots[id.index()].state
    }

    /// Whether any module is still live
    pub fn is_running(&self) -> bool {
        self.slots.iter().any(|slot| slot.state.is_live())
    }

    /// Services the modules publish
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// The host as plugins see it
    pub fn handle(&self) -> HostHandle {
        self.services.clone()
    }

    /// Signal raised when shutdown is requested
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.services.shutdown_signal().clone()
    }

    /// Feed one line of user input into the system
    pub fn submit_input(&self, line: &str) -> std::result::Result<DispatchOutcome, PluginError> {
        self.services.submit_input(line)
    }

    /// Show the input prompt
    pub fn prompt(&self) -> std::result::Result<(), PluginError> {
        self.services.prompt()
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        for id in ModuleId::QUIT_ORDER {
            let slot = &mut self.slots[id.index()];
            if !slot.state.is_live() {
                continue;
            }
            match slot.module.quit(&self.services) {
                Ok(()) => slot.state = ModuleState::Quit,
                Err(e) => tracing::error!(module = %id, error = %e, "Module quit failed during drop"),
            }
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for id in ModuleId::ALL {
            map.entry(&id.name(), &self.slots[id.index()].state);
        }
        map.finish()
    }
}

/// Builder for [`Host`]
#[derive(Default)]
pub struct HostBuilder {
    config: Option<Config>,
    output_sink: Option<Arc<dyn OutputSink>>,
    static_plugins: Vec<RegisterFn>,
    plugin_paths: Vec<PathBuf>,
    modules: Vec<Box<dyn Module>>,
    shutdown: Option<ShutdownSignal>,
}

impl HostBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Send output here instead of the configured target
    pub fn output_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.output_sink = Some(sink);
        self
    }

    /// Load a plugin linked into the binary
    pub fn static_plugin(mut self, register: RegisterFn) -> Self {
        self.static_plugins.push(register);
        self
    }

    /// Load a plugin unit from disk
    pub fn plugin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.plugin_paths.push(path.into());
        self
    }

    /// Replace a built-in module
    pub fn module(mut self, module: Box<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Share an existing shutdown signal
    pub fn shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Start the host
    pub fn start(self) -> Result<Host> {
        let mut modules = ModuleSet::builtin();
        if let Some(sink) = self.output_sink {
            modules = modules.with_module(Box::new(OutputModule::with_sink(sink)));
        }
        if !self.static_plugins.is_empty() || !self.plugin_paths.is_empty() {
            modules = modules.with_module(Box::new(PluginModule::with_sources(
                self.static_plugins,
                self.plugin_paths,
            )));
        }
        for module in self.modules {
            modules = modules.with_module(module);
        }

        let services = match self.shutdown {
            Some(signal) => Services::with_shutdown(signal),
            None => Services::new(),
        };
        let config = self.config.unwrap_or_default();
        Host::start_with(&config, modules, Arc::new(services))
    }
}

impl fmt::Debug for HostBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuilder")
            .field("config", &self.config)
            .field("static_plugins", &self.static_plugins.len())
            .field("plugin_paths", &self.plugin_paths)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}
