//! Plugin module
//!
//! Loads plugins at init, registers their commands at setup and unloads them
//! at quit. A misbehaving plugin is logged and skipped; it never stops the
//! module or the other plugins.

use crate::module::Module;
use crate::pinned::UnitGuard;
use crate::services::Services;
use msa_config::Section;
use msa_core::{Error, ModuleError, ModuleId};
use msa_plugin_api::{HostApi, HostHandle, PluginContext, RegisterFn};
use msa_plugin_runtime::{PluginEntry, PluginLoader, PluginRegistry, PluginSource};
use std::path::PathBuf;
use std::sync::Arc;

/// Loads and drives plugins
#[derive(Debug, Default)]
pub struct PluginModule {
    sources: Vec<PluginSource>,
}

impl PluginModule {
    /// Create a module that loads only what configuration names
    pub fn new() -> Self {
        Self::default()
    }

    /// Also load these entry points and units, before the configured ones
    pub fn with_sources(statics: Vec<RegisterFn>, paths: Vec<PathBuf>) -> Self {
        let sources = statics
            .into_iter()
            .map(PluginSource::Static)
            .chain(paths.into_iter().map(PluginSource::Dynamic))
            .collect();
        Self { sources }
    }

    fn configured_sources(
        &self,
        services: &Services,
        loader: &PluginLoader,
        section: &Section,
    ) -> Vec<PluginSource> {
        let mut sources = self.sources.clone();
        sources.extend(
            section
                .get_list("PATHS")
                .into_iter()
                .map(|path| PluginSource::Dynamic(PathBuf::from(path))),
        );

        if let Some(dir) = section.get("DIR") {
            match loader.discover(dir) {
                Ok(found) => sources.extend(found.into_iter().map(PluginSource::Dynamic)),
                Err(e) => services.error(&format!("Failed to search plugin directory {dir}: {e}")),
            }
        }
        sources
    }
}

/// Settings for one plugin: `[PLUGIN]` keys under its name, prefix stripped
fn plugin_settings(section: &Section, plugin: &str) -> serde_json::Value {
    let prefix = format!("{}.", plugin.to_uppercase());
    serde_json::Value::Object(
        section
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_string(), serde_json::Value::String(value.to_string())))
            })
            .collect(),
    )
}

fn load_one(
    services: &Arc<Services>,
    loader: &PluginLoader,
    registry: &PluginRegistry,
    section: &Section,
    source: &PluginSource,
) {
    let host: HostHandle = services.clone();
    let loaded = match loader.load(source, Arc::clone(&host)) {
        Ok(loaded) => loaded,
        Err(e) => {
            services.error(&format!("Failed to load plugin: {}", Error::from(e)));
            return;
        }
    };

    let name = loaded.plugin.info().name.clone();
    let context = PluginContext::new(host, plugin_settings(section, &name));
    let entry = match registry.register(loaded, context) {
        Ok(entry) => entry,
        Err(e) => {
            services.error(&Error::from(e).to_string());
            return;
        }
    };

    match entry.init() {
        Ok(()) => services.debug(&format!("Initialized plugin {}", entry.name())),
        Err(e) => services.error(&format!("Plugin {} failed to start: {}", entry.name(), e)),
    }
}

/// Unhook a plugin from the running system and run its `quit` hook
pub(crate) fn release(services: &Services, entry: &PluginEntry) {
    if let Some(commands) = services.command_registry() {
        commands.remove_owner(entry.name());
    }
    if let Some(dispatcher) = services.dispatcher() {
        for id in entry.take_subscriptions() {
            dispatcher.unsubscribe(id);
        }
    }
    match entry.quit() {
        Ok(()) => services.debug(&format!("Unloaded plugin {}", entry.name())),
        Err(e) => services.error(&format!("Plugin {} failed to stop: {}", entry.name(), e)),
    }
}

impl Module for PluginModule {
    fn id(&self) -> ModuleId {
        ModuleId::Plugin
    }

    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError> {
        let loader = PluginLoader::new().map_err(|e| ModuleError::failed(e.to_string()))?;
        let registry = Arc::new(PluginRegistry::new());

        for source in self.configured_sources(services, &loader, section) {
            load_one(services, &loader, &registry, section, &source);
        }

        services.info(&format!("Loaded {} plugin(s)", registry.len()));
        services.set_plugin_registry(Some(registry));
        Ok(())
    }

    fn setup(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        let Some(registry) = services.plugin_registry() else {
            return Ok(());
        };
        let commands = services.command_registry();

        for entry in registry.entries() {
            if !entry.is_active() {
                continue;
            }
            if let Err(e) = entry.setup() {
                services.error(&format!("Plugin {} failed setup: {}", entry.name(), e));
                continue;
            }

            let added = match entry.add_commands() {
                Ok(added) => added,
                Err(e) => {
                    services.error(&format!(
                        "Plugin {} failed to add commands: {}",
                        entry.name(),
                        e
                    ));
                    continue;
                }
            };
            let Some(commands) = &commands else {
                continue;
            };
            for command in &added {
                let unit = entry.library().map(|library| library as UnitGuard);
                match commands.register_pinned(entry.name(), command, unit) {
                    Ok(()) => services.debug(&format!(
                        "Plugin {} added command {}",
                        entry.name(),
                        command.name()
                    )),
                    Err(e) => services.error(&format!("Plugin {}: {}", entry.name(), e)),
                }
            }
        }
        Ok(())
    }

    fn teardown(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        let Some(registry) = services.plugin_registry() else {
            return Ok(());
        };
        let commands = services.command_registry();

        for entry in registry.entries() {
            if let Some(commands) = &commands {
                commands.remove_owner(entry.name());
            }
            if !entry.is_active() {
                continue;
            }
            if let Err(e) = entry.teardown() {
                services.error(&format!("Plugin {} failed teardown: {}", entry.name(), e));
            }
        }
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        if let Some(registry) = services.plugin_registry() {
            // last loaded, first unloaded
            for entry in registry.drain().iter().rev() {
                release(services, entry);
            }
        }
        services.set_plugin_registry(None);
        Ok(())
    }
}
