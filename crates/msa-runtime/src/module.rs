//! The module contract and the set of modules a host runs

use crate::modules::{
    AgentModule, CommandModule, EventModule, InputModule, LogModule, OutputModule, PluginModule,
};
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use std::fmt;
use std::sync::Arc;

/// A built-in subsystem driven by the host's lifecycle
///
/// Only `init` and `quit` are required. The host calls `setup` and
/// `teardown` on the modules that need them and never calls any hook
/// concurrently with another.
///
/// A module publishes what it offers to the rest of the system by installing
/// it into [`Services`] during `init` and removes it again during `quit`.
pub trait Module: Send + fmt::Debug {
    /// Which slot this module fills
    fn id(&self) -> ModuleId;

    /// Start the module from its configuration section
    ///
    /// The section is empty when the configuration has none for this module.
    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError>;

    /// Finish wiring once every module is initialized
    fn setup(&mut self, _services: &Arc<Services>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Undo `setup` on a normal shutdown
    fn teardown(&mut self, _services: &Arc<Services>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Release everything acquired in `init`
    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError>;
}

/// One module per [`ModuleId`]
#[derive(Debug)]
pub struct ModuleSet {
    modules: Vec<Box<dyn Module>>,
}

impl ModuleSet {
    /// The seven built-in modules with default settings
    pub fn builtin() -> Self {
        // same order as ModuleId::ALL, so a slot's index is its id's index
        Self {
            modules: vec![
                Box::new(LogModule::new()) as Box<dyn Module>,
                Box::new(OutputModule::new()) as Box<dyn Module>,
                Box::new(EventModule::new()) as Box<dyn Module>,
                Box::new(InputModule::new()) as Box<dyn Module>,
                Box::new(AgentModule::new()) as Box<dyn Module>,
                Box::new(CommandModule::new()) as Box<dyn Module>,
                Box::new(PluginModule::new()) as Box<dyn Module>,
            ],
        }
    }

    /// Replace the module in the slot `module` claims
    pub fn with_module(mut self, module: Box<dyn Module>) -> Self {
        let index = module.id().index();
        self.modules[index] = module;
        self
    }

    /// The module in a slot
    pub fn get(&self, id: ModuleId) -> &dyn Module {
        self.modules[id.index()].as_ref()
    }

    pub(crate) fn into_modules(self) -> Vec<Box<dyn Module>> {
        self.modules
    }
}

impl Default for ModuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}
