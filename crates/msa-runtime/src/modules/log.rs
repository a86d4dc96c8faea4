//! Log module

use crate::log::Logger;
use crate::module::Module;
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use msa_plugin_api::LogLevel;
use std::sync::Arc;

/// Installs the host logger
#[derive(Debug, Default)]
pub struct LogModule;

impl LogModule {
    /// Create the module
    pub fn new() -> Self {
        Self
    }
}

impl Module for LogModule {
    fn id(&self) -> ModuleId {
        ModuleId::Log
    }

    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError> {
        let level = section.get_or("LEVEL", LogLevel::Info)?;
        services.set_logger(Some(Arc::new(Logger::new(level))));
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        services.set_logger(None);
        Ok(())
    }
}
