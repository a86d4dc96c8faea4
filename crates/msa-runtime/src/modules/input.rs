//! Input module

use crate::input::{InputPort, DEFAULT_HISTORY_SIZE};
use crate::module::Module;
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use std::sync::Arc;

/// Accepts user input and turns it into events
#[derive(Debug, Default)]
pub struct InputModule;

impl InputModule {
    /// Create the module
    pub fn new() -> Self {
        Self
    }
}

impl Module for InputModule {
    fn id(&self) -> ModuleId {
        ModuleId::Input
    }

    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError> {
        let history = section.get_or("HISTORY_SIZE", DEFAULT_HISTORY_SIZE)?;
        services.set_input_port(Some(Arc::new(InputPort::new(history))));
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        if let Some(port) = services.input_port() {
            port.close();
        }
        services.set_input_port(None);
        Ok(())
    }
}
