//! Output module

use crate::module::Module;
use crate::output::{OutputSink, OutputTarget};
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use std::fmt;
use std::sync::Arc;

/// Installs the output sink named by `[OUTPUT] TARGET`
#[derive(Default)]
pub struct OutputModule {
    sink: Option<Arc<dyn OutputSink>>,
}

impl OutputModule {
    /// Create the module
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `sink` regardless of configuration
    pub fn with_sink(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink: Some(sink) }
    }
}

impl fmt::Debug for OutputModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputModule")
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}

impl Module for OutputModule {
    fn id(&self) -> ModuleId {
        ModuleId::Output
    }

    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError> {
        let target = section.get_or("TARGET", OutputTarget::Stdout)?;
        let sink = match &self.sink {
            Some(sink) => Arc::clone(sink),
            None => target.sink(),
        };
        services.set_output_sink(Some(sink));
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        if let Some(sink) = services.output_sink() {
            sink.flush()
                .map_err(|e| ModuleError::failed(format!("flush failed: {e}")))?;
        }
        services.set_output_sink(None);
        Ok(())
    }
}
