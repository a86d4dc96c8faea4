//! Agent module

use crate::agent::{Agent, AGENT_NAME_VAR, DEFAULT_NAME, DEFAULT_USER_TITLE, USER_TITLE_VAR};
use crate::module::Module;
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use msa_plugin_api::Mood;
use std::sync::Arc;

/// Creates the agent from `[AGENT]` and publishes its substitutions
#[derive(Debug, Default)]
pub struct AgentModule;

impl AgentModule {
    /// Create the module
    pub fn new() -> Self {
        Self
    }
}

impl Module for AgentModule {
    fn id(&self) -> ModuleId {
        ModuleId::Agent
    }

    fn init(&mut self, services: &Arc<Services>, section: &Section) -> Result<(), ModuleError> {
        let name = section.get("NAME").unwrap_or(DEFAULT_NAME).trim();
        if name.is_empty() {
            return Err(ModuleError::failed("agent name must not be empty"));
        }
        let user_title = section.get("USER_TITLE").unwrap_or(DEFAULT_USER_TITLE).trim();
        let mood = section.get_or("MOOD", Mood::Normal)?;

        let agent = Agent::new(name, user_title, mood)
            .map_err(|e| ModuleError::failed(format!("substitution pattern: {e}")))?;
        agent.expander().register(AGENT_NAME_VAR, agent.name());
        agent.expander().register(USER_TITLE_VAR, agent.user_title());

        services.set_agent(Some(Arc::new(agent)));
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        if let Some(agent) = services.agent_handle() {
            agent.expander().unregister(AGENT_NAME_VAR);
            agent.expander().unregister(USER_TITLE_VAR);
        }
        services.set_agent(None);
        Ok(())
    }
}
