//! Command module
//!
//! Owns the command registry and the built-in commands, and turns each
//! `TEXT_INPUT` event into a command invocation.

use crate::commands::CommandRegistry;
use crate::module::Module;
use crate::services::Services;
use msa_config::Section;
use msa_core::{ModuleError, ModuleId};
use msa_plugin_api::{
    topics, Command, Event, HandlerSync, HostApi, ParamList, PluginError, SubscriptionId,
};
use std::sync::Arc;

/// Owner name used for the built-in commands
pub const BUILTIN_OWNER: &str = "command";

/// Runs the command registry
#[derive(Debug, Default)]
pub struct CommandModule {
    builtins: Vec<Arc<Command>>,
    subscription: Option<SubscriptionId>,
}

impl CommandModule {
    /// Create the module
    pub fn new() -> Self {
        Self::default()
    }
}

fn builtin_commands() -> Vec<Arc<Command>> {
    let help = Command::new(
        "HELP",
        "list available commands",
        "HELP",
        |host: &dyn HostApi, _: &ParamList, _: &HandlerSync| {
            let mut text = String::new();
            for command in host.commands() {
                text.push_str(&format!("  {} - {}\n", command.usage, command.description));
            }
            host.write_text(&text)
        },
    );

    let say = Command::new(
        "SAY",
        "have the agent repeat something",
        "SAY <text>",
        |host: &dyn HostApi, params: &ParamList, _: &HandlerSync| {
            if params.is_empty() {
                return Err(PluginError::invalid_arguments("SAY needs something to say"));
            }
            host.say(&params.joined())
        },
    );

    let exit = Command::new(
        "EXIT",
        "shut the agent down",
        "EXIT",
        |host: &dyn HostApi, _: &ParamList, _: &HandlerSync| {
            host.say("Goodbye, $USER_TITLE.")?;
            host.request_shutdown();
            Ok(())
        },
    );

    vec![Arc::new(help), Arc::new(say), Arc::new(exit)]
}

/// Split a line of input into a command and run it
pub(crate) fn run_line(
    registry: &CommandRegistry,
    host: &dyn HostApi,
    event: &Event,
    sync: &HandlerSync,
) -> Result<(), PluginError> {
    let Some(text) = event.text() else {
        return Ok(());
    };
    let mut words = text.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(());
    };

    let Some(command) = registry.lookup(name) else {
        host.debug(&format!("No command named {name}"));
        return host.say(&format!("I'm sorry, $USER_TITLE, I don't know how to {name}."));
    };

    let params: ParamList = words.collect();
    host.trace(&format!("Running command {}", command.name()));
    command.invoke(host, &params, sync)
}

impl Module for CommandModule {
    fn id(&self) -> ModuleId {
        ModuleId::Command
    }

    fn init(&mut self, services: &Arc<Services>, _section: &Section) -> Result<(), ModuleError> {
        let registry = Arc::new(CommandRegistry::new());
        let builtins = builtin_commands();
        for command in &builtins {
            registry.register(BUILTIN_OWNER, command)?;
        }

        let dispatcher = services
            .dispatcher()
            .ok_or_else(|| ModuleError::failed("Event module is not running"))?;
        let handler_registry = Arc::clone(&registry);
        let id = dispatcher.subscribe(
            topics::TEXT_INPUT,
            Arc::new(
                move |host: &dyn HostApi, event: &Event, sync: &HandlerSync| {
                    run_line(&handler_registry, host, event, sync)
                },
            ),
        );

        self.builtins = builtins;
        self.subscription = Some(id);
        services.set_command_registry(Some(registry));
        Ok(())
    }

    fn quit(&mut self, services: &Arc<Services>) -> Result<(), ModuleError> {
        if let (Some(id), Some(dispatcher)) = (self.subscription.take(), services.dispatcher()) {
            dispatcher.unsubscribe(id);
        }
        if let Some(registry) = services.command_registry() {
            registry.clear();
        }
        services.set_command_registry(None);
        self.builtins.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::EventModule;
    use crate::output::BufferSink;

    fn services() -> (Arc<Services>, BufferSink) {
        let services = Arc::new(Services::new());
        let sink = BufferSink::new();
        services.set_output_sink(Some(Arc::new(sink.clone())));
        EventModule::new()
            .init(&services, &Section::new("EVENT"))
            .unwrap();
        (services, sink)
    }

    #[test]
    fn test_builtins_registered_in_order() {
        let (services, _) = services();
        let mut module = CommandModule::new();
        module.init(&services, &Section::new("COMMAND")).unwrap();

        let names: Vec<_> = services.commands().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["HELP", "SAY", "EXIT"]);

        module.quit(&services).unwrap();
        assert!(services.command_registry().is_none());
        assert_eq!(
            services
                .dispatcher()
                .unwrap()
                .subscriber_count(topics::TEXT_INPUT),
            0
        );
    }

    #[test]
    fn test_help_lists_commands() {
        let (services, sink) = services();
        let mut module = CommandModule::new();
        module.init(&services, &Section::new("COMMAND")).unwrap();

        let outcome = services.dispatch(Event::text_input("help")).unwrap();
        assert!(outcome.all_completed());
        assert!(sink.contents().contains("SAY <text> - have the agent repeat something"));
    }

    #[test]
    fn test_exit_without_agent_fails() {
        let (services, _) = services();
        let registry = CommandRegistry::new();
        let builtins = builtin_commands();
        for command in &builtins {
            registry.register(BUILTIN_OWNER, command).unwrap();
        }

        // no agent: say fails, so shutdown is never requested
        let result = run_line(
            &registry,
            services.as_ref(),
            &Event::text_input("exit"),
            &HandlerSync::new(),
        );
        assert!(result.is_err());
        assert!(!services.shutdown_signal().is_triggered());
    }

    #[test]
    fn test_without_text_is_ignored() {
        let (services, _) = services();
        let registry = CommandRegistry::new();
        run_line(
            &registry,
            services.as_ref(),
            &Event::new(topics::TEXT_INPUT, serde_json::Value::Null),
            &HandlerSync::new(),
        )
        .unwrap();
    }
}
