//! Built-in modules

pub mod agent;
pub mod command;
pub mod event;
pub mod input;
pub mod log;
pub mod output;
pub mod plugin;

pub use agent::AgentModule;
pub use command::CommandModule;
pub use event::EventModule;
pub use input::InputModule;
pub use log::LogModule;
pub use output::OutputModule;
pub use plugin::PluginModule;
