//! # MSA Plugin API
//!
//! This crate provides the SDK for writing Moe Serifu Agent plugins.
//!
//! A plugin is a [`Plugin`] value with optional lifecycle hooks. It can
//! contribute:
//!
//! - **Commands**: named actions the user runs by typing their name
//! - **Event handlers**: reactions to named events such as [`topics::TEXT_INPUT`]
//!
//! The host is reached only through [`HostApi`], which is handed to the
//! plugin's entry point and to every hook, command and handler.
//!
//! ## Example
//!
//! ```rust,no_run
//! use msa_plugin_api::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Greeter {
//!     info: PluginInfo,
//! }
//!
//! impl Plugin for Greeter {
//!     fn info(&self) -> &PluginInfo {
//!         &self.info
//!     }
//!
//!     fn add_commands(&mut self, _ctx: &PluginContext) -> Result<Vec<Arc<Command>>> {
//!         let hello = Command::new("HELLO", "Greet the user", "HELLO", |host, _params, _sync| {
//!             host.say("Hello, $USER_TITLE!")
//!         });
//!         Ok(vec![Arc::new(hello)])
//!     }
//! }
//!
//! fn register(_host: HostHandle) -> Box<dyn Plugin> {
//!     Box::new(Greeter {
//!         info: PluginInfo::new("greeter", "Greeter", Version::new(0, 1, 0, 0)),
//!     })
//! }
//!
//! declare_plugin!(register);
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod command;
pub mod error;
pub mod event;
pub mod host;
pub mod plugin;

#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used types
pub use command::{Command, CommandHandler, CommandSummary, ParamList};
pub use error::{PluginError, Result};
pub use event::{
    topics, DispatchOutcome, Event, EventHandler, HandlerReport, HandlerStatus, HandlerSync,
    Pending, Subscription, SubscriptionId,
};
pub use host::{AgentSnapshot, AgentState, HostApi, HostHandle, LogLevel, Mood};
pub use plugin::{
    Plugin, PluginContext, PluginDeclaration, PluginInfo, RegisterFn, Version, API_VERSION,
    DECLARATION_SYMBOL,
};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::command::{Command, ParamList};
    pub use crate::error::PluginError;
    pub use crate::event::{Event, EventHandler, HandlerSync, Pending, Subscription};
    pub use crate::host::{HostApi, HostHandle, LogLevel};
    pub use crate::plugin::{Plugin, PluginContext, PluginInfo, Version};
}
