//! # Example Plugin
//!
//! Demonstrates the smallest useful Moe Serifu Agent plugin: it creates one
//! command at `init`, hands it to the host at setup and drops it at `quit`.
//!
//! ## Commands
//!
//! - `LOVE`: the agent confirms that plugin commands work
//!
//! ## Configuration
//!
//! ```yaml
//! plugin:
//!   example:
//!     message: "$USER_TITLE, the new command works!"
//! ```
//!
//! Build as a shared library and list it under `plugin.paths`, or link it
//! in and pass [`register`] to the host builder.

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

use msa_plugin_api::prelude::*;
use msa_plugin_api::Result;
use std::sync::Arc;

/// Plugin name
pub const NAME: &str = "example";

/// What the agent says when `LOVE` runs, unless configured otherwise
pub const DEFAULT_MESSAGE: &str = "$USER_TITLE, the new command works!";

/// The example plugin
#[derive(Debug)]
pub struct ExamplePlugin {
    info: PluginInfo,
    commands: Vec<Arc<Command>>,
}

impl ExamplePlugin {
    /// Create the plugin
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new(NAME, "Example Plugin", Version::new(1, 0, 0, 0))
                .with_author("dekarrin"),
            commands: Vec::new(),
        }
    }
}

impl Default for ExamplePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ExamplePlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn init(&mut self, ctx: &PluginContext) -> Result<()> {
        let message = ctx.setting("MESSAGE").unwrap_or(DEFAULT_MESSAGE).to_string();
        let love = Command::new(
            "LOVE",
            "execute a test function",
            "LOVE",
            move |host: &dyn HostApi, _: &ParamList, _: &HandlerSync| host.say(&message),
        );
        self.commands.push(Arc::new(love));
        Ok(())
    }

    fn add_commands(&mut self, _ctx: &PluginContext) -> Result<Vec<Arc<Command>>> {
        Ok(self.commands.clone())
    }

    fn quit(&mut self, _ctx: &PluginContext) -> Result<()> {
        self.commands.clear();
        Ok(())
    }
}

/// Entry point
pub fn register(_host: HostHandle) -> Box<dyn Plugin> {
    Box::new(ExamplePlugin::new())
}

msa_plugin_api::declare_plugin!(register);
