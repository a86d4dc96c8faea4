//! Core plugin trait and types

use crate::command::Command;
use crate::error::Result;
use crate::event::Subscription;
use crate::host::HostHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Version of this API. Dynamic plugins built against an incompatible
/// version are refused at load time.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Symbol a dynamic plugin exports; see [`declare_plugin!`](crate::declare_plugin)
pub const DECLARATION_SYMBOL: &[u8] = b"msa_plugin_declaration\0";

/// Plugin entry point
///
/// Receives the host's service view and returns the plugin. The plugin may
/// keep the handle to call back into the host later.
pub type RegisterFn = fn(HostHandle) -> Box<dyn Plugin>;

/// Static record exported by a dynamic plugin unit
#[derive(Debug, Clone, Copy)]
pub struct PluginDeclaration {
    /// [`API_VERSION`] the plugin was built against
    pub api_version: &'static str,
    /// Entry point
    pub register: RegisterFn,
}

/// Export the entry point of a dynamic plugin
///
/// ```rust,ignore
/// fn register(host: msa_plugin_api::HostHandle) -> Box<dyn msa_plugin_api::Plugin> {
///     Box::new(MyPlugin::new(host))
/// }
///
/// msa_plugin_api::declare_plugin!(register);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($register:path) => {
        #[doc(hidden)]
        #[allow(unsafe_code, non_upper_case_globals)]
        #[no_mangle]
        pub static msa_plugin_declaration: $crate::PluginDeclaration = $crate::PluginDeclaration {
            api_version: $crate::API_VERSION,
            register: $register,
        };
    };
}

/// Core plugin trait that all plugins must implement
///
/// Every hook is optional. Hooks run on the host's lifecycle thread, never
/// concurrently with each other.
pub trait Plugin: Send + Sync + fmt::Debug {
    /// Plugin identity and metadata
    fn info(&self) -> &PluginInfo;

    /// Called once after the plugin is registered
    fn init(&mut self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called once every plugin is initialized
    fn setup(&mut self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Commands this plugin contributes
    ///
    /// Called during setup. The host keeps the returned commands alive until
    /// the plugin quits.
    fn add_commands(&mut self, _ctx: &PluginContext) -> Result<Vec<Arc<Command>>> {
        Ok(Vec::new())
    }

    /// Event handlers this plugin contributes
    fn event_handlers(&mut self, _ctx: &PluginContext) -> Result<Vec<Subscription>> {
        Ok(Vec::new())
    }

    /// Called on normal shutdown before quit
    fn teardown(&mut self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Release everything; the plugin is dropped right after
    fn quit(&mut self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Context handed to every plugin hook
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Host services
    pub host: HostHandle,
    /// Settings nested under the plugin's name in `[PLUGIN]`, as a JSON object
    pub config: serde_json::Value,
}

impl PluginContext {
    /// Create a context
    pub fn new(host: HostHandle, config: serde_json::Value) -> Self {
        Self { host, config }
    }

    /// String setting from the plugin's configuration
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config
            .get(key.to_uppercase())
            .and_then(|v| v.as_str())
    }
}

/// Plugin identity and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique name
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Author names
    pub authors: Vec<String>,
    /// Plugin version
    pub version: Version,
}

impl PluginInfo {
    /// Create plugin info
    pub fn new(name: impl Into<String>, title: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            authors: Vec::new(),
            version,
        }
    }

    /// Add an author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }
}

/// Four-part plugin version: `major.minor.patch.build`
///
/// Recorded for display only; no compatibility rule applies to it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
    /// Build number
    pub build: u32,
}

impl Version {
    /// Create a version
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display_and_order() {
        let v = Version::new(1, 0, 0, 0);
        assert_eq!(v.to_string(), "1.0.0.0");
        assert!(Version::new(1, 0, 0, 1) > v);
        assert!(Version::new(0, 9, 9, 9) < v);
    }

    #[test]
    fn test_plugin_info_builder() {
        let info = PluginInfo::new("example", "Example Plugin", Version::new(1, 0, 0, 0))
            .with_author("dekarrin");
        assert_eq!(info.authors, vec!["dekarrin".to_string()]);
    }

    #[test]
    fn test_declaration_symbol_is_nul_terminated() {
        assert_eq!(DECLARATION_SYMBOL.last(), Some(&0));
    }
}
