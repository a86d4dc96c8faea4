//! # MSA Plugin Runtime
//!
//! Loading and registration of Moe Serifu Agent plugins.
//!
//! ## Features
//!
//! - **Plugin Loader**: static entry points and shared libraries (`dynamic-loading`)
//! - **Plugin Registry**: ordered, name-unique registration
//! - **Lifecycle Hooks**: panic-isolated `init`, `setup`, `teardown`, `quit`
//!
//! ## Example
//!
//! ```rust,no_run
//! use msa_plugin_runtime::*;
//! # fn example(host: msa_plugin_api::HostHandle) -> Result<()> {
//! let loader = PluginLoader::new()?;
//! let registry = PluginRegistry::new();
//!
//! let source = PluginSource::Dynamic("plugins/libmsa_example_plugin.so".into());
//! let loaded = loader.load(&source, host.clone())?;
//! let context = msa_plugin_api::PluginContext::new(host, serde_json::json!({}));
//!
//! let entry = registry.register(loaded, context)?;
//! entry.init()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod loader;
pub mod registry;

pub use error::{PluginRuntimeError, Result};
pub use loader::{LoadedLibrary, LoadedPlugin, PluginLoader, PluginOrigin, PluginSource};
pub use registry::{PluginEntry, PluginRegistry, PluginState};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::error::{PluginRuntimeError, Result};
    pub use crate::loader::{PluginLoader, PluginSource};
    pub use crate::registry::{PluginEntry, PluginRegistry};
    pub use msa_plugin_api::prelude::*;
}
