//! Plugin loader for static and dynamic plugins

use crate::error::{PluginRuntimeError, Result};
use msa_plugin_api::{HostHandle, Plugin, RegisterFn, API_VERSION};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a plugin comes from
#[derive(Clone)]
pub enum PluginSource {
    /// Entry point linked into the host binary
    Static(RegisterFn),
    /// Shared library on disk exporting a plugin declaration
    Dynamic(PathBuf),
}

impl fmt::Debug for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::Static(_) => f.write_str("Static"),
            PluginSource::Dynamic(path) => f.debug_tuple("Dynamic").field(path).finish(),
        }
    }
}

/// Where a loaded plugin came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOrigin {
    /// Linked into the host
    Static,
    /// Loaded from this path
    Dynamic(PathBuf),
}

impl fmt::Display for PluginOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginOrigin::Static => write!(f, "static"),
            PluginOrigin::Dynamic(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Open shared library backing a dynamic plugin
///
/// Must outlive every value created by the plugin.
pub struct LoadedLibrary {
    path: PathBuf,
    #[cfg(feature = "dynamic-loading")]
    _library: libloading::Library,
}

impl LoadedLibrary {
    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LoadedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A plugin instance fresh from its entry point
#[derive(Debug)]
pub struct LoadedPlugin {
    /// The plugin
    pub plugin: Box<dyn Plugin>,
    /// Where it came from
    pub origin: PluginOrigin,
    /// Backing library for dynamic plugins
    pub library: Option<LoadedLibrary>,
}

/// Plugin loader
#[derive(Debug, Clone)]
pub struct PluginLoader {
    api_requirement: semver::VersionReq,
}

impl PluginLoader {
    /// Create a loader accepting plugins built against a compatible API
    pub fn new() -> Result<Self> {
        let api_requirement = semver::VersionReq::parse(&format!("^{API_VERSION}"))
            .map_err(|e| PluginRuntimeError::invalid_state(format!("bad API version: {e}")))?;
        Ok(Self { api_requirement })
    }

    /// Run a plugin's entry point
    pub fn load(&self, source: &PluginSource, host: HostHandle) -> Result<LoadedPlugin> {
        match source {
            PluginSource::Static(register) => {
                let plugin = call_entry(*register, host)?;
                debug!(plugin = %plugin.info().name, "Static plugin created");
                Ok(LoadedPlugin {
                    plugin,
                    origin: PluginOrigin::Static,
                    library: None,
                })
            }
            PluginSource::Dynamic(path) => self.load_dynamic(path, host),
        }
    }

    /// Check a declared API version against the host's
    pub fn check_api_version(&self, path: &Path, declared: &str) -> Result<()> {
        let incompatible = || PluginRuntimeError::IncompatibleApi {
            path: path.to_path_buf(),
            found: declared.to_string(),
            required: self.api_requirement.to_string(),
        };

        let version = semver::Version::parse(declared).map_err(|_| incompatible())?;
        if !self.api_requirement.matches(&version) {
            return Err(incompatible());
        }
        Ok(())
    }

    /// Load a plugin from a dynamic library
    ///
    /// The library must export the symbol written by
    /// [`declare_plugin!`](msa_plugin_api::declare_plugin) and be built with
    /// the same compiler as the host.
    #[cfg(feature = "dynamic-loading")]
    #[allow(unsafe_code)]
    fn load_dynamic(&self, path: &Path, host: HostHandle) -> Result<LoadedPlugin> {
        use msa_plugin_api::{PluginDeclaration, DECLARATION_SYMBOL};

        // SAFETY: running the library's initializers is the point of loading it
        let library = unsafe { libloading::Library::new(path) }
            .map_err(|e| PluginRuntimeError::load_failed(path, e))?;

        // SAFETY: the symbol is a `PluginDeclaration` static written by
        // `declare_plugin!`; the value is copied out while the library is open
        let declaration: PluginDeclaration = unsafe {
            let symbol = library
                .get::<*const PluginDeclaration>(DECLARATION_SYMBOL)
                .map_err(|e| PluginRuntimeError::load_failed(path, e))?;
            **symbol
        };

        self.check_api_version(path, declaration.api_version)?;

        let plugin = call_entry(declaration.register, host)?;
        tracing::info!(
            plugin = %plugin.info().name,
            path = %path.display(),
            "Dynamic plugin loaded"
        );

        Ok(LoadedPlugin {
            plugin,
            origin: PluginOrigin::Dynamic(path.to_path_buf()),
            library: Some(LoadedLibrary {
                path: path.to_path_buf(),
                _library: library,
            }),
        })
    }

    #[cfg(not(feature = "dynamic-loading"))]
    fn load_dynamic(&self, path: &Path, _host: HostHandle) -> Result<LoadedPlugin> {
        Err(PluginRuntimeError::DynamicLoadingDisabled(path.to_path_buf()))
    }

    /// Find plugin units in a directory
    ///
    /// Returns files with the platform's shared library extension, sorted by
    /// path so load order is stable.
    pub fn discover<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut found = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_library = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == std::env::consts::DLL_EXTENSION)
                .unwrap_or(false);

            if path.is_file() && is_library {
                found.push(path);
            }
        }

        found.sort();
        debug!(dir = %dir.display(), count = found.len(), "Discovered plugin units");
        Ok(found)
    }
}

fn call_entry(register: RegisterFn, host: HostHandle) -> Result<Box<dyn Plugin>> {
    catch_unwind(AssertUnwindSafe(|| register(host))).map_err(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        PluginRuntimeError::EntryPanicked(message)
    })
}
