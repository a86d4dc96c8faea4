//! Error types for the Moe Serifu Agent host

use crate::types::{ModuleId, Status};

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for the host
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded or a value could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// A module failed to initialize
    #[error("Failed to start {module} module: {source}")]
    ModuleInit {
        /// Module that failed
        module: ModuleId,
        /// Failure reported by the module
        #[source]
        source: ModuleError,
    },

    /// A module failed during setup
    #[error("Failed to set up {module} module: {source}")]
    ModuleSetup {
        /// Module that failed
        module: ModuleId,
        /// Failure reported by the module
        #[source]
        source: ModuleError,
    },

    /// A module failed during teardown
    #[error("Failed to tear down {module} module: {source}")]
    ModuleTeardown {
        /// Module that failed
        module: ModuleId,
        /// Failure reported by the module
        #[source]
        source: ModuleError,
    },

    /// A module failed to quit; later modules in the quit order were left running
    #[error("Failed to stop {module} module: {source}")]
    ModuleQuit {
        /// Module that failed
        module: ModuleId,
        /// Failure reported by the module
        #[source]
        source: ModuleError,
    },

    /// A host cannot be disposed while a module still holds live state
    #[error("{0} module has not been quit")]
    ModulesLive(ModuleId),

    /// A module service was used while the module is not running
    #[error("{0} module is not running")]
    ModuleUnavailable(ModuleId),

    /// A plugin could not be registered
    #[error("Plugin registration failed for '{plugin}': {reason}")]
    PluginRegistration {
        /// Plugin name, or the unit path if the name is unknown
        plugin: String,
        /// Why registration failed
        reason: String,
    },

    /// A plugin with the same name is already loaded
    #[error("Plugin '{0}' is already registered")]
    DuplicatePluginName(String),

    /// A command with the same name is already registered
    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create a plugin registration error
    pub fn plugin_registration(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::PluginRegistration {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// The module this error is attributed to, if any
    pub fn module(&self) -> Option<ModuleId> {
        match self {
            Error::ModuleInit { module, .. }
            | Error::ModuleSetup { module, .. }
            | Error::ModuleTeardown { module, .. }
            | Error::ModuleQuit { module, .. } => Some(*module),
            Error::ModulesLive(module) | Error::ModuleUnavailable(module) => Some(*module),
            Error::PluginRegistration { .. } | Error::DuplicatePluginName(_) => {
                Some(ModuleId::Plugin)
            }
            Error::DuplicateCommand(_) => Some(ModuleId::Command),
            Error::Config(_) | Error::Io(_) => None,
        }
    }

    /// Status code identifying the subsystem that produced this error
    pub fn status(&self) -> Status {
        match self.module() {
            Some(module) => module.status(),
            None => Status::Config,
        }
    }
}

/// Failure reported by a module lifecycle operation
///
/// Carries the raw status value the module produced, which is logged at debug
/// level for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct ModuleError {
    /// Raw, module-specific status value; never zero
    pub status: i32,
    /// Human-readable description
    pub message: String,
}

impl ModuleError {
    /// Status used when a module has no more specific value
    pub const GENERIC_STATUS: i32 = -1;

    /// Create a module error with a specific status
    pub fn new(status: i32, message: impl Into<String>) -> Self {
        let status = if status == 0 {
            Self::GENERIC_STATUS
        } else {
            status
        };
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a module error with the generic status
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(Self::GENERIC_STATUS, message)
    }
}

impl From<Error> for ModuleError {
    fn from(err: Error) -> Self {
        ModuleError::new(err.status().code(), err.to_string())
    }
}
