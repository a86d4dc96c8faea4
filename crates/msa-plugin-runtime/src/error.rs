//! Plugin runtime error types

use msa_plugin_api::PluginError;
use std::fmt;
use std::path::PathBuf;

/// Plugin runtime error type
#[derive(Debug, thiserror::Error)]
pub enum PluginRuntimeError {
    /// Plugin error
    #[error("Plugin error: {0}")]
    PluginError(#[from] PluginError),

    /// Plugin already exists
    #[error("Plugin already exists: {0}")]
    PluginAlreadyExists(String),

    /// Plugin declared an unusable name
    #[error("Invalid plugin name: {0:?}")]
    InvalidName(String),

    /// Plugin unit was built against an incompatible API
    #[error("Plugin {path} was built for API {found}, host provides {required}")]
    IncompatibleApi {
        /// Unit path
        path: PathBuf,
        /// Version the plugin declared
        found: String,
        /// Version requirement of the host
        required: String,
    },

    /// Plugin unit could not be loaded
    #[error("Failed to load plugin {path}: {reason}")]
    LoadFailed {
        /// Unit path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// The entry point panicked
    #[error("Plugin entry point panicked: {0}")]
    EntryPanicked(String),

    /// Dynamic loading was compiled out
    #[error("Dynamic plugin loading is disabled, cannot load {0}")]
    DynamicLoadingDisabled(PathBuf),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for plugin runtime operations
pub type Result<T> = std::result::Result<T, PluginRuntimeError>;

impl PluginRuntimeError {
    /// Create a new already exists error
    pub fn already_exists(name: impl fmt::Display) -> Self {
        Self::PluginAlreadyExists(name.to_string())
    }

    /// Create a new load failure
    pub fn load_failed(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new invalid state error
    pub fn invalid_state(msg: impl fmt::Display) -> Self {
        Self::InvalidState(msg.to_string())
    }
}

impl From<PluginRuntimeError> for msa_core::Error {
    fn from(err: PluginRuntimeError) -> Self {
        match err {
            PluginRuntimeError::PluginAlreadyExists(name) => {
                msa_core::Error::DuplicatePluginName(name)
            }
            PluginRuntimeError::InvalidName(name) => {
                msa_core::Error::plugin_registration(name, "name must not be empty")
            }
            PluginRuntimeError::IncompatibleApi { ref path, .. }
            | PluginRuntimeError::LoadFailed { ref path, .. }
            | PluginRuntimeError::DynamicLoadingDisabled(ref path) => {
                msa_core::Error::plugin_registration(path.display().to_string(), err.to_string())
            }
            other => msa_core::Error::plugin_registration("<unknown>", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PluginRuntimeError::already_exists("test");
        assert!(matches!(err, PluginRuntimeError::PluginAlreadyExists(_)));
    }

    #[test]
    fn test_error_display() {
        let err = PluginRuntimeError::InvalidName(String::new());
        assert_eq!(err.to_string(), "Invalid plugin name: \"\"");
    }

    #[test]
    fn test_into_core_error() {
        let err: msa_core::Error = PluginRuntimeError::already_exists("example").into();
        assert!(matches!(err, msa_core::Error::DuplicatePluginName(ref n) if n == "example"));

        let err: msa_core::Error =
            PluginRuntimeError::load_failed("/tmp/libx.so", "no such file").into();
        assert!(matches!(err, msa_core::Error::PluginRegistration { .. }));
        assert_eq!(err.status(), msa_core::Status::Plugin);
    }
}
