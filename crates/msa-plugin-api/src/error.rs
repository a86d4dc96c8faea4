//! Plugin error types

use std::fmt;

/// Plugin error type
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// A host service is not running
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Command or event parameters were not usable
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

impl PluginError {
    /// Create a new runtime error
    pub fn runtime(msg: impl fmt::Display) -> Self {
        Self::RuntimeError(msg.to_string())
    }

    /// Create a new service unavailable error
    pub fn unavailable(service: impl fmt::Display) -> Self {
        Self::Unavailable(service.to_string())
    }

    /// Create a new invalid arguments error
    pub fn invalid_arguments(msg: impl fmt::Display) -> Self {
        Self::InvalidArguments(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PluginError::runtime("test");
        assert!(matches!(err, PluginError::RuntimeError(_)));

        let err = PluginError::unavailable("agent");
        assert!(matches!(err, PluginError::Unavailable(_)));

        let err = PluginError::invalid_arguments("missing text");
        assert!(matches!(err, PluginError::InvalidArguments(_)));
    }

    #[test]
    fn test_error_display() {
        let err = PluginError::Unavailable("output".to_string());
        assert_eq!(err.to_string(), "Service unavailable: output");
    }
}
