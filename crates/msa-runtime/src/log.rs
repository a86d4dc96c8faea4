//! Host logger

use msa_plugin_api::LogLevel;

/// `tracing` target for everything logged through the host
pub const LOG_TARGET: &str = "msa";

/// Level-filtered logger installed by the Log module
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Create a logger passing `level` and above
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Lowest level passed through
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether messages at `level` are passed through
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    /// Log a message
    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        match level {
            LogLevel::Trace => tracing::trace!(target: LOG_TARGET, "{}", message),
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, "{}", message),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, "{}", message),
            LogLevel::Error => tracing::error!(target: LOG_TARGET, "{}", message),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}
