//! The host's view as seen by plugins
//!
//! Plugins never touch module internals. Everything they can do to the
//! running system goes through [`HostApi`].

use crate::command::CommandSummary;
use crate::error::Result;
use crate::event::{DispatchOutcome, Event};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Shared handle to the host services
pub type HostHandle = Arc<dyn HostApi>;

/// Services the host exposes to plugins, commands and event handlers
///
/// Every method is callable from any thread. Calls into a module that is not
/// running fail with [`PluginError::Unavailable`](crate::PluginError::Unavailable)
/// or, for logging, are silently dropped.
pub trait HostApi: Send + Sync + fmt::Debug {
    /// Write a message to the host log
    fn log(&self, level: LogLevel, message: &str);

    /// Write raw text to the output sink
    fn write_text(&self, text: &str) -> Result<()>;

    /// Have the agent say something; placeholders are expanded first
    fn say(&self, text: &str) -> Result<()>;

    /// Substitute `$NAME` placeholders
    fn expand(&self, template: &str) -> String;

    /// Define or overwrite a `$NAME` substitution
    fn set_substitution(&self, name: &str, value: &str) -> Result<()>;

    /// Remove a `$NAME` substitution
    fn remove_substitution(&self, name: &str) -> Result<()>;

    /// Current agent state, if the agent is running
    fn agent(&self) -> Option<AgentSnapshot>;

    /// Deliver an event to its subscribers and wait for them
    fn dispatch(&self, event: Event) -> Result<DispatchOutcome>;

    /// Registered commands, in registration order
    fn commands(&self) -> Vec<CommandSummary>;

    /// Ask the host to shut down normally
    fn request_shutdown(&self);

    /// Log at trace level
    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    /// Log at debug level
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log at info level
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log at error level
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Fine-grained tracing
    Trace,
    /// Diagnostic detail
    Debug,
    /// Normal operation
    Info,
    /// Failures
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Agent mood
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Default mood
    #[default]
    Normal,
    /// Cheerful
    Happy,
    /// Gloomy
    Sad,
    /// Cross
    Angry,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Normal => write!(f, "normal"),
            Mood::Happy => write!(f, "happy"),
            Mood::Sad => write!(f, "sad"),
            Mood::Angry => write!(f, "angry"),
        }
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Mood::Normal),
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "angry" => Ok(Mood::Angry),
            other => Err(format!("unknown mood '{other}'")),
        }
    }
}

/// What the agent is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    /// Waiting for input
    #[default]
    Idle,
    /// Handling something
    Busy,
}

/// Point-in-time copy of the agent's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent name
    pub name: String,
    /// How the agent addresses the user
    pub user_title: String,
    /// Current activity
    pub state: AgentState,
    /// Current mood
    pub mood: Mood,
    /// Attitude toward the user; zero is neutral
    pub attitude: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert!(LogLevel::Trace < LogLevel::Error);
    }

    #[test]
    fn test_mood_parse_and_display() {
        assert_eq!(" Happy ".parse::<Mood>().unwrap(), Mood::Happy);
        assert_eq!(Mood::Angry.to_string(), "angry");
        assert!("sleepy".parse::<Mood>().is_err());
    }
}
