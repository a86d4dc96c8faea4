//! Commands contributed by modules and plugins

use crate::error::Result;
use crate::event::HandlerSync;
use crate::host::HostApi;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Command handler function
pub type CommandHandler =
    Arc<dyn Fn(&dyn HostApi, &ParamList, &HandlerSync) -> Result<()> + Send + Sync>;

/// A named command the user can run
///
/// Names are stored upper-cased. Whoever creates the command owns it; the
/// host's registry only keeps a weak reference.
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    usage: String,
    handler: CommandHandler,
}

impl Command {
    /// Create a command
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        usage: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(&dyn HostApi, &ParamList, &HandlerSync) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: normalize_name(&name.into()),
            description: description.into(),
            usage: usage.into(),
            handler: Arc::new(handler),
        }
    }

    /// Command name (upper case)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Usage string
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Run the command
    pub fn invoke(&self, host: &dyn HostApi, params: &ParamList, sync: &HandlerSync) -> Result<()> {
        (self.handler)(host, params, sync)
    }

    /// Metadata without the handler
    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            usage: self.usage.clone(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Normalize a command name for registration and lookup
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Command metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSummary {
    /// Command name
    pub name: String,
    /// Short description
    pub description: String,
    /// Usage string
    pub usage: String,
}

/// Arguments passed to a command, not including the command name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    args: Vec<String>,
}

impl ParamList {
    /// Create a parameter list
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    /// Argument at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Iterate over the arguments
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(String::as_str)
    }

    /// All arguments joined by single spaces
    pub fn joined(&self) -> String {
        self.args.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for ParamList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_normalized() {
        let cmd = Command::new(" love ", "Show love", "LOVE", |_, _, _| Ok(()));
        assert_eq!(cmd.name(), "LOVE");
        assert_eq!(cmd.summary().name, "LOVE");
    }

    #[test]
    fn test_param_list() {
        let params: ParamList = ["hello", "there"].into_iter().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get(1), Some("there"));
        assert_eq!(params.get(2), None);
        assert_eq!(params.joined(), "hello there");
        assert!(ParamList::default().is_empty());
    }
}
