//! Registry of runnable commands

use crate::pinned::UnitGuard;
use msa_core::Error;
use msa_plugin_api::command::normalize_name;
use msa_plugin_api::{Command, CommandSummary};
use parking_lot::RwLock;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

struct Entry {
    name: String,
    owner: String,
    command: Weak<Command>,
    unit: Option<UnitGuard>,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("live", &(self.command.strong_count() > 0))
            .field("pinned", &self.unit.is_some())
            .finish()
    }
}

/// A command found in the registry
///
/// Keeps the plugin unit the command came from loaded until dropped, so hold
/// it for the whole invocation.
#[derive(Clone)]
pub struct CommandRef {
    // dropped before the unit
    command: Arc<Command>,
    _unit: Option<UnitGuard>,
}

impl CommandRef {
    /// The shared command
    pub fn as_arc(&self) -> &Arc<Command> {
        &self.command
    }
}

impl Deref for CommandRef {
    type Target = Command;

    fn deref(&self) -> &Command {
        &self.command
    }
}

impl fmt::Debug for CommandRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandRef").field(&self.command.name()).finish()
    }
}

/// Commands by name, in registration order
///
/// The registry holds weak references: whoever registered a command keeps it
/// alive. Entries whose command has been dropped are skipped and pruned.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `command` on behalf of `owner`
    ///
    /// The first registration of a name wins; a later one is refused with
    /// [`Error::DuplicateCommand`].
    pub fn register(&self, owner: &str, command: &Arc<Command>) -> Result<(), Error> {
        self.register_pinned(owner, command, None)
    }

    /// Add a command whose code lives in a plugin unit
    ///
    /// The registry keeps `unit` open while the entry exists and hands a
    /// clone to every caller of [`lookup`](Self::lookup).
    pub fn register_pinned(
        &self,
        owner: &str,
        command: &Arc<Command>,
        unit: Option<UnitGuard>,
    ) -> Result<(), Error> {
        let mut entries = self.entries.write();
        entries.retain(|e| e.command.strong_count() > 0);

        let name = command.name().to_string();
        if entries.iter().any(|e| e.name == name) {
            return Err(Error::DuplicateCommand(name));
        }

        entries.push(Entry {
            name,
            owner: owner.to_string(),
            command: Arc::downgrade(command),
            unit,
        });
        Ok(())
    }

    /// Find a command by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<CommandRef> {
        let name = normalize_name(name);
        let entries = self.entries.read();
        let entry = entries.iter().find(|e| e.name == name)?;
        Some(CommandRef {
            command: entry.command.upgrade()?,
            _unit: entry.unit.clone(),
        })
    }

    /// Owner of a command
    pub fn owner_of(&self, name: &str) -> Option<String> {
        let name = normalize_name(name);
        self.entries
            .read()
            .iter()
            .find(|e| e.name == name && e.command.strong_count() > 0)
            .map(|e| e.owner.clone())
    }

    /// Live commands in registration order
    pub fn list(&self) -> Vec<Arc<Command>> {
        self.entries
            .read()
            .iter()
            .filter_map(|e| e.command.upgrade())
            .collect()
    }

    /// Metadata of live commands in registration order
    pub fn summaries(&self) -> Vec<CommandSummary> {
        self.list().iter().map(|c| c.summary()).collect()
    }

    /// Remove one command
    pub fn remove(&self, name: &str) -> bool {
        let name = normalize_name(name);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.name != name);
        entries.len() != before
    }

    /// Remove every command `owner` registered, returning how many
    pub fn remove_owner(&self, owner: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.owner != owner);
        before - entries.len()
    }

    /// Drop entries whose command no longer exists
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.command.strong_count() > 0);
        before - entries.len()
    }

    /// Number of live commands
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|e| e.command.strong_count() > 0)
            .count()
    }

    /// Whether no live command is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
