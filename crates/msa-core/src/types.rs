//! Module identities, lifecycle states and process status codes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one of the seven built-in modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleId {
    /// Logging service
    Log,
    /// Text output sink
    Output,
    /// Event dispatcher
    Event,
    /// User input
    Input,
    /// Agent state and speech
    Agent,
    /// Command registry
    Command,
    /// Plugin loader
    Plugin,
}

impl ModuleId {
    /// Every module, in declaration order
    pub const ALL: [ModuleId; 7] = [
        ModuleId::Log,
        ModuleId::Output,
        ModuleId::Event,
        ModuleId::Input,
        ModuleId::Agent,
        ModuleId::Command,
        ModuleId::Plugin,
    ];

    /// Order in which modules are initialized. Later modules depend on earlier ones.
    pub const INIT_ORDER: [ModuleId; 7] = Self::ALL;

    /// Modules that receive `setup` once everything is initialized.
    ///
    /// Plugins must be registered before their event handlers are wired.
    pub const SETUP_ORDER: [ModuleId; 2] = [ModuleId::Plugin, ModuleId::Event];

    /// Modules that receive `teardown` on a normal shutdown.
    pub const TEARDOWN_ORDER: [ModuleId; 2] = [ModuleId::Plugin, ModuleId::Event];

    /// Order in which modules are quit.
    ///
    /// Plugin goes first so it releases callbacks into other modules before they
    /// are destroyed; Log goes last so every other failure can still be recorded.
    pub const QUIT_ORDER: [ModuleId; 7] = [
        ModuleId::Plugin,
        ModuleId::Input,
        ModuleId::Agent,
        ModuleId::Command,
        ModuleId::Event,
        ModuleId::Output,
        ModuleId::Log,
    ];

    /// Order in which `dispose` checks for modules that are still live
    pub const DISPOSE_CHECK_ORDER: [ModuleId; 7] = [
        ModuleId::Event,
        ModuleId::Input,
        ModuleId::Agent,
        ModuleId::Command,
        ModuleId::Output,
        ModuleId::Log,
        ModuleId::Plugin,
    ];

    /// Slot index of this module inside a host
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name, e.g. `"Agent"`
    pub fn name(self) -> &'static str {
        match self {
            ModuleId::Log => "Log",
            ModuleId::Output => "Output",
            ModuleId::Event => "Event",
            ModuleId::Input => "Input",
            ModuleId::Agent => "Agent",
            ModuleId::Command => "Command",
            ModuleId::Plugin => "Plugin",
        }
    }

    /// Name of the configuration section read at init, e.g. `"AGENT"`
    pub fn section_name(self) -> &'static str {
        match self {
            ModuleId::Log => "LOG",
            ModuleId::Output => "OUTPUT",
            ModuleId::Event => "EVENT",
            ModuleId::Input => "INPUT",
            ModuleId::Agent => "AGENT",
            ModuleId::Command => "COMMAND",
            ModuleId::Plugin => "PLUGIN",
        }
    }

    /// Status code reported when this module blocks startup or shutdown
    pub fn status(self) -> Status {
        match self {
            ModuleId::Log => Status::Log,
            ModuleId::Output => Status::Output,
            ModuleId::Event => Status::Event,
            ModuleId::Input => Status::Input,
            ModuleId::Agent => Status::Agent,
            ModuleId::Command => Status::Command,
            ModuleId::Plugin => Status::Plugin,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of a module slot
///
/// Transitions only move forward: `Uninitialized -> Initialized -> SetUp ->
/// TornDown -> Quit`, where `SetUp` and `TornDown` may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Never started
    Uninitialized,
    /// `init` succeeded
    Initialized,
    /// `setup` succeeded
    SetUp,
    /// `teardown` ran
    TornDown,
    /// `quit` succeeded; the slot is empty again
    Quit,
}

impl ModuleState {
    /// Whether the slot holds live module state
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ModuleState::Initialized | ModuleState::SetUp | ModuleState::TornDown
        )
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleState::Uninitialized => write!(f, "uninitialized"),
            ModuleState::Initialized => write!(f, "initialized"),
            ModuleState::SetUp => write!(f, "set up"),
            ModuleState::TornDown => write!(f, "torn down"),
            ModuleState::Quit => write!(f, "quit"),
        }
    }
}

/// Closed set of process status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Everything went fine
    Success,
    /// Configuration could not be loaded
    Config,
    /// Log module failure
    Log,
    /// Output module failure
    Output,
    /// Event module failure
    Event,
    /// Input module failure
    Input,
    /// Agent module failure
    Agent,
    /// Command module failure
    Command,
    /// Plugin module failure
    Plugin,
}

impl Status {
    /// Numeric code, suitable as a process exit code
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Config => 1,
            Status::Log => 2,
            Status::Output => 3,
            Status::Event => 4,
            Status::Input => 5,
            Status::Agent => 6,
            Status::Command => 7,
            Status::Plugin => 8,
        }
    }

    /// Whether this is the success status
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "success",
            Status::Config => "config",
            Status::Log => "log",
            Status::Output => "output",
            Status::Event => "event",
            Status::Input => "input",
            Status::Agent => "agent",
            Status::Command => "command",
            Status::Plugin => "plugin",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_order_keeps_log_last() {
        assert_eq!(ModuleId::QUIT_ORDER[0], ModuleId::Plugin);
        assert_eq!(ModuleId::QUIT_ORDER[6], ModuleId::Log);
    }

    #[test]
    fn test_orders_cover_every_module() {
        for order in [
            ModuleId::INIT_ORDER,
            ModuleId::QUIT_ORDER,
            ModuleId::DISPOSE_CHECK_ORDER,
        ] {
            let mut sorted = order.to_vec();
            sorted.sort();
            assert_eq!(sorted, ModuleId::ALL.to_vec());
        }
    }

    #[test]
    fn test_live_states() {
        assert!(!ModuleState::Uninitialized.is_live());
        assert!(ModuleState::Initialized.is_live());
        assert!(ModuleState::TornDown.is_live());
        assert!(!ModuleState::Quit.is_live());
    }

    #[test]
    fn test_status_codes_are_distinct() {
        let codes: std::collections::HashSet<i32> = ModuleId::ALL
            .iter()
            .map(|m| m.status().code())
            .chain([Status::Success.code(), Status::Config.code()])
            .collect();
        assert_eq!(codes.len(), 9);
        assert_eq!(Status::Success.code(), 0);
    }

    #[test]
    fn test_section_names_are_upper_case() {
        for id in ModuleId::ALL {
            assert_eq!(id.section_name(), id.name().to_uppercase());
        }
    }
}
