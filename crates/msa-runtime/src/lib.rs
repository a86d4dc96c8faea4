//! # MSA Runtime
//!
//! The Moe Serifu Agent host:
//! - Ordered module lifecycle with rollback on failed startup
//! - Built-in Log, Output, Event, Input, Agent, Command and Plugin modules
//! - Event dispatch with per-event ordering and suspendable handlers
//! - Command registry fed by built-ins and plugins
//! - Shutdown signalling for the command line front end
//!
//! ## Example
//!
//! ```rust,no_run
//! use msa_runtime::prelude::*;
//!
//! # fn example() -> msa_core::Result<()> {
//! let config = msa_config::load("msa.yaml")?;
//! let mut host = HostBuilder::new().config(config).start()?;
//!
//! host.submit_input("say hello").ok();
//!
//! host.stop(StopReason::Normal)?;
//! host.dispose().map_err(|refused| refused.error)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod agent;
pub mod commands;
pub mod dispatcher;
pub mod expander;
pub mod host;
pub mod input;
pub mod log;
pub mod module;
pub mod modules;
pub mod output;
pub mod pinned;
pub mod services;
pub mod shutdown;

pub use agent::Agent;
pub use commands::{CommandRef, CommandRegistry};
pub use dispatcher::{EventDispatcher, WaitPolicy};
pub use expander::Expander;
pub use host::{DisposeError, Host, HostBuilder, StopReason};
pub use input::InputPort;
pub use log::Logger;
pub use module::{Module, ModuleSet};
pub use output::{BufferSink, OutputSink, OutputTarget, StderrSink, StdoutSink};
pub use pinned::UnitGuard;
pub use services::Services;
pub use shutdown::{ShutdownSignal, SignalHandler};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::host::{Host, HostBuilder, StopReason};
    pub use crate::module::{Module, ModuleSet};
    pub use crate::output::{BufferSink, OutputSink};
    pub use crate::services::Services;
    pub use crate::shutdown::{ShutdownSignal, SignalHandler};
    pub use msa_core::{ModuleId, ModuleState, Status};
}
