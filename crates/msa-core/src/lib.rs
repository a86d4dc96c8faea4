//! # MSA Core
//!
//! Core types and error handling for the Moe Serifu Agent host.
//!
//! This crate provides the foundational abstractions used throughout the host:
//! - Module identities and the fixed lifecycle orders
//! - Module lifecycle states
//! - Process status codes
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod types;

pub use error::{Error, ModuleError, Result};
pub use types::{ModuleId, ModuleState, Status};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, ModuleError, Result};
    pub use crate::types::{ModuleId, ModuleState, Status};
}
