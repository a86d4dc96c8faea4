//! Testing utilities for plugin developers
//!
//! Fakes for both sides of the plugin boundary: a plugin that counts its hook
//! calls and a host that records what plugins do to it.

pub mod mocks;

pub use mocks::{MockPlugin, RecordingHost};
