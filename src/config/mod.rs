//! Configuration model for nixkil.
//!
//! This module defines the `ToolConfig` context object that is passed into
//! every tool call: external program names, default timeouts per operation
//! class, and the environment applied to spawned commands. It supports
//! forward-compatible YAML parsing and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::ToolConfig;
pub use operations::CONFIG_ENV_VAR;
pub use types::{Programs, Timeouts};
