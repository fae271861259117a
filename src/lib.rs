//! nixkil: an agent-facing command layer for Nix.
//!
//! Agents call one function per [`Operation`] with named parameters and always
//! get back a [`NormalizedResult`]. Underneath, each call:
//!
//! - validates parameters and builds one external command ([`command`])
//! - runs it with a bounded timeout, no shell involved ([`process`])
//! - classifies the outcome and parses structured output ([`normalize`])
//!
//! ```no_run
//! use nixkil::config::ToolConfig;
//! use nixkil::params::InspectPackageParams;
//! use nixkil::tools::{CallOptions, NixTools};
//!
//! let tools = NixTools::new(ToolConfig::default());
//! let result = tools.inspect_package(
//!     InspectPackageParams { name: "hello".into(), flake: None },
//!     &CallOptions::default(),
//! );
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod knowledge;
pub mod normalize;
pub mod operation;
pub mod params;
pub mod process;
pub mod result;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{NixkilError, Result};
pub use operation::Operation;
pub use result::{ErrorKind, NormalizedResult, Payload};
pub use tools::{CallOptions, InvocationRequest, NixTools};
