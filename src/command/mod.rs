//! Command construction.
//!
//! A [`CommandSpec`] is the fully resolved description of one external
//! command: argument vector (program first), environment overrides, optional
//! stdin text, and the output shape expected on success. It is built from
//! validated parameters by [`build`] and is never passed through a shell.

mod builder;

#[cfg(test)]
mod tests;

pub use builder::{INSPECT_SUMMARY_EXPR, OPTION_SEARCH_EXPR, build};

use crate::normalize::OutputShape;
use crate::operation::Operation;
use crate::process::ProcessRequest;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Flake reference used when a flake operation does not name one.
pub const CURRENT_FLAKE: &str = ".";

/// One external command, ready to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub operation: Operation,
    /// Program first, then its arguments.
    pub argv: Vec<String>,
    /// Environment overrides.
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    pub shape: OutputShape,
}

impl CommandSpec {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Shell-quoted command line, for display only.
    pub fn display(&self) -> String {
        shell_words::join(&self.argv)
    }

    /// Borrow this command as a request for a [`crate::process::Runner`].
    pub fn request<'a>(&'a self, working_dir: &'a Path, timeout: Duration) -> ProcessRequest<'a> {
        ProcessRequest {
            argv: &self.argv,
            env: &self.env,
            stdin: self.stdin.as_deref(),
            working_dir,
            timeout,
        }
    }
}
