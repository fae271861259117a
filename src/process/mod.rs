//! External process execution.
//!
//! This module provides:
//!
//! - [`ExecutionOutcome`]: the raw, immutable record of one run
//! - [`ProcessRequest`]: everything needed to spawn one command
//! - [`Runner`]: the seam between the tool layer and the OS, with
//!   [`ProcessRunner`] as the real implementation

mod executor;

pub use executor::execute;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Exit code reported when the program could not be launched at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -2;

/// Exit code reported when the process ended without an exit code.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Raw result of executing one command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// The command line, shell-quoted for display only.
    pub command: String,
    /// Exit code; negative values are reserved (see the constants above).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall time from spawn attempt to reaping.
    pub elapsed: Duration,
    /// Whether the process was killed due to timeout.
    pub timed_out: bool,
    pub started_at: DateTime<Utc>,
}

impl ExecutionOutcome {
    /// The process ran to completion and exited 0.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// The process never started.
    pub fn launch_failed(&self) -> bool {
        self.exit_code == LAUNCH_FAILURE_EXIT_CODE
    }
}

/// Everything needed to spawn one command.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRequest<'a> {
    /// Program first, then its arguments.
    pub argv: &'a [String],
    /// Environment overrides on top of the inherited environment.
    pub env: &'a BTreeMap<String, String>,
    /// Text written to stdin; `None` means stdin is closed.
    pub stdin: Option<&'a str>,
    pub working_dir: &'a Path,
    pub timeout: Duration,
}

/// Something that can run a command and report its outcome.
pub trait Runner: Send + Sync {
    fn run(&self, request: &ProcessRequest<'_>) -> ExecutionOutcome;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    /// Grace period between SIGTERM and SIGKILL on timeout.
    pub kill_grace: Duration,
}

impl ProcessRunner {
    pub fn new(kill_grace: Duration) -> Self {
        Self { kill_grace }
    }
}

impl Runner for ProcessRunner {
    fn run(&self, request: &ProcessRequest<'_>) -> ExecutionOutcome {
        execute(request, self.kill_grace)
    }
}
