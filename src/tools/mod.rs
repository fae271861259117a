//! Agent-facing tool layer.
//!
//! [`NixTools`] owns the configuration and a [`Runner`] and exposes one method
//! per operation. Every call follows the same path:
//!
//! 1. validate parameters and build the command (no process on failure)
//! 2. run it once with the per-class timeout
//! 3. normalize the outcome
//! 4. refine a successful payload for the operation (lock summaries, parsed
//!    generations, truncated searches)
//!
//! The return value is always a [`NormalizedResult`].

mod flakes;
mod language;
mod packages;
mod system;


use crate::command::{self, CommandSpec};
use crate::config::ToolConfig;
use crate::error::{NixkilError, Result};
use crate::normalize::normalize;
use crate::operation::Operation;
use crate::params::OperationParams;
use crate::process::{ProcessRunner, Runner};
use crate::result::{NormalizedResult, Payload};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

/// A loosely-typed request, as sent by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationRequest {
    pub operation: Operation,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Directory the command runs in (default: current directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Timeout override (default: per operation class).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl InvocationRequest {
    pub fn new(operation: Operation, params: Map<String, Value>) -> Self {
        Self {
            operation,
            params,
            working_dir: None,
            timeout_seconds: None,
        }
    }

    /// Per-call options carried by this request.
    pub fn options(&self) -> Result<CallOptions> {
        let timeout = match self.timeout_seconds {
            Some(0) => {
                return Err(NixkilError::invalid(
                    "timeout_seconds must be greater than 0",
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };
        Ok(CallOptions {
            working_dir: self.working_dir.clone(),
            timeout,
        })
    }
}

/// Per-call options for the typed methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn in_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(working_dir.into()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Entry point for all operations.
pub struct NixTools {
    config: ToolConfig,
    runner: Box<dyn Runner>,
}

impl NixTools {
    /// Tools backed by real child processes.
    pub fn new(config: ToolConfig) -> Self {
        let runner = ProcessRunner::new(config.kill_grace());
        Self::with_runner(config, runner)
    }

    /// Tools backed by a custom runner.
    pub fn with_runner(config: ToolConfig, runner: impl Runner + 'static) -> Self {
        Self {
            config,
            runner: Box::new(runner),
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Run a loosely-typed request.
    pub fn invoke(&self, request: &InvocationRequest) -> NormalizedResult {
        let prepared = request.options().and_then(|options| {
            OperationParams::from_map(request.operation, request.params.clone())
                .map(|params| (params, options))
        });
        match prepared {
            Ok((params, options)) => self.call(&params, &options),
            Err(e) => {
                tracing::debug!(operation = %request.operation, error = %e, "rejected request");
                e.into()
            }
        }
    }

    /// Build the command for a request without running it.
    pub fn preview(&self, request: &InvocationRequest) -> Result<CommandSpec> {
        let params = OperationParams::from_map(request.operation, request.params.clone())?;
        command::build(&self.config, &params)
    }

    /// Run one operation with typed parameters.
    pub fn call(&self, params: &OperationParams, options: &CallOptions) -> NormalizedResult {
        let (spec, working_dir, timeout) = match self.prepare(params, options) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::debug!(operation = %params.operation(), error = %e, "rejected request");
                return e.into();
            }
        };

        let outcome = self.runner.run(&spec.request(&working_dir, timeout));
        let result = normalize(&outcome, spec.shape);
        refine(params, result)
    }

    fn prepare(
        &self,
        params: &OperationParams,
        options: &CallOptions,
    ) -> Result<(CommandSpec, PathBuf, Duration)> {
        let spec = command::build(&self.config, params)?;

        let working_dir = match &options.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                NixkilError::invalid(format!("cannot determine current directory: {}", e))
            })?,
        };
        if !working_dir.is_dir() {
            return Err(NixkilError::invalid(format!(
                "working directory '{}' does not exist or is not a directory",
                working_dir.display()
            )));
        }

        let timeout = match options.timeout {
            Some(timeout) if timeout.is_zero() => {
                return Err(NixkilError::invalid("timeout must be greater than 0"));
            }
            Some(timeout) => timeout,
            None => Duration::from_secs(
                self.config
                    .timeouts
                    .for_class(params.operation().class()),
            ),
        };

        Ok((spec, working_dir, timeout))
    }
}

/// Operation-specific post-processing of a successful payload.
fn refine(params: &OperationParams, result: NormalizedResult) -> NormalizedResult {
    let (payload, mut warnings) = match result {
        NormalizedResult::Success { payload, warnings } => (payload, warnings),
        failure => return failure,
    };

    let payload = match params {
        OperationParams::SearchPackages(p) => packages::truncate_search(payload, p, &mut warnings),
        OperationParams::DescribeLockFile(p) => flakes::summarize_lock(payload, p),
        OperationParams::SearchSystemOptions(p) => {
            system::note_option_truncation(payload, p, &mut warnings)
        }
        OperationParams::ListSystemGenerations(p) => {
            system::parse_generations(payload, p, &mut warnings)
        }
        OperationParams::EvaluateInRepl(_) => language::strip_repl_noise(payload),
        _ => payload,
    };

    NormalizedResult::Success { payload, warnings }
}

/// Apply `f` to a structured payload; text payloads pass through.
fn map_structured(payload: Payload, f: impl FnOnce(Value) -> Value) -> Payload {
    match payload {
        Payload::Structured(value) => Payload::Structured(f(value)),
        text => text,
    }
}
