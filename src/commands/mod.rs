//! Command implementations for nixkil.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Operation subcommands and `invoke` share one path: both
//! become an [`InvocationRequest`] and go through [`NixTools`].

mod docs;

use crate::cli::{Cli, Command, GlobalArgs, InvokeArgs};
use nixkil::config::ToolConfig;
use nixkil::error::{NixkilError, Result};
use nixkil::exit_codes;
use nixkil::operation::Operation;
use nixkil::result::NormalizedResult;
use nixkil::tools::{InvocationRequest, NixTools};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Dispatch a command to its implementation.
///
/// Returns the process exit code. Tool outcomes (including failures) are
/// printed as JSON and reflected in the exit code; `Err` is reserved for
/// problems before any tool runs (bad config, bad CLI input).
pub fn dispatch(cli: Cli) -> Result<i32> {
    let Cli { global, command } = cli;
    match command {
        Command::Operation(op) => run_operation(&global, op.operation(), op.params()),
        Command::Invoke(args) => cmd_invoke(&global, args),
        Command::Operations => cmd_operations(),
        Command::Docs(docs) => docs::dispatch(&global, docs),
    }
}

fn run_operation(global: &GlobalArgs, operation: Operation, params: Map<String, Value>) -> Result<i32> {
    let config = ToolConfig::resolve(global.config.as_deref())?;
    let tools = NixTools::new(config);
    let request = InvocationRequest {
        operation,
        params,
        working_dir: global.cwd.clone(),
        timeout_seconds: global.timeout,
    };

    if global.print_command {
        let spec = tools.preview(&request)?;
        println!("{}", spec.display());
        return Ok(exit_codes::SUCCESS);
    }

    let result = tools.invoke(&request);
    print_json(&result)?;
    Ok(result.exit_code())
}

fn cmd_invoke(global: &GlobalArgs, args: InvokeArgs) -> Result<i32> {
    match parse_invoke(&args) {
        Ok((operation, params)) => run_operation(global, operation, params),
        Err(err) => {
            // Agents read stdout; malformed requests still get a result object.
            let result = NormalizedResult::from(err);
            print_json(&result)?;
            Ok(result.exit_code())
        }
    }
}

fn parse_invoke(args: &InvokeArgs) -> Result<(Operation, Map<String, Value>)> {
    let operation: Operation = args.operation.parse()?;
    match serde_json::from_str::<Value>(&args.params) {
        Ok(Value::Object(params)) => Ok((operation, params)),
        Ok(other) => Err(NixkilError::invalid(format!(
            "--params must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(NixkilError::invalid(format!(
            "--params is not valid JSON: {}",
            e
        ))),
    }
}

fn cmd_operations() -> Result<i32> {
    let catalog: Vec<Value> = Operation::ALL
        .iter()
        .map(|op| {
            json!({
                "name": op.name(),
                "class": op.class(),
                "read_only": op.is_read_only(),
                "description": op.description(),
            })
        })
        .collect();
    print_json(&catalog)?;
    Ok(exit_codes::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| NixkilError::UserError(format!("failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}
