//! CLI argument parsing for nixkil.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.
//!
//! Every operation subcommand serializes to the same parameter object an
//! agent would send, so the CLI and `invoke` share one validation path.

use clap::{ArgAction, Args, Parser, Subcommand};
use nixkil::operation::Operation;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// nixkil: query and operate Nix, NixOS and flakes from an agent.
///
/// Each operation runs one external command (never through a shell) and
/// prints a normalized JSON result:
/// - `{"kind": "success", "payload": ..., "warnings": [...]}`
/// - `{"kind": "failure", "error_kind": ..., "message": ...}`
#[derive(Parser, Debug)]
#[command(name = "nixkil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Config file (default: $NIXKIL_CONFIG, else built-in defaults).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the external command runs in.
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds (default depends on the operation).
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the command that would run instead of running it.
    #[arg(long, global = true)]
    pub print_command: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands for nixkil.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Operation(OperationCommand),

    /// Run any operation from a JSON parameter object.
    ///
    /// This is the agent-facing entry point: `nixkil invoke search_packages
    /// --params '{"query": "ripgrep"}'`.
    Invoke(InvokeArgs),

    /// List the operation catalog.
    Operations,

    /// Browse the documentation corpus.
    Docs(DocsCommand),
}

/// One subcommand per operation.
#[derive(Subcommand, Debug, Serialize)]
#[serde(untagged)]
pub enum OperationCommand {
    /// Search packages in a flake.
    SearchPackages(SearchPackagesArgs),
    /// Show name, version, description and license of a package.
    InspectPackage(InspectPackageArgs),
    /// Run a package's main program.
    RunPackage(RunPackageArgs),
    /// Run a command with packages on PATH.
    EnterShell(EnterShellArgs),
    /// Build an installable and print its output paths.
    BuildTarget(BuildTargetArgs),
    /// Create a flake in the working directory.
    InitFlake(InitFlakeArgs),
    /// Show a flake's outputs.
    ShowFlake(FlakeRefArgs),
    /// Evaluate (and optionally build) a flake's checks.
    ValidateFlake(ValidateFlakeArgs),
    /// Update flake lock file inputs.
    UpdateFlakeInputs(UpdateFlakeInputsArgs),
    /// Summarise a flake's lock file.
    DescribeLockFile(FlakeRefArgs),
    /// Search NixOS options by name.
    SearchSystemOptions(SearchSystemOptionsArgs),
    /// Describe one NixOS option.
    DescribeSystemOption(DescribeSystemOptionArgs),
    /// Build and activate a NixOS configuration.
    ApplySystemConfiguration(ApplySystemConfigurationArgs),
    /// List generations of a profile.
    ListSystemGenerations(ListSystemGenerationsArgs),
    /// Evaluate a Nix expression.
    EvaluateExpression(EvaluateExpressionArgs),
    /// Format Nix files with the flake's formatter.
    FormatFiles(FormatFilesArgs),
    /// Lint Nix files with statix.
    LintFiles(PathArgs),
    /// Evaluate an expression in `nix repl`.
    EvaluateInRepl(EvaluateInReplArgs),
    /// Parse a Nix file and report syntax errors.
    ParseSyntax(ParseSyntaxArgs),
}

impl OperationCommand {
    pub fn operation(&self) -> Operation {
        match self {
            Self::SearchPackages(_) => Operation::SearchPackages,
            Self::InspectPackage(_) => Operation::InspectPackage,
            Self::RunPackage(_) => Operation::RunPackage,
            Self::EnterShell(_) => Operation::EnterShell,
            Self::BuildTarget(_) => Operation::BuildTarget,
            Self::InitFlake(_) => Operation::InitFlake,
            Self::ShowFlake(_) => Operation::ShowFlake,
            Self::ValidateFlake(_) => Operation::ValidateFlake,
            Self::UpdateFlakeInputs(_) => Operation::UpdateFlakeInputs,
            Self::DescribeLockFile(_) => Operation::DescribeLockFile,
            Self::SearchSystemOptions(_) => Operation::SearchSystemOptions,
            Self::DescribeSystemOption(_) => Operation::DescribeSystemOption,
            Self::ApplySystemConfiguration(_) => Operation::ApplySystemConfiguration,
            Self::ListSystemGenerations(_) => Operation::ListSystemGenerations,
            Self::EvaluateExpression(_) => Operation::EvaluateExpression,
            Self::FormatFiles(_) => Operation::FormatFiles,
            Self::LintFiles(_) => Operation::LintFiles,
            Self::EvaluateInRepl(_) => Operation::EvaluateInRepl,
            Self::ParseSyntax(_) => Operation::ParseSyntax,
        }
    }

    /// The parameter object for this subcommand.
    pub fn params(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Arguments for `search-packages`.
#[derive(Parser, Debug, Serialize)]
pub struct SearchPackagesArgs {
    /// Package name or description to search for.
    pub query: String,

    /// Flake to search (default: from config).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,

    /// Maximum number of results.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

/// Arguments for `inspect-package`.
#[derive(Parser, Debug, Serialize)]
pub struct InspectPackageArgs {
    /// Package attribute name (e.g., hello).
    pub name: String,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
}

/// Arguments for `run-package`.
#[derive(Parser, Debug, Serialize)]
pub struct RunPackageArgs {
    pub package: String,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,

    /// Arguments for the program, after `--`.
    #[arg(last = true)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Arguments for `enter-shell`.
#[derive(Parser, Debug, Serialize)]
pub struct EnterShellArgs {
    /// Packages to make available (bare names resolve in the default flake).
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Command to run inside the shell, after `--` (default: `true`).
    #[arg(last = true)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

/// Arguments for `build-target`.
#[derive(Parser, Debug, Serialize)]
pub struct BuildTargetArgs {
    /// Installable to build (e.g., .#default).
    pub target: String,

    /// Path of the result symlink.
    #[arg(long, conflicts_with = "no_link")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_link: Option<String>,

    /// Do not create a result symlink.
    #[arg(long)]
    pub no_link: bool,
}

/// Arguments for `init-flake`.
#[derive(Parser, Debug, Serialize)]
pub struct InitFlakeArgs {
    /// Template to initialize from (e.g., templates#rust).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// A single optional flake reference.
#[derive(Parser, Debug, Serialize)]
pub struct FlakeRefArgs {
    /// Flake reference (default: `.`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,
}

/// Arguments for `validate-flake`.
#[derive(Parser, Debug, Serialize)]
pub struct ValidateFlakeArgs {
    /// Flake reference (default: `.`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,

    /// Evaluate checks without building them.
    #[arg(long)]
    pub no_build: bool,
}

/// Arguments for `update-flake-inputs`.
#[derive(Parser, Debug, Serialize)]
pub struct UpdateFlakeInputsArgs {
    /// Inputs to update (default: all).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,

    /// Flake reference (default: `.`).
    #[arg(long = "flake")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,
}

/// Arguments for `search-system-options`.
#[derive(Parser, Debug, Serialize)]
pub struct SearchSystemOptionsArgs {
    /// Substring of the option name.
    pub query: String,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

/// Arguments for `describe-system-option`.
#[derive(Parser, Debug, Serialize)]
pub struct DescribeSystemOptionArgs {
    /// Option path (e.g., services.nginx.enable).
    pub option: String,
}

/// Arguments for `apply-system-configuration`.
#[derive(Parser, Debug, Serialize)]
pub struct ApplySystemConfigurationArgs {
    /// Host to activate on; `localhost` means this machine.
    pub target_host: String,

    /// switch, boot, test, build, dry-build or dry-activate.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Flake containing the configuration.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,

    /// Configuration name within the flake.
    #[arg(long, requires = "flake")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Build only; do not activate.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `list-system-generations`.
#[derive(Parser, Debug, Serialize)]
pub struct ListSystemGenerationsArgs {
    /// `system` or a profile path.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Number of most recent generations to show.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Arguments for `evaluate-expression`.
#[derive(Parser, Debug, Serialize)]
pub struct EvaluateExpressionArgs {
    pub expression: String,

    /// Print a string result without quotes.
    #[arg(long)]
    pub raw: bool,

    /// Request JSON output (default: true).
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,

    /// Allow access to the environment and mutable paths.
    #[arg(long)]
    pub impure: bool,
}

/// Arguments for `format-files`.
#[derive(Parser, Debug, Serialize)]
pub struct FormatFilesArgs {
    /// File or directory (default: `.`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Report unformatted files without changing them.
    #[arg(long)]
    pub check: bool,
}

/// A single optional path.
#[derive(Parser, Debug, Serialize)]
pub struct PathArgs {
    /// File or directory (default: `.`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Arguments for `evaluate-in-repl`.
#[derive(Parser, Debug, Serialize)]
pub struct EvaluateInReplArgs {
    pub expression: String,

    /// Flake to load into scope.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
}

/// Arguments for `parse-syntax`.
#[derive(Parser, Debug, Serialize)]
pub struct ParseSyntaxArgs {
    /// Nix file to parse.
    pub path: String,
}

/// Arguments for the `invoke` command.
#[derive(Parser, Debug)]
pub struct InvokeArgs {
    /// Operation name (snake_case or kebab-case).
    pub operation: String,

    /// Parameters as a JSON object.
    #[arg(long, default_value = "{}")]
    pub params: String,
}

/// Docs subcommands.
#[derive(Parser, Debug)]
pub struct DocsCommand {
    #[command(subcommand)]
    pub action: DocsAction,
}

/// Available docs actions.
#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// List categories, or the topics of one category.
    List(DocsListArgs),

    /// Print one topic.
    Show(DocsShowArgs),

    /// Find topics whose `category/topic` path matches a glob.
    Find(DocsFindArgs),
}

/// Arguments for the `docs list` command.
#[derive(Parser, Debug)]
pub struct DocsListArgs {
    pub category: Option<String>,
}

/// Arguments for the `docs show` command.
#[derive(Parser, Debug)]
pub struct DocsShowArgs {
    pub category: String,
    pub topic: String,
}

/// Arguments for the `docs find` command.
#[derive(Parser, Debug)]
pub struct DocsFindArgs {
    /// Glob pattern (e.g., `flakes/*`).
    pub pattern: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    fn operation(args: &[&str]) -> OperationCommand {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Operation(op) => op,
            other => panic!("Expected operation command, got {:?}", other),
        }
    }

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn every_operation_has_a_kebab_case_subcommand() {
        let command = Cli::command();
        for op in Operation::ALL {
            let name = op.name().replace('_', "-");
            assert!(
                command.find_subcommand(&name).is_some(),
                "missing subcommand {}",
                name
            );
        }
    }

    #[test]
    fn parse_search_packages() {
        let op = operation(&["nixkil", "search-packages", "ripgrep", "--max-results", "5"]);
        assert_eq!(op.operation(), Operation::SearchPackages);
        assert_eq!(
            Value::Object(op.params()),
            json!({"query": "ripgrep", "max_results": 5})
        );
    }

    #[test]
    fn parse_run_package_with_trailing_args() {
        let op = operation(&["nixkil", "run-package", "cowsay", "--", "--help", "moo"]);
        assert_eq!(
            Value::Object(op.params()),
            json!({"package": "cowsay", "args": ["--help", "moo"]})
        );
    }

    #[test]
    fn parse_enter_shell_requires_packages() {
        assert!(Cli::try_parse_from(["nixkil", "enter-shell"]).is_err());

        let op = operation(&["nixkil", "enter-shell", "git", "jq", "--", "jq", "--version"]);
        assert_eq!(
            Value::Object(op.params()),
            json!({"packages": ["git", "jq"], "command": ["jq", "--version"]})
        );
    }

    #[test]
    fn parse_build_target_flags() {
        let op = operation(&["nixkil", "build-target", ".#default", "--no-link"]);
        assert_eq!(
            Value::Object(op.params()),
            json!({"target": ".#default", "no_link": true})
        );
        assert!(
            Cli::try_parse_from([
                "nixkil",
                "build-target",
                ".#default",
                "--no-link",
                "--out-link",
                "out"
            ])
            .is_err()
        );
    }

    #[test]
    fn parse_apply_system_configuration() {
        let op = operation(&[
            "nixkil",
            "apply-system-configuration",
            "localhost",
            "--action",
            "boot",
            "--flake",
            ".",
            "--hostname",
            "laptop",
        ]);
        assert_eq!(
            Value::Object(op.params()),
            json!({
                "target_host": "localhost",
                "action": "boot",
                "flake": ".",
                "hostname": "laptop",
                "dry_run": false
            })
        );
    }

    #[test]
    fn parse_evaluate_expression_json_flag() {
        let op = operation(&["nixkil", "evaluate-expression", "1 + 1", "--json", "false"]);
        assert_eq!(
            Value::Object(op.params()),
            json!({"expression": "1 + 1", "raw": false, "json": false, "impure": false})
        );
    }

    #[test]
    fn parse_update_flake_inputs() {
        let op = operation(&["nixkil", "update-flake-inputs", "nixpkgs", "--flake", "github:me/cfg"]);
        assert_eq!(
            Value::Object(op.params()),
            json!({"inputs": ["nixpkgs"], "flake_ref": "github:me/cfg"})
        );
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nixkil",
            "show-flake",
            "--cwd",
            "/tmp",
            "--timeout",
            "30",
            "--print-command",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(cli.global.timeout, Some(30));
        assert!(cli.global.print_command);
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn parse_invoke() {
        let cli = Cli::try_parse_from([
            "nixkil",
            "invoke",
            "inspect_package",
            "--params",
            r#"{"name": "hello"}"#,
        ])
        .unwrap();
        if let Command::Invoke(args) = cli.command {
            assert_eq!(args.operation, "inspect_package");
            assert_eq!(args.params, r#"{"name": "hello"}"#);
        } else {
            panic!("Expected Invoke command");
        }
    }

    #[test]
    fn parse_docs_show() {
        let cli = Cli::try_parse_from(["nixkil", "docs", "show", "flakes", "inputs"]).unwrap();
        if let Command::Docs(docs) = cli.command {
            if let DocsAction::Show(args) = docs.action {
                assert_eq!(args.category, "flakes");
                assert_eq!(args.topic, "inputs");
            } else {
                panic!("Expected Show action");
            }
        } else {
            panic!("Expected Docs command");
        }
    }

    #[test]
    fn parse_operations() {
        let cli = Cli::try_parse_from(["nixkil", "operations"]).unwrap();
        assert!(matches!(cli.command, Command::Operations));
    }
}
