//! Typed parameter sets, one per operation.
//!
//! Agents send loosely-typed JSON objects; these are decoded into an explicit
//! structure per operation (unknown keys and missing required keys are
//! rejected by serde) and then validated eagerly, before any command is
//! built. A failure here is always `InvalidParameters`.

pub mod validate;


use crate::error::{NixkilError, Result};
use crate::operation::Operation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Default cap on search results returned to the caller.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Default number of generations returned.
pub const DEFAULT_GENERATION_LIMIT: usize = 10;

/// Parameters for `search_packages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchPackagesParams {
    /// Search term (package name or description regex).
    pub query: String,
    /// Flake to search (default: the configured default flake).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
    /// Maximum number of results returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

/// Parameters for `inspect_package`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectPackageParams {
    /// Package attribute name (e.g. `hello`, `python311`).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
}

/// Parameters for `run_package`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPackageParams {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
    /// Arguments passed to the program after `--`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Parameters for `enter_shell`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnterShellParams {
    /// Packages to put on PATH; bare names resolve against nixpkgs.
    pub packages: Vec<String>,
    /// Command (program and arguments) to run inside the shell.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

/// Parameters for `build_target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildTargetParams {
    /// Installable: flake output or path.
    pub target: String,
    /// Path for the result symlink (default: `./result`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_link: Option<String>,
    /// Do not create a result symlink.
    #[serde(default)]
    pub no_link: bool,
}

/// Parameters for `init_flake`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitFlakeParams {
    /// Template reference such as `templates#python`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Parameters for `show_flake`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShowFlakeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,
}

/// Parameters for `validate_flake`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateFlakeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,
    /// Evaluate checks without building them.
    #[serde(default)]
    pub no_build: bool,
}

/// Parameters for `update_flake_inputs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateFlakeInputsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,
    /// Inputs to update (default: all).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
}

/// Parameters for `describe_lock_file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescribeLockFileParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake_ref: Option<String>,
}

/// Parameters for `search_system_options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSystemOptionsParams {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

/// Parameters for `describe_system_option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescribeSystemOptionParams {
    /// Full option path (e.g. `services.nginx.enable`).
    pub option: String,
}

/// `nixos-rebuild` action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildAction {
    #[default]
    Switch,
    Boot,
    Test,
    Build,
    DryBuild,
    DryActivate,
}

impl RebuildAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebuildAction::Switch => "switch",
            RebuildAction::Boot => "boot",
            RebuildAction::Test => "test",
            RebuildAction::Build => "build",
            RebuildAction::DryBuild => "dry-build",
            RebuildAction::DryActivate => "dry-activate",
        }
    }

    /// Whether the action changes the running or booted system.
    pub fn activates(&self) -> bool {
        matches!(
            self,
            RebuildAction::Switch | RebuildAction::Boot | RebuildAction::Test
        )
    }
}

impl fmt::Display for RebuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for `apply_system_configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplySystemConfigurationParams {
    /// Host to activate on; `localhost` applies to the local machine.
    pub target_host: String,
    #[serde(default)]
    pub action: RebuildAction,
    /// Flake containing the configuration (e.g. `.` or `github:me/dotfiles`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
    /// `nixosConfigurations` attribute to build from `flake`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Build only (`dry-build`), whatever `action` says.
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplySystemConfigurationParams {
    /// Host name meaning "this machine".
    pub const LOCAL_HOST: &'static str = "localhost";

    pub fn is_local(&self) -> bool {
        self.target_host == Self::LOCAL_HOST
    }

    /// The action actually passed to `nixos-rebuild`.
    pub fn effective_action(&self) -> RebuildAction {
        if self.dry_run {
            RebuildAction::DryBuild
        } else {
            self.action
        }
    }
}

/// Parameters for `list_system_generations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSystemGenerationsParams {
    /// `system` or a profile path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListSystemGenerationsParams {
    pub const SYSTEM_PROFILE: &'static str = "/nix/var/nix/profiles/system";

    /// Profile name as reported back to the caller.
    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or("system")
    }

    /// Profile path handed to `nix-env`.
    pub fn profile_path(&self) -> &str {
        match self.profile.as_deref() {
            None | Some("system") => Self::SYSTEM_PROFILE,
            Some(path) => path,
        }
    }
}

/// Parameters for `evaluate_expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluateExpressionParams {
    pub expression: String,
    /// Print a string result without quotes (implies text output).
    #[serde(default)]
    pub raw: bool,
    /// Request JSON output (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    /// Allow access to the environment, NIX_PATH and mutable paths.
    #[serde(default)]
    pub impure: bool,
}

impl EvaluateExpressionParams {
    /// Whether structured output is requested.
    pub fn wants_json(&self) -> bool {
        !self.raw && self.json.unwrap_or(true)
    }
}

/// Parameters for `format_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatFilesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Only check formatting; do not modify files.
    #[serde(default)]
    pub check: bool,
}

/// Parameters for `lint_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintFilesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Parameters for `evaluate_in_repl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluateInReplParams {
    pub expression: String,
    /// Flake to load into the REPL scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
}

/// Parameters for `parse_syntax`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseSyntaxParams {
    /// Nix file to parse.
    pub path: String,
}

/// A validated-on-demand parameter set for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationParams {
    SearchPackages(SearchPackagesParams),
    InspectPackage(InspectPackageParams),
    RunPackage(RunPackageParams),
    EnterShell(EnterShellParams),
    BuildTarget(BuildTargetParams),
    InitFlake(InitFlakeParams),
    ShowFlake(ShowFlakeParams),
    ValidateFlake(ValidateFlakeParams),
    UpdateFlakeInputs(UpdateFlakeInputsParams),
    DescribeLockFile(DescribeLockFileParams),
    SearchSystemOptions(SearchSystemOptionsParams),
    DescribeSystemOption(DescribeSystemOptionParams),
    ApplySystemConfiguration(ApplySystemConfigurationParams),
    ListSystemGenerations(ListSystemGenerationsParams),
    EvaluateExpression(EvaluateExpressionParams),
    FormatFiles(FormatFilesParams),
    LintFiles(LintFilesParams),
    EvaluateInRepl(EvaluateInReplParams),
    ParseSyntax(ParseSyntaxParams),
}

fn decode<T: DeserializeOwned>(operation: Operation, params: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(params))
        .map_err(|e| NixkilError::invalid(format!("{}: {}", operation, e)))
}

impl OperationParams {
    /// Decode a loosely-typed parameter object for `operation` and validate it.
    pub fn from_map(operation: Operation, params: Map<String, Value>) -> Result<Self> {
        let decoded = match operation {
            Operation::SearchPackages => Self::SearchPackages(decode(operation, params)?),
            Operation::InspectPackage => Self::InspectPackage(decode(operation, params)?),
            Operation::RunPackage => Self::RunPackage(decode(operation, params)?),
            Operation::EnterShell => Self::EnterShell(decode(operation, params)?),
            Operation::BuildTarget => Self::BuildTarget(decode(operation, params)?),
            Operation::InitFlake => Self::InitFlake(decode(operation, params)?),
            Operation::ShowFlake => Self::ShowFlake(decode(operation, params)?),
            Operation::ValidateFlake => Self::ValidateFlake(decode(operation, params)?),
            Operation::UpdateFlakeInputs => Self::UpdateFlakeInputs(decode(operation, params)?),
            Operation::DescribeLockFile => Self::DescribeLockFile(decode(operation, params)?),
            Operation::SearchSystemOptions => {
                Self::SearchSystemOptions(decode(operation, params)?)
            }
            Operation::DescribeSystemOption => {
                Self::DescribeSystemOption(decode(operation, params)?)
            }
            Operation::ApplySystemConfiguration => {
                Self::ApplySystemConfiguration(decode(operation, params)?)
            }
            Operation::ListSystemGenerations => {
                Self::ListSystemGenerations(decode(operation, params)?)
            }
            Operation::EvaluateExpression => Self::EvaluateExpression(decode(operation, params)?),
            Operation::FormatFiles => Self::FormatFiles(decode(operation, params)?),
            Operation::LintFiles => Self::LintFiles(decode(operation, params)?),
            Operation::EvaluateInRepl => Self::EvaluateInRepl(decode(operation, params)?),
            Operation::ParseSyntax => Self::ParseSyntax(decode(operation, params)?),
        };
        decoded.validate()?;
        Ok(decoded)
    }

    /// The operation these parameters belong to.
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

    /// Check every parameter value.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SearchPackages(p) => {
                validate::positional_text("query", &p.query)?;
                opt(&p.flake, |v| validate::token("flake", v))?;
                opt(&p.max_results, |v| validate::positive("max_results", *v))
            }
            Self::InspectPackage(p) => {
                validate::package_name("name", &p.name)?;
                opt(&p.flake, |v| validate::token("flake", v))
            }
            Self::RunPackage(p) => {
                validate::package_name("package", &p.package)?;
                opt(&p.flake, |v| validate::token("flake", v))?;
                p.args.iter().try_for_each(|a| validate::argument("args", a))
            }
            Self::EnterShell(p) => {
                if p.packages.is_empty() {
                    return Err(NixkilError::invalid(
                        "parameter 'packages' must name at least one package",
                    ));
                }
                p.packages
                    .iter()
                    .try_for_each(|pkg| validate::installable("packages", pkg))?;
                if let Some(program) = p.command.first() {
                    validate::positional_text("command", program)?;
                }
                p.command
                    .iter()
                    .try_for_each(|a| validate::argument("command", a))
            }
            Self::BuildTarget(p) => {
                validate::token("target", &p.target)?;
                if p.no_link && p.out_link.is_some() {
                    return Err(NixkilError::invalid(
                        "parameters 'no_link' and 'out_link' are mutually exclusive",
                    ));
                }
                opt(&p.out_link, |v| validate::path("out_link", v))
            }
            Self::InitFlake(p) => opt(&p.template, |v| validate::token("template", v)),
            Self::ShowFlake(p) => opt(&p.flake_ref, |v| validate::token("flake_ref", v)),
            Self::ValidateFlake(p) => opt(&p.flake_ref, |v| validate::token("flake_ref", v)),
            Self::UpdateFlakeInputs(p) => {
                opt(&p.flake_ref, |v| validate::token("flake_ref", v))?;
                p.inputs
                    .iter()
                    .try_for_each(|i| validate::input_name("inputs", i))
            }
            Self::DescribeLockFile(p) => opt(&p.flake_ref, |v| validate::token("flake_ref", v)),
            Self::SearchSystemOptions(p) => {
                validate::text("query", &p.query)?;
                opt(&p.max_results, |v| validate::positive("max_results", *v))
            }
            Self::DescribeSystemOption(p) => validate::option_path("option", &p.option),
            Self::ApplySystemConfiguration(p) => {
                validate::host("target_host", &p.target_host)?;
                opt(&p.flake, |v| validate::token("flake", v))?;
                if p.hostname.is_some() && p.flake.is_none() {
                    return Err(NixkilError::invalid(
                        "parameter 'hostname' requires 'flake'",
                    ));
                }
                opt(&p.hostname, |v| validate::attr_name("hostname", v))
            }
            Self::ListSystemGenerations(p) => {
                opt(&p.profile, |v| validate::path("profile", v))?;
                opt(&p.limit, |v| validate::positive("limit", *v))
            }
            Self::EvaluateExpression(p) => {
                if p.raw && p.json == Some(true) {
                    return Err(NixkilError::invalid(
                        "parameters 'raw' and 'json' are mutually exclusive",
                    ));
                }
                validate::text("expression", &p.expression)
            }
            Self::FormatFiles(p) => opt(&p.path, |v| validate::path("path", v)),
            Self::LintFiles(p) => opt(&p.path, |v| validate::path("path", v)),
            Self::EvaluateInRepl(p) => {
                validate::text("expression", &p.expression)?;
                if p.expression.lines().any(|l| l.trim_start().starts_with(':')) {
                    return Err(NixkilError::invalid(
                        "parameter 'expression' must not contain repl commands (lines starting with ':')",
                    ));
                }
                opt(&p.flake, |v| validate::token("flake", v))
            }
            Self::ParseSyntax(p) => validate::path("path", &p.path),
        }
    }
}

fn opt<T>(value: &Option<T>, check: impl FnOnce(&T) -> Result<()>) -> Result<()> {
    match value {
        Some(v) => check(v),
        None => Ok(()),
    }
}
