//! The fixed catalog of operations exposed to calling agents.
//!
//! Every operation has a stable wire name (snake_case, also accepted in
//! kebab-case), a timeout class, and a one-line description used by the CLI
//! and by agents discovering the catalog.

use crate::error::NixkilError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeout class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationClass {
    /// Metadata lookups and local evaluation.
    Fast,
    /// Operations that may fetch flake inputs or realise small closures.
    Standard,
    /// Builds, checks, and system activation.
    Long,
}

/// An operation from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SearchPackages,
    InspectPackage,
    RunPackage,
    EnterShell,
    BuildTarget,
    InitFlake,
    ShowFlake,
    ValidateFlake,
    UpdateFlakeInputs,
    DescribeLockFile,
    SearchSystemOptions,
    DescribeSystemOption,
    ApplySystemConfiguration,
    ListSystemGenerations,
    EvaluateExpression,
    FormatFiles,
    LintFiles,
    EvaluateInRepl,
    ParseSyntax,
}

impl Operation {
    /// Every operation, in catalog order.
    pub const ALL: [Operation; 19] = [
        Operation::SearchPackages,
        Operation::InspectPackage,
        Operation::RunPackage,
        Operation::EnterShell,
        Operation::BuildTarget,
        Operation::InitFlake,
        Operation::ShowFlake,
        Operation::ValidateFlake,
        Operation::UpdateFlakeInputs,
        Operation::DescribeLockFile,
        Operation::SearchSystemOptions,
        Operation::DescribeSystemOption,
        Operation::ApplySystemConfiguration,
        Operation::ListSystemGenerations,
        Operation::EvaluateExpression,
        Operation::FormatFiles,
        Operation::LintFiles,
        Operation::EvaluateInRepl,
        Operation::ParseSyntax,
    ];

    /// Stable wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SearchPackages => "search_packages",
            Operation::InspectPackage => "inspect_package",
            Operation::RunPackage => "run_package",
            Operation::EnterShell => "enter_shell",
            Operation::BuildTarget => "build_target",
            Operation::InitFlake => "init_flake",
            Operation::ShowFlake => "show_flake",
            Operation::ValidateFlake => "validate_flake",
            Operation::UpdateFlakeInputs => "update_flake_inputs",
            Operation::DescribeLockFile => "describe_lock_file",
            Operation::SearchSystemOptions => "search_system_options",
            Operation::DescribeSystemOption => "describe_system_option",
            Operation::ApplySystemConfiguration => "apply_system_configuration",
            Operation::ListSystemGenerations => "list_system_generations",
            Operation::EvaluateExpression => "evaluate_expression",
            Operation::FormatFiles => "format_files",
            Operation::LintFiles => "lint_files",
            Operation::EvaluateInRepl => "evaluate_in_repl",
            Operation::ParseSyntax => "parse_syntax",
        }
    }

    /// Look up an operation by wire name. Kebab-case is accepted as well.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('-', "_");
        Self::ALL.into_iter().find(|op| op.name() == normalized)
    }

    /// Timeout class used to pick the default timeout.
    pub fn class(&self) -> OperationClass {
        match self {
            Operation::DescribeLockFile
            | Operation::DescribeSystemOption
            | Operation::ListSystemGenerations
            | Operation::EvaluateExpression
            | Operation::LintFiles
            | Operation::ParseSyntax => OperationClass::Fast,

            Operation::BuildTarget
            | Operation::ValidateFlake
            | Operation::ApplySystemConfiguration => OperationClass::Long,

            _ => OperationClass::Standard,
        }
    }

    /// Whether the operation only reads state (safe to repeat).
    pub fn is_read_only(&self) -> bool {
        !matches!(
            self,
            Operation::RunPackage
                | Operation::EnterShell
                | Operation::BuildTarget
                | Operation::InitFlake
                | Operation::UpdateFlakeInputs
                | Operation::ApplySystemConfiguration
                | Operation::FormatFiles
        )
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            Operation::SearchPackages => "Search packages in nixpkgs or another flake",
            Operation::InspectPackage => "Show name, version, license and description of a package",
            Operation::RunPackage => "Run a package without installing it",
            Operation::EnterShell => "Run a command in a temporary shell with the given packages",
            Operation::BuildTarget => "Build a flake output or derivation and report its store paths",
            Operation::InitFlake => "Initialize a flake in the working directory",
            Operation::ShowFlake => "Show the outputs of a flake",
            Operation::ValidateFlake => "Check a flake for evaluation and build errors",
            Operation::UpdateFlakeInputs => "Update the lock file of a flake",
            Operation::DescribeLockFile => "Summarize the locked inputs of a flake",
            Operation::SearchSystemOptions => "Search NixOS option names",
            Operation::DescribeSystemOption => "Describe a NixOS option",
            Operation::ApplySystemConfiguration => "Build and activate a NixOS configuration",
            Operation::ListSystemGenerations => "List generations of a system profile",
            Operation::EvaluateExpression => "Evaluate a Nix expression",
            Operation::FormatFiles => "Format Nix files with the flake formatter",
            Operation::LintFiles => "Lint Nix files with statix",
            Operation::EvaluateInRepl => "Evaluate an expression inside nix repl",
            Operation::ParseSyntax => "Parse a Nix file and report syntax errors",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = NixkilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            NixkilError::invalid(format!(
                "unknown operation '{}'. Known operations: {}",
                s,
                Self::ALL
                    .iter()
                    .map(|op| op.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }
}
