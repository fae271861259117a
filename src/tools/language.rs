//! Language operations: evaluate, format, lint, repl, parse.

use super::{CallOptions, NixTools};
use crate::params::{
    EvaluateExpressionParams, EvaluateInReplParams, FormatFilesParams, LintFilesParams,
    OperationParams, ParseSyntaxParams,
};
use crate::result::{NormalizedResult, Payload};

/// Prefixes of repl lines that are not part of the evaluation result.
const REPL_NOISE_PREFIXES: &[&str] = &["nix-repl>", "Welcome to Nix", "Type :? for help"];

impl NixTools {
    /// Evaluate an expression; JSON output unless `raw` or `json: false`.
    pub fn evaluate_expression(
        &self,
        params: EvaluateExpressionParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::EvaluateExpression(params), options)
    }

    /// Format files with the flake's formatter; `check` only reports.
    pub fn format_files(&self, params: FormatFilesParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::FormatFiles(params), options)
    }

    pub fn lint_files(&self, params: LintFilesParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::LintFiles(params), options)
    }

    /// Evaluate an expression in the interactive evaluator, optionally with a
    /// flake in scope.
    pub fn evaluate_in_repl(
        &self,
        params: EvaluateInReplParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::EvaluateInRepl(params), options)
    }

    pub fn parse_syntax(&self, params: ParseSyntaxParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::ParseSyntax(params), options)
    }
}

/// Drop prompts, the banner and blank lines from a repl transcript.
pub(super) fn strip_repl_noise(payload: Payload) -> Payload {
    match payload {
        Payload::Text(text) => Payload::Text(
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .filter(|line| !REPL_NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        structured => structured,
    }
}
