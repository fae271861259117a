//! Result normalization.
//!
//! Turns a raw [`ExecutionOutcome`] into a [`NormalizedResult`]:
//!
//! 1. timed out → `Timeout` failure carrying the partial output
//! 2. never launched → `ToolUnavailable` failure
//! 3. non-zero exit → `ToolReportedError` failure with the tool's own text
//! 4. zero exit → success; output parsed according to the expected
//!    [`OutputShape`], degrading to raw text plus a warning when parsing fails
//!
//! A zero exit code is the authoritative success signal.

use crate::process::ExecutionOutcome;
use crate::result::{ErrorKind, NormalizedResult, Payload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of stderr lines used for a failure message.
pub const MESSAGE_MAX_LINES: usize = 3;

/// Maximum number of lines kept in raw detail for timeouts.
pub const DETAIL_MAX_LINES: usize = 50;

/// Maximum characters kept in raw detail for timeouts.
pub const DETAIL_MAX_CHARS: usize = 4096;

/// What a successful run is expected to print on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// A JSON array or object of records (search results).
    JsonCollection,
    /// A single JSON object.
    JsonRecord,
    /// Any JSON value.
    JsonValue,
    /// One item per non-empty line (store paths).
    Lines,
    /// Human-oriented text, passed through.
    Text,
}

impl OutputShape {
    fn describe(&self) -> &'static str {
        match self {
            OutputShape::JsonCollection => "a JSON array or object",
            OutputShape::JsonRecord => "a JSON object",
            OutputShape::JsonValue => "a JSON value",
            OutputShape::Lines => "lines of text",
            OutputShape::Text => "text",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            OutputShape::JsonCollection => value.is_array() || value.is_object(),
            OutputShape::JsonRecord => value.is_object(),
            _ => true,
        }
    }
}

/// Normalize one execution outcome.
pub fn normalize(outcome: &ExecutionOutcome, shape: OutputShape) -> NormalizedResult {
    if outcome.timed_out {
        return NormalizedResult::failure(
            ErrorKind::Timeout,
            format!(
                "`{}` timed out after {:.1}s and was terminated.\n\
                 Fix: retry with a larger timeout.",
                outcome.command,
                outcome.elapsed.as_secs_f64()
            ),
        )
        .with_raw_detail(partial_output(outcome));
    }

    if outcome.launch_failed() {
        return NormalizedResult::failure(ErrorKind::ToolUnavailable, outcome.stderr.trim());
    }

    if outcome.exit_code != 0 {
        let message = match last_lines(&outcome.stderr, MESSAGE_MAX_LINES)
            .or_else(|| last_lines(&outcome.stdout, MESSAGE_MAX_LINES))
        {
            Some(text) => text,
            None => format!(
                "`{}` failed with exit code {} and printed nothing",
                outcome.command, outcome.exit_code
            ),
        };
        let detail = if outcome.stderr.trim().is_empty() {
            outcome.stdout.clone()
        } else {
            outcome.stderr.clone()
        };
        return NormalizedResult::failure(ErrorKind::ToolReportedError, message)
            .with_raw_detail(detail);
    }

    parse_success(outcome, shape)
}

fn parse_success(outcome: &ExecutionOutcome, shape: OutputShape) -> NormalizedResult {
    let stdout = outcome.stdout.as_str();

    match shape {
        OutputShape::Text => NormalizedResult::success(Payload::Text(stdout.trim_end().to_string())),
        OutputShape::Lines => {
            let lines = stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| Value::String(l.to_string()))
                .collect();
            NormalizedResult::success(Payload::Structured(Value::Array(lines)))
        }
        OutputShape::JsonCollection | OutputShape::JsonRecord | OutputShape::JsonValue => {
            match serde_json::from_str::<Value>(stdout.trim()) {
                Ok(value) if shape.accepts(&value) => {
                    NormalizedResult::success(Payload::Structured(value))
                }
                Ok(_) => degraded(outcome, shape, "parsed JSON has the wrong type"),
                Err(e) => degraded(outcome, shape, &e.to_string()),
            }
        }
    }
}

fn degraded(outcome: &ExecutionOutcome, shape: OutputShape, reason: &str) -> NormalizedResult {
    tracing::warn!(
        command = %outcome.command,
        expected = shape.describe(),
        reason,
        "structured parsing failed; returning raw text"
    );
    NormalizedResult::success(Payload::Text(outcome.stdout.trim_end().to_string())).with_warning(
        format!(
            "malformed output: expected {} from `{}` ({}); returning raw text",
            shape.describe(),
            outcome.command,
            reason
        ),
    )
}

/// The last `max` non-empty lines of `text`, or `None` if there are none.
fn last_lines(text: &str, max: usize) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(max);
    Some(lines[start..].join("\n"))
}

fn partial_output(outcome: &ExecutionOutcome) -> String {
    let mut detail = String::new();
    if !outcome.stdout.trim().is_empty() {
        detail.push_str("stdout (partial):\n");
        detail.push_str(&truncate_output(
            &outcome.stdout,
            DETAIL_MAX_LINES,
            DETAIL_MAX_CHARS,
        ));
        detail.push('\n');
    }
    if !outcome.stderr.trim().is_empty() {
        detail.push_str("stderr (partial):\n");
        detail.push_str(&truncate_output(
            &outcome.stderr,
            DETAIL_MAX_LINES,
            DETAIL_MAX_CHARS,
        ));
        detail.push('\n');
    }
    detail
}

/// Keep the tail of `output`: at most `max_lines` lines and `max_chars` bytes.
pub fn truncate_output(output: &str, max_lines: usize, max_chars: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    let relevant_lines: Vec<&str> = if lines.len() > max_lines {
        lines[lines.len() - max_lines..].to_vec()
    } else {
        lines
    };

    let mut result = relevant_lines.join("\n");

    if result.len() > max_chars {
        let mut cut = result.len() - max_chars;
        while !result.is_char_boundary(cut) {
            cut += 1;
        }
        result = format!("...(truncated)...\n{}", &result[cut..]);
    }

    result
}
