//! The value returned across the public boundary of the tool layer.
//!
//! A [`NormalizedResult`] is either a success carrying a payload and warnings,
//! or a failure carrying an [`ErrorKind`], a message, and optionally the raw
//! diagnostic text of the external tool. Failures are values, never panics or
//! `Err`s, so callers must look at the kind to decide what to do next.

use crate::error::NixkilError;
use crate::exit_codes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete request; no process was spawned.
    InvalidParameters,
    /// The external program could not be launched.
    ToolUnavailable,
    /// The external program exceeded its time budget and was terminated.
    Timeout,
    /// The external program ran and exited non-zero.
    ToolReportedError,
}

impl ErrorKind {
    /// CLI exit code for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::InvalidParameters => exit_codes::USER_ERROR,
            ErrorKind::ToolUnavailable => exit_codes::TOOL_UNAVAILABLE,
            ErrorKind::Timeout => exit_codes::TIMEOUT,
            ErrorKind::ToolReportedError => exit_codes::TOOL_REPORTED_ERROR,
        }
    }

    /// Whether resubmitting the same request unchanged could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidParameters => write!(f, "invalid_parameters"),
            ErrorKind::ToolUnavailable => write!(f, "tool_unavailable"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::ToolReportedError => write!(f, "tool_reported_error"),
        }
    }
}

/// Success payload: parsed structured data, or the raw text when the output
/// is plain text or could not be parsed.
///
/// Serialized untagged, so the JSON form is output-only: a text payload and a
/// structured JSON string look the same on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Structured(Value),
    Text(String),
}

impl Payload {
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Payload::Structured(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Structured(_) => None,
        }
    }
}

/// Final result of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedResult {
    Success {
        payload: Payload,
        warnings: Vec<String>,
    },
    Failure {
        error_kind: ErrorKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_detail: Option<String>,
    },
}

impl NormalizedResult {
    pub fn success(payload: Payload) -> Self {
        NormalizedResult::Success {
            payload,
            warnings: Vec::new(),
        }
    }

    pub fn failure(error_kind: ErrorKind, message: impl Into<String>) -> Self {
        NormalizedResult::Failure {
            error_kind,
            message: message.into(),
            raw_detail: None,
        }
    }

    /// Attach raw diagnostic text to a failure. No-op on success.
    pub fn with_raw_detail(mut self, detail: impl Into<String>) -> Self {
        if let NormalizedResult::Failure { raw_detail, .. } = &mut self {
            let detail = detail.into();
            if !detail.is_empty() {
                *raw_detail = Some(detail);
            }
        }
        self
    }

    /// Append a warning to a success. No-op on failure.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        if let NormalizedResult::Success { warnings, .. } = &mut self {
            warnings.push(warning.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NormalizedResult::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            NormalizedResult::Failure { error_kind, .. } => Some(*error_kind),
            NormalizedResult::Success { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            NormalizedResult::Success { payload, .. } => Some(payload),
            NormalizedResult::Failure { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            NormalizedResult::Success { warnings, .. } => warnings,
            NormalizedResult::Failure { .. } => &[],
        }
    }

    /// CLI exit code for this result.
    pub fn exit_code(&self) -> i32 {
        match self.error_kind() {
            Some(kind) => kind.exit_code(),
            None => exit_codes::SUCCESS,
        }
    }
}

impl From<NixkilError> for NormalizedResult {
    fn from(err: NixkilError) -> Self {
        match err {
            NixkilError::InvalidParameters(message) => {
                NormalizedResult::failure(ErrorKind::InvalidParameters, message)
            }
            other => NormalizedResult::failure(ErrorKind::InvalidParameters, other.to_string()),
        }
    }
}
