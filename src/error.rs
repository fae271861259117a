//! Error types for nixkil.
//!
//! These errors cover everything that can go wrong *before* an external tool
//! is spawned or outside the tool layer altogether (config, CLI, knowledge
//! lookups). Outcomes of external tool runs are never errors; they are
//! reported through [`crate::result::NormalizedResult`].

use crate::exit_codes;
use thiserror::Error;

/// Main error type for nixkil operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NixkilError {
    /// The caller supplied a malformed or incomplete request.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The configuration file could not be read, parsed, or validated.
    #[error("config error: {0}")]
    ConfigError(String),

    /// Generic user-facing error (bad CLI usage, unreadable input).
    #[error("{0}")]
    UserError(String),

    /// A knowledge corpus entry could not be resolved.
    #[error("knowledge lookup failed: {0}")]
    KnowledgeError(String),
}

impl NixkilError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            NixkilError::InvalidParameters(_) => exit_codes::USER_ERROR,
            NixkilError::ConfigError(_) => exit_codes::USER_ERROR,
            NixkilError::UserError(_) => exit_codes::USER_ERROR,
            NixkilError::KnowledgeError(_) => exit_codes::USER_ERROR,
        }
    }

    /// Shorthand for building an [`NixkilError::InvalidParameters`].
    pub fn invalid(message: impl Into<String>) -> Self {
        NixkilError::InvalidParameters(message.into())
    }
}

/// Result type alias for nixkil operations.
pub type Result<T> = std::result::Result<T, NixkilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_is_a_user_error() {
        let errors = [
            NixkilError::InvalidParameters("missing query".to_string()),
            NixkilError::ConfigError("bad yaml".to_string()),
            NixkilError::UserError("bad flag".to_string()),
            NixkilError::KnowledgeError("no such topic".to_string()),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        }
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = NixkilError::invalid("missing field `query`");
        assert_eq!(err.to_string(), "invalid parameters: missing field `query`");

        let err = NixkilError::ConfigError("timeouts.fast must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "config error: timeouts.fast must be greater than 0"
        );
    }
}
