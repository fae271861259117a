//! ToolConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for the nixkil tool layer.
///
/// Passed explicitly into every call; there is no process-wide instance.
/// Unknown fields in the YAML are preserved for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    // =========================================================================
    // External programs
    // =========================================================================
    /// Program names or paths for each external tool.
    pub programs: Programs,

    /// Flake used when an operation does not name one (default: "nixpkgs").
    #[serde(default = "default_flake")]
    pub default_flake: String,

    /// Experimental features enabled on every `nix` invocation.
    #[serde(default = "default_experimental_features")]
    pub experimental_features: Vec<String>,

    /// Whether local system activation is prefixed with `sudo -n`.
    #[serde(default = "default_true")]
    pub use_sudo: bool,

    // =========================================================================
    // Execution limits
    // =========================================================================
    /// Default timeouts per operation class.
    pub timeouts: Timeouts,

    /// Grace period between the cooperative and the forced kill.
    #[serde(default = "default_kill_grace_millis")]
    pub kill_grace_millis: u64,

    /// Extra environment variables for every spawned command.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    // =========================================================================
    // Knowledge corpus
    // =========================================================================
    /// Root of the static documentation tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_dir: Option<PathBuf>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            programs: Programs::default(),
            default_flake: default_flake(),
            experimental_features: default_experimental_features(),
            use_sudo: true,
            timeouts: Timeouts::default(),
            kill_grace_millis: default_kill_grace_millis(),
            environment: BTreeMap::new(),
            knowledge_dir: None,
            extra: BTreeMap::new(),
        }
    }
}
