//! Configuration types and defaults for nixkil.
//!
//! This module defines the nested config sections and the default value
//! functions used by the `ToolConfig` struct.

use crate::operation::OperationClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default timeout for fast metadata lookups (seconds).
pub const DEFAULT_FAST_TIMEOUT_SECONDS: u64 = 60;

/// Default timeout for standard operations that may fetch inputs (seconds).
pub const DEFAULT_STANDARD_TIMEOUT_SECONDS: u64 = 300;

/// Default timeout for builds and system activation (seconds).
pub const DEFAULT_LONG_TIMEOUT_SECONDS: u64 = 1800;

/// Default grace period between SIGTERM and SIGKILL (milliseconds).
pub const DEFAULT_KILL_GRACE_MILLIS: u64 = 2000;

/// Upper bound for `kill_grace_millis` (one minute).
pub const MAX_KILL_GRACE_MILLIS: u64 = 60_000;

/// Program names (or absolute paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Programs {
    pub nix: String,
    pub nixos_rebuild: String,
    pub nixos_option: String,
    pub nix_env: String,
    pub nix_instantiate: String,
    pub statix: String,
    pub sudo: String,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            nix: "nix".to_string(),
            nixos_rebuild: "nixos-rebuild".to_string(),
            nixos_option: "nixos-option".to_string(),
            nix_env: "nix-env".to_string(),
            nix_instantiate: "nix-instantiate".to_string(),
            statix: "statix".to_string(),
            sudo: "sudo".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl Programs {
    /// All configured programs as `(config key, value)` pairs.
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("nix", &self.nix),
            ("nixos_rebuild", &self.nixos_rebuild),
            ("nixos_option", &self.nixos_option),
            ("nix_env", &self.nix_env),
            ("nix_instantiate", &self.nix_instantiate),
            ("statix", &self.statix),
            ("sudo", &self.sudo),
        ]
    }
}

/// Default timeouts per operation class, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub fast: u64,
    pub standard: u64,
    pub long: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_TIMEOUT_SECONDS,
            standard: DEFAULT_STANDARD_TIMEOUT_SECONDS,
            long: DEFAULT_LONG_TIMEOUT_SECONDS,
        }
    }
}

impl Timeouts {
    /// Timeout in seconds for an operation class.
    pub fn for_class(&self, class: OperationClass) -> u64 {
        match class {
            OperationClass::Fast => self.fast,
            OperationClass::Standard => self.standard,
            OperationClass::Long => self.long,
        }
    }
}

pub(crate) fn default_flake() -> String {
    "nixpkgs".to_string()
}

pub(crate) fn default_experimental_features() -> Vec<String> {
    vec!["nix-command".to_string(), "flakes".to_string()]
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_kill_grace_millis() -> u64 {
    DEFAULT_KILL_GRACE_MILLIS
}
