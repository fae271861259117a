//! Config loading, validation, and resolution.

use super::model::ToolConfig;
use super::types::MAX_KILL_GRACE_MILLIS;
use crate::error::{NixkilError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "NIXKIL_CONFIG";

impl ToolConfig {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(ToolConfig)` - Successfully loaded and validated config
    /// * `Err(NixkilError::ConfigError)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            NixkilError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Resolve the config for this process.
    ///
    /// An explicit path wins; otherwise `NIXKIL_CONFIG` is consulted; otherwise
    /// the defaults are used.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        };

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ToolConfig = if yaml.trim().is_empty() {
            ToolConfig::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| NixkilError::ConfigError(format!("failed to parse config YAML: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            NixkilError::ConfigError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - every timeout must be positive
    /// - `kill_grace_millis` must be positive and at most one minute
    /// - program names and `default_flake` must be non-empty
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("fast", self.timeouts.fast),
            ("standard", self.timeouts.standard),
            ("long", self.timeouts.long),
        ] {
            if value == 0 {
                return Err(NixkilError::ConfigError(format!(
                    "timeouts.{} must be greater than 0",
                    name
                )));
            }
        }

        if self.kill_grace_millis == 0 {
            return Err(NixkilError::ConfigError(
                "kill_grace_millis must be greater than 0".to_string(),
            ));
        }
        if self.kill_grace_millis > MAX_KILL_GRACE_MILLIS {
            return Err(NixkilError::ConfigError(format!(
                "kill_grace_millis must be at most {}",
                MAX_KILL_GRACE_MILLIS
            )));
        }

        for (key, program) in self.programs.entries() {
            if program.trim().is_empty() {
                return Err(NixkilError::ConfigError(format!(
                    "programs.{} must not be empty",
                    key
                )));
            }
        }

        if self.default_flake.trim().is_empty() {
            return Err(NixkilError::ConfigError(
                "default_flake must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Grace period between SIGTERM and SIGKILL.
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_millis)
    }
}
