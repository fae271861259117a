//! Flake operations: init, show, check, update, lock metadata.

use super::{CallOptions, NixTools};
use crate::command::CURRENT_FLAKE;
use crate::params::{
    DescribeLockFileParams, InitFlakeParams, OperationParams, ShowFlakeParams,
    UpdateFlakeInputsParams, ValidateFlakeParams,
};
use crate::result::{NormalizedResult, Payload};
use serde_json::{Map, Value, json};

/// Length a locked revision is shortened to.
const SHORT_REV_LEN: usize = 12;

impl NixTools {
    /// Initialize a flake in the working directory.
    pub fn init_flake(&self, params: InitFlakeParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::InitFlake(params), options)
    }

    /// Show a flake's output tree.
    pub fn show_flake(&self, params: ShowFlakeParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::ShowFlake(params), options)
    }

    pub fn validate_flake(
        &self,
        params: ValidateFlakeParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::ValidateFlake(params), options)
    }

    pub fn update_flake_inputs(
        &self,
        params: UpdateFlakeInputsParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::UpdateFlakeInputs(params), options)
    }

    /// Summarise the lock file: one entry per locked input.
    pub fn describe_lock_file(
        &self,
        params: DescribeLockFileParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::DescribeLockFile(params), options)
    }
}

/// Reduce flake metadata to `{flake, description, inputs}`.
pub(super) fn summarize_lock(payload: Payload, params: &DescribeLockFileParams) -> Payload {
    let flake = params.flake_ref.as_deref().unwrap_or(CURRENT_FLAKE);
    super::map_structured(payload, |metadata| {
        let locks = &metadata["locks"];
        let root = locks["root"].as_str().unwrap_or("root");

        let mut inputs = Map::new();
        if let Some(nodes) = locks["nodes"].as_object() {
            for (name, node) in nodes.iter().filter(|(name, _)| name.as_str() != root) {
                let locked = &node["locked"];
                let rev = locked["rev"]
                    .as_str()
                    .map(|rev| Value::String(rev.chars().take(SHORT_REV_LEN).collect()))
                    .unwrap_or(Value::Null);
                inputs.insert(
                    name.clone(),
                    json!({
                        "type": locked["type"],
                        "owner": locked["owner"],
                        "repo": locked["repo"],
                        "rev": rev,
                        "last_modified": locked["lastModified"],
                    }),
                );
            }
        }

        json!({
            "flake": flake,
            "description": metadata["description"],
            "inputs": inputs,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Value {
        json!({
            "description": "my system",
            "url": "path:/home/me/dotfiles",
            "locks": {
                "root": "root",
                "version": 7,
                "nodes": {
                    "root": {"inputs": {"nixpkgs": "nixpkgs"}},
                    "nixpkgs": {
                        "locked": {
                            "type": "github",
                            "owner": "NixOS",
                            "repo": "nixpkgs",
                            "rev": "0123456789abcdef0123456789abcdef01234567",
                            "lastModified": 1700000000
                        }
                    },
                    "flake-utils": {
                        "locked": {"type": "path", "path": "/src/utils"}
                    }
                }
            }
        })
    }

    #[test]
    fn lock_summary_skips_root_and_shortens_revs() {
        let params = DescribeLockFileParams {
            flake_ref: Some("github:me/dotfiles".to_string()),
        };
        let summary = summarize_lock(Payload::Structured(metadata()), &params);
        assert_eq!(
            summary,
            Payload::Structured(json!({
                "flake": "github:me/dotfiles",
                "description": "my system",
                "inputs": {
                    "nixpkgs": {
                        "type": "github",
                        "owner": "NixOS",
                        "repo": "nixpkgs",
                        "rev": "0123456789ab",
                        "last_modified": 1700000000
                    },
                    "flake-utils": {
                        "type": "path",
                        "owner": null,
                        "repo": null,
                        "rev": null,
                        "last_modified": null
                    }
                }
            }))
        );
    }

    #[test]
    fn lock_summary_without_locks_has_no_inputs() {
        let summary = summarize_lock(
            Payload::Structured(json!({"description": null})),
            &DescribeLockFileParams::default(),
        );
        assert_eq!(
            summary,
            Payload::Structured(json!({"flake": ".", "description": null, "inputs": {}}))
        );
    }
}
