//! Package operations: search, inspect, run, shell, build.

use super::{CallOptions, NixTools};
use crate::params::{
    BuildTargetParams, DEFAULT_MAX_RESULTS, EnterShellParams, InspectPackageParams,
    OperationParams, RunPackageParams, SearchPackagesParams,
};
use crate::result::{NormalizedResult, Payload};
use serde_json::Value;

impl NixTools {
    /// Search a flake's packages by name or description.
    ///
    /// The payload is the search tool's JSON, capped at `max_results` entries.
    pub fn search_packages(
        &self,
        params: SearchPackagesParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::SearchPackages(params), options)
    }

    /// Summarise one package: name, version, description, homepage, license.
    pub fn inspect_package(
        &self,
        params: InspectPackageParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::InspectPackage(params), options)
    }

    pub fn run_package(&self, params: RunPackageParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::RunPackage(params), options)
    }

    /// Run a command with the given packages available.
    pub fn enter_shell(&self, params: EnterShellParams, options: &CallOptions) -> NormalizedResult {
        self.call(&OperationParams::EnterShell(params), options)
    }

    /// Build an installable; the payload lists the output store paths.
    pub fn build_target(
        &self,
        params: BuildTargetParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::BuildTarget(params), options)
    }
}

/// Cap search results at the requested maximum.
pub(super) fn truncate_search(
    payload: Payload,
    params: &SearchPackagesParams,
    warnings: &mut Vec<String>,
) -> Payload {
    let max = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    super::map_structured(payload, |value| {
        let (kept, found) = match value {
            Value::Array(mut items) => {
                let found = items.len();
                items.truncate(max);
                (Value::Array(items), found)
            }
            Value::Object(entries) => {
                let found = entries.len();
                (Value::Object(entries.into_iter().take(max).collect()), found)
            }
            other => (other, 0),
        };
        if found > max {
            warnings.push(format!(
                "showing {} of {} results for '{}'; narrow the query or raise max_results",
                max, found, params.query
            ));
        }
        kept
    })
}
