//! Parameter → argument vector mapping, one arm per operation.

use super::{CURRENT_FLAKE, CommandSpec};
use crate::config::ToolConfig;
use crate::error::Result;
use crate::normalize::OutputShape;
use crate::params::{
    ApplySystemConfigurationParams, DEFAULT_MAX_RESULTS, EnterShellParams, OperationParams,
};
use std::collections::BTreeMap;

/// Function applied to a package attribute by `inspect_package`.
pub const INSPECT_SUMMARY_EXPR: &str = r#"pkg: {
  name = pkg.pname or pkg.name or null;
  version = pkg.version or null;
  description = pkg.meta.description or null;
  homepage = pkg.meta.homepage or null;
  license =
    let l = pkg.meta.license or null; in
    if l == null then null
    else if builtins.isList l then map (x: x.spdxId or x.shortName or null) l
    else l.spdxId or l.shortName or null;
}"#;

/// Function evaluated by `search_system_options`; the query and the limit
/// arrive through `--argstr`, never through string interpolation.
pub const OPTION_SEARCH_EXPR: &str = r#"{ query, limit }:
let
  nixos = import <nixpkgs/nixos> { configuration = { }; };
  lib = nixos.pkgs.lib;
  needle = lib.toLower query;
  docs = lib.optionAttrSetToDocList nixos.options;
  matches = builtins.filter
    (o: (o.visible or true) && lib.hasInfix needle (lib.toLower o.name))
    docs;
in {
  total = builtins.length matches;
  options = map
    (o: { name = o.name; description = o.description or null; type = o.type or null; })
    (lib.take (lib.toInt limit) matches);
}"#;

/// Command run inside `nix shell` when none is given.
const SHELL_DEFAULT_COMMAND: &str = "true";

/// Build the command for `params`.
///
/// Parameters are validated first; a validation failure is returned as
/// `InvalidParameters` and nothing is built.
pub fn build(config: &ToolConfig, params: &OperationParams) -> Result<CommandSpec> {
    params.validate()?;

    let (argv, stdin, shape) = match params {
        OperationParams::SearchPackages(p) => {
            let mut argv = nix(config, &["search"]);
            argv.push(flake_or_default(config, p.flake.as_deref()));
            argv.push(p.query.clone());
            argv.push("--json".into());
            (argv, None, OutputShape::JsonCollection)
        }
        OperationParams::InspectPackage(p) => {
            let mut argv = nix(config, &["eval", "--json"]);
            argv.push(format!(
                "{}#{}",
                flake_or_default(config, p.flake.as_deref()),
                p.name
            ));
            argv.push("--apply".into());
            argv.push(INSPECT_SUMMARY_EXPR.into());
            (argv, None, OutputShape::JsonRecord)
        }
        OperationParams::RunPackage(p) => {
            let mut argv = nix(config, &["run"]);
            argv.push(format!(
                "{}#{}",
                flake_or_default(config, p.flake.as_deref()),
                p.package
            ));
            argv.push("--".into());
            argv.extend(p.args.iter().cloned());
            (argv, None, OutputShape::Text)
        }
        OperationParams::EnterShell(p) => (shell_argv(config, p), None, OutputShape::Text),
        OperationParams::BuildTarget(p) => {
            let mut argv = nix(config, &["build"]);
            argv.push(p.target.clone());
            argv.push("--print-out-paths".into());
            if p.no_link {
                argv.push("--no-link".into());
            } else if let Some(out_link) = &p.out_link {
                argv.push("--out-link".into());
                argv.push(out_link.clone());
            }
            (argv, None, OutputShape::Lines)
        }
        OperationParams::InitFlake(p) => {
            let mut argv = nix(config, &["flake", "init"]);
            if let Some(template) = &p.template {
                argv.push("--template".into());
                argv.push(template.clone());
            }
            (argv, None, OutputShape::Text)
        }
        OperationParams::ShowFlake(p) => {
            let mut argv = nix(config, &["flake", "show"]);
            argv.push(flake_ref(p.flake_ref.as_deref()));
            argv.push("--json".into());
            (argv, None, OutputShape::JsonRecord)
        }
        OperationParams::ValidateFlake(p) => {
            let mut argv = nix(config, &["flake", "check"]);
            argv.push(flake_ref(p.flake_ref.as_deref()));
            if p.no_build {
                argv.push("--no-build".into());
            }
            (argv, None, OutputShape::Text)
        }
        OperationParams::UpdateFlakeInputs(p) => {
            let mut argv = nix(config, &["flake", "update"]);
            argv.extend(p.inputs.iter().cloned());
            argv.push("--flake".into());
            argv.push(flake_ref(p.flake_ref.as_deref()));
            (argv, None, OutputShape::Text)
        }
        OperationParams::DescribeLockFile(p) => {
            let mut argv = nix(config, &["flake", "metadata"]);
            argv.push(flake_ref(p.flake_ref.as_deref()));
            argv.push("--json".into());
            (argv, None, OutputShape::JsonRecord)
        }
        OperationParams::SearchSystemOptions(p) => {
            let limit = p.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
            let mut argv = nix(config, &["eval", "--json", "--impure", "--expr"]);
            argv.push(OPTION_SEARCH_EXPR.into());
            argv.extend(["--argstr".into(), "query".into(), p.query.clone()]);
            argv.extend(["--argstr".into(), "limit".into(), limit.to_string()]);
            (argv, None, OutputShape::JsonRecord)
        }
        OperationParams::DescribeSystemOption(p) => (
            vec![config.programs.nixos_option.clone(), p.option.clone()],
            None,
            OutputShape::Text,
        ),
        OperationParams::ApplySystemConfiguration(p) => {
            (rebuild_argv(config, p), None, OutputShape::Text)
        }
        OperationParams::ListSystemGenerations(p) => (
            vec![
                config.programs.nix_env.clone(),
                "--list-generations".into(),
                "--profile".into(),
                p.profile_path().to_string(),
            ],
            None,
            OutputShape::Text,
        ),
        OperationParams::EvaluateExpression(p) => {
            let mut argv = nix(config, &["eval", "--expr"]);
            argv.push(p.expression.clone());
            let shape = if p.wants_json() {
                argv.push("--json".into());
                OutputShape::JsonValue
            } else {
                if p.raw {
                    argv.push("--raw".into());
                }
                OutputShape::Text
            };
            if p.impure {
                argv.push("--impure".into());
            }
            (argv, None, shape)
        }
        OperationParams::FormatFiles(p) => {
            let mut argv = nix(config, &["fmt", "--"]);
            if p.check {
                argv.push("--check".into());
            }
            argv.push(p.path.clone().unwrap_or_else(|| CURRENT_FLAKE.to_string()));
            (argv, None, OutputShape::Text)
        }
        OperationParams::LintFiles(p) => (
            vec![
                config.programs.statix.clone(),
                "check".into(),
                "--format".into(),
                "json".into(),
                p.path.clone().unwrap_or_else(|| CURRENT_FLAKE.to_string()),
            ],
            None,
            OutputShape::JsonValue,
        ),
        OperationParams::EvaluateInRepl(p) => {
            let mut argv = nix(config, &["repl"]);
            if let Some(flake) = &p.flake {
                argv.push(flake.clone());
            }
            let stdin = format!("{}\n:q\n", p.expression.trim_end());
            (argv, Some(stdin), OutputShape::Text)
        }
        OperationParams::ParseSyntax(p) => (
            vec![
                config.programs.nix_instantiate.clone(),
                "--parse".into(),
                p.path.clone(),
            ],
            None,
            OutputShape::Text,
        ),
    };

    Ok(CommandSpec {
        operation: params.operation(),
        argv,
        env: command_env(config),
        stdin,
        shape,
    })
}

/// `nix` with the configured experimental features, followed by `args`.
fn nix(config: &ToolConfig, args: &[&str]) -> Vec<String> {
    let mut argv = vec![config.programs.nix.clone()];
    if !config.experimental_features.is_empty() {
        argv.push("--extra-experimental-features".into());
        argv.push(config.experimental_features.join(" "));
    }
    argv.extend(args.iter().map(|a| a.to_string()));
    argv
}

fn flake_or_default(config: &ToolConfig, flake: Option<&str>) -> String {
    flake.unwrap_or(&config.default_flake).to_string()
}

fn flake_ref(flake_ref: Option<&str>) -> String {
    flake_ref.unwrap_or(CURRENT_FLAKE).to_string()
}

fn shell_argv(config: &ToolConfig, p: &EnterShellParams) -> Vec<String> {
    let mut argv = nix(config, &["shell"]);
    for package in &p.packages {
        if package.contains('#') {
            argv.push(package.clone());
        } else {
            argv.push(format!("{}#{}", config.default_flake, package));
        }
    }
    argv.push("--command".into());
    if p.command.is_empty() {
        argv.push(SHELL_DEFAULT_COMMAND.into());
    } else {
        argv.extend(p.command.iter().cloned());
    }
    argv
}

fn rebuild_argv(config: &ToolConfig, p: &ApplySystemConfigurationParams) -> Vec<String> {
    let action = p.effective_action();
    let mut argv = Vec::new();

    // Activation on this machine needs root; never prompt for a password.
    if p.is_local() && action.activates() && config.use_sudo {
        argv.push(config.programs.sudo.clone());
        argv.push("-n".into());
    }

    argv.push(config.programs.nixos_rebuild.clone());
    argv.push(action.as_str().into());

    if let Some(flake) = &p.flake {
        argv.push("--flake".into());
        match &p.hostname {
            Some(hostname) => argv.push(format!("{}#{}", flake, hostname)),
            None => argv.push(flake.clone()),
        }
    }

    if !p.is_local() {
        argv.push("--target-host".into());
        argv.push(p.target_host.clone());
        if action.activates() {
            argv.push("--use-remote-sudo".into());
        }
    }
    argv
}

fn command_env(config: &ToolConfig) -> BTreeMap<String, String> {
    let mut env = BTreeMap::from([
        ("NO_COLOR".to_string(), "1".to_string()),
        ("TERM".to_string(), "dumb".to_string()),
    ]);
    env.extend(
        config
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    env
}
