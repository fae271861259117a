//! Tests for command construction.

use super::*;
use crate::config::ToolConfig;
use crate::error::NixkilError;
use crate::params::{
    ApplySystemConfigurationParams, BuildTargetParams, EnterShellParams,
    EvaluateExpressionParams, EvaluateInReplParams, InspectPackageParams,
    ListSystemGenerationsParams, OperationParams, RebuildAction, SearchPackagesParams,
    SearchSystemOptionsParams, UpdateFlakeInputsParams,
};
use serde_json::{Map, Value, json};

fn params(op: Operation, value: Value) -> OperationParams {
    let Value::Object(map) = value else {
        panic!("expected an object");
    };
    OperationParams::from_map(op, map).unwrap()
}

fn sample_params(op: Operation) -> OperationParams {
    let value = match op {
        Operation::SearchPackages | Operation::SearchSystemOptions => json!({"query": "hello"}),
        Operation::InspectPackage => json!({"name": "hello"}),
        Operation::RunPackage => json!({"package": "hello"}),
        Operation::EnterShell => json!({"packages": ["hello"]}),
        Operation::BuildTarget => json!({"target": ".#default"}),
        Operation::DescribeSystemOption => json!({"option": "services.nginx.enable"}),
        Operation::ApplySystemConfiguration => json!({"target_host": "localhost"}),
        Operation::EvaluateExpression | Operation::EvaluateInRepl => {
            json!({"expression": "1 + 1"})
        }
        Operation::ParseSyntax => json!({"path": "default.nix"}),
        _ => Value::Object(Map::new()),
    };
    params(op, value)
}

fn no_features() -> ToolConfig {
    ToolConfig {
        experimental_features: Vec::new(),
        ..ToolConfig::default()
    }
}

#[test]
fn every_operation_starts_with_a_configured_program() {
    let config = ToolConfig::default();
    let configured: Vec<&str> = config.programs.entries().iter().map(|(_, p)| *p).collect();

    for op in Operation::ALL {
        let spec = build(&config, &sample_params(op)).unwrap();
        assert_eq!(spec.operation, op);
        assert!(
            configured.contains(&spec.program()),
            "{}: unexpected program {:?}",
            op,
            spec.program()
        );
    }
}

#[test]
fn nix_commands_enable_experimental_features() {
    let spec = build(&ToolConfig::default(), &sample_params(Operation::ShowFlake)).unwrap();
    assert_eq!(
        spec.argv,
        vec![
            "nix",
            "--extra-experimental-features",
            "nix-command flakes",
            "flake",
            "show",
            ".",
            "--json"
        ]
    );
}

#[test]
fn every_command_disables_color() {
    let mut config = ToolConfig::default();
    config
        .environment
        .insert("NIX_PATH".to_string(), "nixpkgs=/tmp/nixpkgs".to_string());

    let spec = build(&config, &sample_params(Operation::LintFiles)).unwrap();
    assert_eq!(spec.env.get("NO_COLOR").map(String::as_str), Some("1"));
    assert_eq!(spec.env.get("TERM").map(String::as_str), Some("dumb"));
    assert_eq!(
        spec.env.get("NIX_PATH").map(String::as_str),
        Some("nixpkgs=/tmp/nixpkgs")
    );
}

#[test]
fn search_uses_default_flake_and_json() {
    let spec = build(
        &no_features(),
        &OperationParams::SearchPackages(SearchPackagesParams {
            query: "ripgrep".to_string(),
            flake: None,
            max_results: None,
        }),
    )
    .unwrap();
    assert_eq!(spec.argv, vec!["nix", "search", "nixpkgs", "ripgrep", "--json"]);
    assert_eq!(spec.shape, OutputShape::JsonCollection);
    assert!(spec.stdin.is_none());
}

#[test]
fn inspect_is_a_single_eval_with_summary() {
    let spec = build(
        &no_features(),
        &OperationParams::InspectPackage(InspectPackageParams {
            name: "hello".to_string(),
            flake: Some("github:NixOS/nixpkgs/nixos-24.05".to_string()),
        }),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec![
            "nix",
            "eval",
            "--json",
            "github:NixOS/nixpkgs/nixos-24.05#hello",
            "--apply",
            INSPECT_SUMMARY_EXPR
        ]
    );
    assert_eq!(spec.shape, OutputShape::JsonRecord);
}

#[test]
fn run_package_forwards_args_after_separator() {
    let spec = build(
        &no_features(),
        &params(
            Operation::RunPackage,
            json!({"package": "cowsay", "args": ["--help", "moo; rm -rf /"]}),
        ),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec!["nix", "run", "nixpkgs#cowsay", "--", "--help", "moo; rm -rf /"]
    );
}

#[test]
fn enter_shell_resolves_bare_names_and_defaults_command() {
    let spec = build(
        &no_features(),
        &OperationParams::EnterShell(EnterShellParams {
            packages: vec!["git".to_string(), "github:me/tools#fmt".to_string()],
            command: Vec::new(),
        }),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec![
            "nix",
            "shell",
            "nixpkgs#git",
            "github:me/tools#fmt",
            "--command",
            "true"
        ]
    );
}

#[test]
fn build_prints_out_paths_and_honors_link_flags() {
    let config = no_features();
    let with_link = build(
        &config,
        &OperationParams::BuildTarget(BuildTargetParams {
            target: ".#default".to_string(),
            out_link: Some("out".to_string()),
            no_link: false,
        }),
    )
    .unwrap();
    assert_eq!(
        with_link.argv,
        vec!["nix", "build", ".#default", "--print-out-paths", "--out-link", "out"]
    );
    assert_eq!(with_link.shape, OutputShape::Lines);

    let no_link = build(
        &config,
        &OperationParams::BuildTarget(BuildTargetParams {
            target: ".#default".to_string(),
            out_link: None,
            no_link: true,
        }),
    )
    .unwrap();
    assert!(no_link.argv.contains(&"--no-link".to_string()));
}

#[test]
fn update_passes_inputs_then_flake() {
    let spec = build(
        &no_features(),
        &OperationParams::UpdateFlakeInputs(UpdateFlakeInputsParams {
            flake_ref: None,
            inputs: vec!["nixpkgs".to_string(), "home-manager".to_string()],
        }),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec!["nix", "flake", "update", "nixpkgs", "home-manager", "--flake", "."]
    );
}

#[test]
fn option_search_passes_query_as_argstr() {
    let query = "\" + builtins.readFile /etc/shadow + \"";
    let spec = build(
        &no_features(),
        &OperationParams::SearchSystemOptions(SearchSystemOptionsParams {
            query: query.to_string(),
            max_results: Some(5),
        }),
    )
    .unwrap();

    assert_eq!(spec.argv[..5], ["nix", "eval", "--json", "--impure", "--expr"]);
    assert_eq!(spec.argv[5], OPTION_SEARCH_EXPR);
    assert_eq!(
        spec.argv[6..],
        ["--argstr", "query", query, "--argstr", "limit", "5"]
    );
    assert!(!OPTION_SEARCH_EXPR.contains(query));
}

#[test]
fn local_activation_uses_non_interactive_sudo() {
    let spec = build(
        &no_features(),
        &OperationParams::ApplySystemConfiguration(ApplySystemConfigurationParams {
            target_host: "localhost".to_string(),
            action: RebuildAction::Switch,
            flake: Some(".".to_string()),
            hostname: Some("laptop".to_string()),
            dry_run: false,
        }),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec!["sudo", "-n", "nixos-rebuild", "switch", "--flake", ".#laptop"]
    );
}

#[test]
fn local_activation_without_sudo_when_disabled() {
    let config = ToolConfig {
        use_sudo: false,
        ..no_features()
    };
    let spec = build(&config, &sample_params(Operation::ApplySystemConfiguration)).unwrap();
    assert_eq!(spec.argv, vec!["nixos-rebuild", "switch"]);
}

#[test]
fn dry_run_builds_without_sudo() {
    let spec = build(
        &no_features(),
        &params(
            Operation::ApplySystemConfiguration,
            json!({"target_host": "localhost", "action": "boot", "dry_run": true}),
        ),
    )
    .unwrap();
    assert_eq!(spec.argv, vec!["nixos-rebuild", "dry-build"]);
}

#[test]
fn remote_activation_targets_host() {
    let spec = build(
        &no_features(),
        &params(
            Operation::ApplySystemConfiguration,
            json!({"target_host": "root@web1", "flake": "."}),
        ),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec![
            "nixos-rebuild",
            "switch",
            "--flake",
            ".",
            "--target-host",
            "root@web1",
            "--use-remote-sudo"
        ]
    );
}

#[test]
fn generations_use_profile_path() {
    let spec = build(
        &no_features(),
        &OperationParams::ListSystemGenerations(ListSystemGenerationsParams::default()),
    )
    .unwrap();
    assert_eq!(
        spec.argv,
        vec![
            "nix-env",
            "--list-generations",
            "--profile",
            "/nix/var/nix/profiles/system"
        ]
    );
}

#[test]
fn evaluate_expression_shape_follows_flags() {
    let base = EvaluateExpressionParams {
        expression: "1 + 1".to_string(),
        raw: false,
        json: None,
        impure: false,
    };
    let json_spec = build(
        &no_features(),
        &OperationParams::EvaluateExpression(base.clone()),
    )
    .unwrap();
    assert_eq!(json_spec.argv, vec!["nix", "eval", "--expr", "1 + 1", "--json"]);
    assert_eq!(json_spec.shape, OutputShape::JsonValue);

    let raw_spec = build(
        &no_features(),
        &OperationParams::EvaluateExpression(EvaluateExpressionParams {
            raw: true,
            impure: true,
            ..base
        }),
    )
    .unwrap();
    assert_eq!(
        raw_spec.argv,
        vec!["nix", "eval", "--expr", "1 + 1", "--raw", "--impure"]
    );
    assert_eq!(raw_spec.shape, OutputShape::Text);
}

#[test]
fn repl_feeds_expression_on_stdin() {
    let spec = build(
        &no_features(),
        &OperationParams::EvaluateInRepl(EvaluateInReplParams {
            expression: "pkgs.hello.version".to_string(),
            flake: Some("nixpkgs".to_string()),
        }),
    )
    .unwrap();
    assert_eq!(spec.argv, vec!["nix", "repl", "nixpkgs"]);
    assert_eq!(spec.stdin.as_deref(), Some("pkgs.hello.version\n:q\n"));
}

#[test]
fn only_repl_gets_stdin() {
    let config = ToolConfig::default();
    for op in Operation::ALL {
        let spec = build(&config, &sample_params(op)).unwrap();
        assert_eq!(spec.stdin.is_some(), op == Operation::EvaluateInRepl, "{}", op);
    }
}

#[test]
fn lint_uses_statix_json_output() {
    let spec = build(&no_features(), &sample_params(Operation::LintFiles)).unwrap();
    assert_eq!(spec.argv, vec!["statix", "check", "--format", "json", "."]);
}

#[test]
fn configured_program_paths_are_used() {
    let mut config = no_features();
    config.programs.nix = "/opt/nix/bin/nix".to_string();
    config.programs.nix_instantiate = "/opt/nix/bin/nix-instantiate".to_string();

    let eval = build(&config, &sample_params(Operation::EvaluateExpression)).unwrap();
    assert_eq!(eval.program(), "/opt/nix/bin/nix");
    let parse = build(&config, &sample_params(Operation::ParseSyntax)).unwrap();
    assert_eq!(parse.program(), "/opt/nix/bin/nix-instantiate");
    assert_eq!(parse.args(), ["--parse", "default.nix"]);
}

#[test]
fn invalid_typed_params_are_rejected_before_building() {
    let err = build(
        &ToolConfig::default(),
        &OperationParams::InspectPackage(InspectPackageParams {
            name: "--impure".to_string(),
            flake: None,
        }),
    )
    .unwrap_err();
    assert!(matches!(err, NixkilError::InvalidParameters(_)));
}

#[test]
fn display_quotes_arguments() {
    let spec = build(&no_features(), &sample_params(Operation::EvaluateExpression)).unwrap();
    assert_eq!(spec.display(), "nix eval --expr '1 + 1' --json");
}
