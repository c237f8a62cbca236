//! Tests for CLI command parsing and config overrides.

use super::{BuildArgs, Command, get_command, get_flags};
use crate::compiler_frontend::Flag;
use crate::projects::settings::CONFIG_FILE_NAME;
use std::fs;
use std::path::PathBuf;

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn build_command_uses_defaults() {
    let command = get_command(&args(&["build", "src"])).expect("command should parse");

    assert_eq!(
        command,
        Command::Build(BuildArgs {
            path: String::from("src"),
            ..BuildArgs::default()
        })
    );
}

#[test]
fn build_command_parses_every_flag_in_any_order() {
    let command = get_command(&args(&[
        "build",
        "--skip",
        "Legacy",
        "src",
        "--out",
        "dist",
        "--throw",
        "--skip",
        "Modal",
        "--skip-mutating",
        "--config",
        "custom.toml",
        "--hide-timers",
    ]))
    .expect("command should parse");

    assert_eq!(
        command,
        Command::Build(BuildArgs {
            path: String::from("src"),
            out_dir: Some(String::from("dist")),
            config: Some(String::from("custom.toml")),
            throw_on_failure: true,
            skip_components: vec![String::from("Legacy"), String::from("Modal")],
            skip_mutating: true,
        })
    );
}

#[test]
fn check_and_watch_share_the_build_flags() {
    let check = get_command(&args(&["check", "app", "--skip-mutating"])).expect("check should parse");
    let watch = get_command(&args(&["watch", "app", "--out", "build"])).expect("watch should parse");

    assert!(matches!(check, Command::Check(BuildArgs { skip_mutating: true, .. })));
    assert!(matches!(watch, Command::Watch(BuildArgs { out_dir: Some(_), .. })));
}

#[test]
fn build_command_rejects_bad_input() {
    let unknown = get_command(&args(&["build", "src", "--wat"])).expect_err("unknown flag should fail");
    assert!(unknown.contains("Unknown flag"));

    let missing = get_command(&args(&["build", "src", "--out"])).expect_err("missing value should fail");
    assert!(missing.contains("Missing value for --out"));

    let flag_as_value =
        get_command(&args(&["build", "--skip", "--throw"])).expect_err("a flag is not a value");
    assert!(flag_as_value.contains("Missing value for --skip"));

    let two_paths = get_command(&args(&["build", "a", "b"])).expect_err("two paths should fail");
    assert!(two_paths.contains("Only one input path"));
}

#[test]
fn graph_command_parses_component_and_json() {
    let command = get_command(&args(&["graph", "App.jsx", "--json", "--component", "Counter"]))
        .expect("command should parse");

    assert_eq!(
        command,
        Command::Graph {
            path: String::from("App.jsx"),
            component: Some(String::from("Counter")),
            json: true,
        }
    );

    let missing = get_command(&args(&["graph", "--json"])).expect_err("a file is required");
    assert!(missing.contains("needs a file"));
}

#[test]
fn runtime_and_help_commands() {
    assert_eq!(
        get_command(&args(&["runtime", "vendor/runtime.js"])),
        Ok(Command::Runtime(String::from("vendor/runtime.js")))
    );
    assert!(get_command(&args(&["runtime"])).is_err());
    assert_eq!(get_command(&args(&["help"])), Ok(Command::Help));
    assert!(
        get_command(&args(&["serve"]))
            .expect_err("unknown command should fail")
            .contains("Invalid command: 'serve'")
    );
}

#[test]
fn global_flags_are_collected_from_anywhere() {
    let flags = get_flags(&args(&["unforget", "build", "--hide-timers", "src", "--hide-warnings"]));

    assert_eq!(flags, vec![Flag::DisableTimers, Flag::DisableWarnings]);
}

#[test]
fn command_line_overrides_the_config_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[transform]\nskip_components = [\"Legacy\"]\n\n[output]\nout_dir = \"build\"\n",
    )
    .expect("config should be written");

    let build_args = BuildArgs {
        path: dir.path().to_string_lossy().to_string(),
        out_dir: Some(String::from("dist")),
        throw_on_failure: true,
        skip_components: vec![String::from("Modal")],
        ..BuildArgs::default()
    };
    let config = build_args.load_config().expect("config should load");

    assert_eq!(config.output.out_dir, PathBuf::from("dist"));
    assert!(config.transform.throw_on_failure);
    assert!(!config.transform.skip_components_with_mutation);
    assert_eq!(config.transform.skip_components, vec!["Legacy", "Modal"]);
}

#[test]
fn empty_paths_mean_the_current_directory() {
    assert_eq!(BuildArgs::default().entry_path(), PathBuf::from("."));
}
