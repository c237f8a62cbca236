//! Command-line entrypoints for the unforget compiler.
//!
//! This module parses CLI commands and dispatches them into build, check, graph, watch and
//! runtime workflows.

use crate::build_system::build;
use crate::compiler_frontend::Flag;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::display_messages::{print_compiler_messages, relative_display_path};
use crate::projects::runtime_module::{runtime_import_hint, write_runtime_module};
use crate::projects::settings::Config;
use crate::projects::watch::watch_project;
use saying::say;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Transforms a file or directory tree into the output directory
    Build(BuildArgs),

    // Same analysis as a build, reports what would happen and writes nothing
    Check(BuildArgs),

    Graph {
        path: String,
        component: Option<String>,
        json: bool,
    },

    Watch(BuildArgs),

    // Writes the reference cache runtime
    Runtime(String),

    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BuildArgs {
    path: String,
    out_dir: Option<String>,
    config: Option<String>,
    throw_on_failure: bool,
    skip_components: Vec<String>,
    skip_mutating: bool,
}

impl BuildArgs {
    fn entry_path(&self) -> PathBuf {
        if self.path.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.path)
        }
    }

    /// The config file with every command line override applied on top.
    fn load_config(&self) -> Result<Config, CompilerError> {
        let mut config = Config::load(&self.entry_path(), self.config.as_deref().map(Path::new))?;

        if let Some(out_dir) = &self.out_dir {
            config.output.out_dir = PathBuf::from(out_dir);
        }
        if self.throw_on_failure {
            config.transform.throw_on_failure = true;
        }
        if self.skip_mutating {
            config.transform.skip_components_with_mutation = true;
        }
        config
            .transform
            .skip_components
            .extend(self.skip_components.iter().cloned());

        Ok(config)
    }
}

pub fn start_cli() {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help(false);
        return;
    }

    let command = match get_command(&compiler_args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return;
        }
    };

    let flags = get_flags(&compiler_args);

    match command {
        Command::Help => print_help(false),

        Command::Build(args) => {
            let config = match args.load_config() {
                Ok(config) => config,
                Err(e) => return print_compiler_messages(CompilerMessages::from_error(e)),
            };

            let result = build::build_project(&args.entry_path(), &config, &flags);
            let mut messages = result.messages;
            messages.extend(build::write_outputs(&result.output_files));

            if !messages.has_errors() {
                let out_dir = build::output_dir(&args.entry_path(), &config);
                say!(
                    "Wrote ",
                    Blue result.output_files.len(),
                    Reset " files to ",
                    Dark Magenta relative_display_path(&out_dir)
                );
            }
            print_compiler_messages(messages);
        }

        Command::Check(args) => {
            let config = match args.load_config() {
                Ok(config) => config,
                Err(e) => return print_compiler_messages(CompilerMessages::from_error(e)),
            };

            let mut check_flags = flags.clone();
            check_flags.push(Flag::CheckOnly);
            let result = build::build_project(&args.entry_path(), &config, &check_flags);

            for report in &result.reports {
                say!(Bold relative_display_path(&report.source_path));
                for component in &report.transformed {
                    say!(Green "  memoized ", component.name.to_owned(), Reset " (", component.slots, " slots)");
                }
                for name in &report.skipped {
                    say!(Yellow "  skipped ", name.to_owned());
                }
            }
            print_compiler_messages(result.messages);
        }

        Command::Graph { path, component, json } => {
            let path = PathBuf::from(path);
            let config = match Config::load(&path, None) {
                Ok(config) => config,
                Err(e) => return print_compiler_messages(CompilerMessages::from_error(e)),
            };

            match build::render_component_graphs(&path, &config, component.as_deref(), json) {
                Ok(graph) => println!("{graph}"),
                Err(e) => print_compiler_messages(CompilerMessages::from_error(e)),
            }
        }

        Command::Watch(args) => {
            let config = match args.load_config() {
                Ok(config) => config,
                Err(e) => return print_compiler_messages(CompilerMessages::from_error(e)),
            };

            if let Err(messages) = watch_project(&args.entry_path(), &config, &flags) {
                print_compiler_messages(messages);
            }
        }

        Command::Runtime(path) => match write_runtime_module(Path::new(&path)) {
            Ok(()) => {
                say!(Green "Wrote the cache runtime to ", Dark Magenta path);
                say!("Point generated imports at it, or keep the default: ", runtime_import_hint());
            }
            Err(e) => print_compiler_messages(CompilerMessages::from_error(e)),
        },
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | Some("--help") => Ok(Command::Help),
        Some("build") => parse_build_args(args).map(Command::Build),
        Some("check") => parse_build_args(args).map(Command::Check),
        Some("watch") => parse_build_args(args).map(Command::Watch),
        Some("graph") => parse_graph_command(args),
        Some("runtime") => match args.get(1) {
            Some(path) if !path.starts_with("--") => Ok(Command::Runtime(path.to_owned())),
            _ => Err(String::from("The runtime command needs an output file")),
        },
        Some(other) => Err(format!("Invalid command: '{other}'")),
        None => Ok(Command::Help),
    }
}

fn get_flags(args: &[String]) -> Vec<Flag> {
    let mut flags = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--hide-warnings" => flags.push(Flag::DisableWarnings),
            "--hide-timers" => flags.push(Flag::DisableTimers),
            _ => {}
        }
    }

    flags
}

/// Value following a flag, rejecting another flag in its place.
fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    match args.get(index + 1) {
        Some(value) if !value.starts_with("--") => Ok(value),
        _ => Err(format!("Missing value for {flag}")),
    }
}

fn parse_build_args(args: &[String]) -> Result<BuildArgs, String> {
    let mut build_args = BuildArgs::default();
    let mut index = 1usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--out" => {
                build_args.out_dir = Some(flag_value(args, index, "--out")?.to_owned());
                index += 2;
            }
            "--config" => {
                build_args.config = Some(flag_value(args, index, "--config")?.to_owned());
                index += 2;
            }
            "--skip" => {
                let name = flag_value(args, index, "--skip")?;
                build_args.skip_components.push(name.to_owned());
                index += 2;
            }
            "--throw" => {
                build_args.throw_on_failure = true;
                index += 1;
            }
            "--skip-mutating" => {
                build_args.skip_mutating = true;
                index += 1;
            }
            "--hide-warnings" | "--hide-timers" => {
                index += 1;
            }
            _ if arg.starts_with("--") => {
                return Err(format!(
                    "Unknown flag: '{arg}'. Supported flags are --out, --config, --throw, --skip, --skip-mutating, --hide-warnings, --hide-timers."
                ));
            }
            _ => {
                if build_args.path.is_empty() {
                    build_args.path = arg.to_owned();
                    index += 1;
                } else {
                    return Err(String::from("Only one input path can be given."));
                }
            }
        }
    }

    Ok(build_args)
}

fn parse_graph_command(args: &[String]) -> Result<Command, String> {
    let mut path = String::new();
    let mut component = None;
    let mut json = false;
    let mut index = 1usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--component" => {
                component = Some(flag_value(args, index, "--component")?.to_owned());
                index += 2;
            }
            "--json" => {
                json = true;
                index += 1;
            }
            _ if arg.starts_with("--") => {
                return Err(format!(
                    "Unknown graph flag: '{arg}'. Supported graph flags are --component, --json."
                ));
            }
            _ => {
                if path.is_empty() {
                    path = arg.to_owned();
                    index += 1;
                } else {
                    return Err(String::from("Graph command accepts one file."));
                }
            }
        }
    }

    if path.is_empty() {
        return Err(String::from("The graph command needs a file"));
    }

    Ok(Command::Graph { path, component, json })
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "unforget, a memoizing compiler for React components");
        say!("Usage: ", Bold "<command> ", Italic "<args>");
    }
    say!(Green Bold "\nCommands:");
    say!("  build <path>       - Memoizes a file or directory into the output directory");
    say!("  check <path>       - Reports what a build would memoize without writing");
    say!("  graph <file>       - Prints the segment graph of each component");
    say!("  watch <path>       - Rebuilds whenever a source changes");
    say!("  runtime <file>     - Writes the reference cache runtime");
    say!("  help");

    say!(Green Bold "\nBuild flags:");
    say!("  --out <dir>");
    say!("  --config <file>");
    say!("  --throw");
    say!("  --skip <Component>");
    say!("  --skip-mutating");
    say!("  --hide-warnings");
    say!("  --hide-timers");

    say!("\nGraph flags:");
    say!("  --component <Component>");
    say!("  --json");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
