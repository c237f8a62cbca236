//! Builds a single file or a whole source tree.
//!
//! Every file is independent, so files are compiled in parallel. Components inside one
//! file are still processed one after another by the driver. Outputs mirror the layout
//! of the input tree under the output directory.

use crate::compiler_frontend::Flag;
use crate::compiler_frontend::CompilerFrontend;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::memoization::driver::{TransformOptions, TransformedComponent, analyze_component};
use crate::compiler_frontend::memoization::find_components::find_components;
use crate::compiler_frontend::memoization::graph_display::{component_graph_snapshot, mermaid_graph_from_component};
use crate::projects::settings::{Config, SRC_TO_TOKEN_RATIO};
use crate::{return_messages_with_err, timer_log};
use rayon::prelude::*;
use saying::say;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct InputFile {
    pub source_code: String,
    pub source_path: PathBuf,

    // Path below the build root, reused below the output directory
    pub relative_path: PathBuf,
}

pub struct OutputFile {
    pub full_file_path: PathBuf,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub source_path: PathBuf,
    pub transformed: Vec<TransformedComponent>,
    pub skipped: Vec<String>,
}

pub struct BuildResult {
    pub output_files: Vec<OutputFile>,
    pub reports: Vec<FileReport>,
    pub messages: CompilerMessages,
}

impl BuildResult {
    pub fn transformed_count(&self) -> usize {
        self.reports.iter().map(|report| report.transformed.len()).sum()
    }
}

/// The directory relative paths are resolved against: the input itself or its parent.
pub fn build_root(entry_path: &Path) -> PathBuf {
    if entry_path.is_dir() {
        entry_path.to_path_buf()
    } else {
        entry_path.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

pub fn output_dir(entry_path: &Path, config: &Config) -> PathBuf {
    if config.output.out_dir.is_absolute() {
        config.output.out_dir.clone()
    } else {
        build_root(entry_path).join(&config.output.out_dir)
    }
}

/// Every source file below the entry path the config accepts, skipping the output
/// directory and hidden directories. A single file is returned as is.
pub fn collect_input_files(entry_path: &Path, config: &Config) -> Result<Vec<InputFile>, CompilerError> {
    if !entry_path.exists() {
        return Err(CompilerError::file_error(entry_path, "Path does not exist"));
    }

    if entry_path.is_file() {
        let relative_path = PathBuf::from(entry_path.file_name().unwrap_or_default());
        return Ok(vec![read_input_file(entry_path, relative_path)?]);
    }

    let out_dir = output_dir(entry_path, config);
    let mut files = Vec::new();
    let mut stack = vec![entry_path.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(&dir)
            .map_err(|e| CompilerError::file_error(&dir, format!("Could not read directory: {e}")))?;

        for entry in entries {
            let path = entry
                .map_err(|e| CompilerError::file_error(&dir, format!("Could not read directory entry: {e}")))?
                .path();

            if path.starts_with(&out_dir) || is_hidden_or_dependency(&path) {
                continue;
            }

            if path.is_dir() {
                stack.push(path);
            } else if config.accepts_file(&path) {
                let relative_path = path.strip_prefix(entry_path).unwrap_or(&path).to_path_buf();
                files.push(read_input_file(&path, relative_path)?);
            }
        }
    }

    // Directory order is not stable across platforms
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn is_hidden_or_dependency(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('.') || name == "node_modules")
}

fn read_input_file(path: &Path, relative_path: PathBuf) -> Result<InputFile, CompilerError> {
    let source_code =
        fs::read_to_string(path).map_err(|e| CompilerError::file_error(path, format!("Could not read file: {e}")))?;

    Ok(InputFile {
        source_code,
        source_path: path.to_path_buf(),
        relative_path,
    })
}

/// Tokenize, parse, memoize and print one file.
pub fn compile_file(
    input: &InputFile,
    options: &TransformOptions,
) -> Result<(String, FileReport, CompilerMessages), CompilerError> {
    let frontend = CompilerFrontend::new(options);

    let tokens = frontend.source_to_tokens(&input.source_code, &input.source_path)?;
    let mut ast = frontend.tokens_to_ast(tokens, &input.source_path)?;
    let transform_report = frontend.memoize(&mut ast, &input.source_path)?;
    let code = frontend.ast_to_js(&ast, &input.source_code);

    let messages = CompilerMessages {
        errors: Vec::new(),
        warnings: transform_report.warnings(&input.source_path),
    };

    let report = FileReport {
        source_path: input.source_path.clone(),
        skipped: transform_report
            .skipped
            .iter()
            .map(|skipped| skipped.name.clone())
            .collect(),
        transformed: transform_report.transformed,
    };

    Ok((code, report, messages))
}

pub fn build_project(entry_path: &Path, config: &Config, flags: &[Flag]) -> BuildResult {
    let start = Instant::now();
    let mut result = BuildResult {
        output_files: Vec::new(),
        reports: Vec::new(),
        messages: CompilerMessages::new(),
    };

    let files = match collect_input_files(entry_path, config) {
        Ok(files) => files,
        Err(e) => {
            result.messages.errors.push(e);
            return result;
        }
    };

    let source_bytes: usize = files.iter().map(|file| file.source_code.len()).sum();
    let estimated_tokens = source_bytes / SRC_TO_TOKEN_RATIO;
    timer_log!(start, "Collected source files in: ");
    say!("\nCompiling ", Blue files.len(), Reset " files (~", estimated_tokens, " tokens)");

    let options = config.transform_options();
    let out_dir = output_dir(entry_path, config);
    let time = Instant::now();

    let compiled: Vec<_> = files
        .par_iter()
        .map(|file| (file, compile_file(file, &options)))
        .collect();

    timer_log!(time, "Memoized all files in: ");

    for (file, outcome) in compiled {
        match outcome {
            Ok((code, report, messages)) => {
                if !flags.contains(&Flag::CheckOnly) {
                    result.output_files.push(OutputFile {
                        full_file_path: out_dir.join(&file.relative_path),
                        code,
                    });
                }
                result.reports.push(report);
                result.messages.extend(messages);
            }
            Err(e) => result.messages.errors.push(e),
        }
    }

    if flags.contains(&Flag::DisableWarnings) {
        result.messages.warnings.clear();
    }

    if !flags.contains(&Flag::DisableTimers) {
        say!(
            "\nMemoized ",
            Blue result.transformed_count(),
            Reset " components in: ",
            Green Bold #start.elapsed()
        );
    }

    result
}

/// Writes every output file, creating parent directories as needed.
pub fn write_outputs(output_files: &[OutputFile]) -> CompilerMessages {
    let mut messages = CompilerMessages::new();

    for output_file in output_files {
        // Writing to an empty path would land in the working directory
        if output_file.full_file_path == PathBuf::new() {
            let err = CompilerError::new_compiler_error("Output file did not have a path set");
            return_messages_with_err!(messages, err);
        }

        if let Some(parent) = output_file.full_file_path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            let err = CompilerError::file_error(parent, format!("Could not create output directory: {e}"));
            return_messages_with_err!(messages, err);
        }

        if let Err(e) = fs::write(&output_file.full_file_path, &output_file.code) {
            let err = CompilerError::file_error(&output_file.full_file_path, format!("Error writing file: {e}"));
            return_messages_with_err!(messages, err);
        }
    }

    messages
}

/// Mermaid graphs (or JSON snapshots) of the components in one file.
/// Nothing is transformed, but the tree is normalised the same way a build would.
pub fn render_component_graphs(
    path: &Path,
    config: &Config,
    only_component: Option<&str>,
    json: bool,
) -> Result<String, CompilerError> {
    let input = read_input_file(path, PathBuf::from(path.file_name().unwrap_or_default()))?;
    let options = config.transform_options();
    let frontend = CompilerFrontend::new(&options);
    let hooks = options.hook_predicate();

    let tokens = frontend.source_to_tokens(&input.source_code, path)?;
    let mut ast = frontend.tokens_to_ast(tokens, path)?;

    let mut out = String::new();
    let mut snapshots = Vec::new();

    for candidate in find_components(&ast, &hooks) {
        if only_component.is_some_and(|name| name != candidate.name) {
            continue;
        }

        let component = analyze_component(&mut ast, &candidate, &hooks).map_err(|e| e.with_file_path(path))?;

        if json {
            snapshots.push(component_graph_snapshot(&ast, &component));
        } else {
            out.push_str(&format!("%% {}\n", candidate.name));
            out.push_str(&mermaid_graph_from_component(&ast, &component));
        }
    }

    if out.is_empty() && snapshots.is_empty() {
        return Err(CompilerError::file_error(path, match only_component {
            Some(name) => format!("No component named '{name}' was found"),
            None => String::from("No components were found"),
        }));
    }

    if json {
        out = serde_json::to_string_pretty(&snapshots)
            .map_err(|e| CompilerError::new_compiler_error(format!("Could not serialise the graph: {e}")))?;
    }

    Ok(out)
}

#[cfg(test)]
#[path = "tests/build_tests.rs"]
mod tests;
