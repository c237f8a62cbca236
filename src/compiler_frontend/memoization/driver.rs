//! Runs the memoization passes over every component of a program.
//!
//! Components are processed one at a time, in source order. Each one is either
//! transformed completely or left exactly as it was.

use crate::compiler_frontend::analysis::hook_calls::HookPredicate;
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{ImportDecl, ImportSpecifier, StmtKind};
use crate::compiler_frontend::compiler_messages::compiler_errors::{CompilerError, ErrorMetaDataKey};
use crate::compiler_frontend::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::find_components::{ComponentCandidate, find_components};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::projects::settings::{CREATE_CACHE_EXPORT, DEFAULT_HOOK_PREFIX, RUNTIME_MODULE};
use crate::segment_log;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    pub throw_on_failure: bool,
    pub skip_components: Vec<String>,
    pub skip_components_with_mutation: bool,
    pub hook_prefixes: Vec<String>,
    pub runtime_module: String,
    pub create_cache_export: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            throw_on_failure: false,
            skip_components: Vec::new(),
            skip_components_with_mutation: false,
            hook_prefixes: vec![String::from(DEFAULT_HOOK_PREFIX)],
            runtime_module: String::from(RUNTIME_MODULE),
            create_cache_export: String::from(CREATE_CACHE_EXPORT),
        }
    }
}

impl TransformOptions {
    pub fn hook_predicate(&self) -> HookPredicate {
        HookPredicate::new(self.hook_prefixes.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformedComponent {
    pub name: String,
    pub slots: usize,
}

#[derive(Debug, Clone)]
pub struct SkippedComponent {
    pub name: String,
    pub kind: WarningKind,
    pub reason: String,
    pub location: TextLocation,
}

#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    pub transformed: Vec<TransformedComponent>,
    pub skipped: Vec<SkippedComponent>,
}

impl TransformReport {
    pub fn warnings(&self, file_path: &Path) -> Vec<CompilerWarning> {
        self.skipped
            .iter()
            .map(|skipped| {
                CompilerWarning::new(
                    format!("Component '{}' was left unchanged: {}", skipped.name, skipped.reason),
                    skipped.location,
                    skipped.kind.clone(),
                    file_path.to_path_buf(),
                )
            })
            .collect()
    }
}

enum Outcome {
    Transformed(usize),
    Skipped(WarningKind, String),
}

pub fn transform_program(ast: &mut Ast, options: &TransformOptions) -> Result<TransformReport, CompilerError> {
    let hooks = options.hook_predicate();
    let mut report = TransformReport::default();

    for candidate in find_components(ast, &hooks) {
        let location = ast.location(candidate.statement);

        if options.skip_components.contains(&candidate.name) {
            report.skipped.push(SkippedComponent {
                name: candidate.name,
                kind: WarningKind::ComponentSkippedByConfig,
                reason: String::from("listed in skip_components"),
                location,
            });
            continue;
        }

        let snapshot = ast.clone();

        match transform_component(ast, &candidate, options, &hooks) {
            Ok(Outcome::Transformed(slots)) => {
                ast.changed.insert(candidate.statement);
                segment_log!(Green "Memoized ", candidate.name, " using ", #slots, " slots");
                report.transformed.push(TransformedComponent {
                    name: candidate.name,
                    slots,
                });
            }

            Ok(Outcome::Skipped(kind, reason)) => {
                *ast = snapshot;
                report.skipped.push(SkippedComponent {
                    name: candidate.name,
                    kind,
                    reason,
                    location,
                });
            }

            Err(error) => {
                if options.throw_on_failure {
                    return Err(error.with_metadata(ErrorMetaDataKey::ComponentName, candidate.name));
                }

                *ast = snapshot;
                report.skipped.push(SkippedComponent {
                    name: candidate.name,
                    kind: WarningKind::ComponentSkippedOnError,
                    reason: error.msg,
                    location,
                });
            }
        }
    }

    if !report.transformed.is_empty() {
        add_runtime_import(ast, options);
    }

    Ok(report)
}

fn transform_component(
    ast: &mut Ast,
    candidate: &ComponentCandidate,
    options: &TransformOptions,
    hooks: &HookPredicate,
) -> Result<Outcome, CompilerError> {
    let component = analyze_component(ast, candidate, hooks)?;

    if options.skip_components_with_mutation && component.mutates_locals() {
        return Ok(Outcome::Skipped(
            WarningKind::ComponentSkippedWithMutation,
            String::from("it mutates a local variable"),
        ));
    }

    if component.slot_count() == 0 {
        return Ok(Outcome::Skipped(
            WarningKind::NothingToMemoize,
            String::from("nothing in it can be cached"),
        ));
    }

    component.apply_transformation(ast, &options.create_cache_export)?;
    Ok(Outcome::Transformed(component.slot_count()))
}

/// Analyses and plans one component without rewriting it.
/// The tree is still normalised (patterns unwrapped, JSX hoisted) along the way.
pub fn analyze_component(
    ast: &mut Ast,
    candidate: &ComponentCandidate,
    hooks: &HookPredicate,
) -> Result<Component, CompilerError> {
    let mut component = Component::new(ast, &candidate.name, candidate.function, hooks.clone())?;
    component.analyze(ast)?;
    component.plan_recomputation(ast)?;
    Ok(component)
}

/// `import { useCreateCache$unforget } from "@react-unforget/runtime";` at the top of the file.
fn add_runtime_import(ast: &mut Ast, options: &TransformOptions) {
    let import = ast.add_statement(
        StmtKind::Import(ImportDecl {
            specifiers: vec![ImportSpecifier::Named {
                imported: options.create_cache_export.clone(),
                local: options.create_cache_export.clone(),
            }],
            source: options.runtime_module.clone(),
        }),
        TextLocation::default(),
    );
    ast.body.insert(0, import);
    ast.changed.insert(import);
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
