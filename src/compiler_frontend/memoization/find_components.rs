//! Finds the top level functions that look like components or hooks.

use crate::compiler_frontend::analysis::hook_calls::HookPredicate;
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    ExportDecl, Expr, FunctionBody, FunctionId, Pattern, StmtId, StmtKind,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CandidateKind {
    Component,
    Hook,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCandidate {
    pub name: String,
    pub function: FunctionId,
    pub kind: CandidateKind,

    // The top level statement that has to be reprinted once the function changes
    pub statement: StmtId,
}

/// Components and hooks of the program, in source order.
pub fn find_components(ast: &Ast, hooks: &HookPredicate) -> Vec<ComponentCandidate> {
    let mut candidates = Vec::new();

    for &statement in &ast.body {
        for (name, function) in top_level_functions(ast, statement) {
            if let Some(kind) = classify(ast, &name, function, hooks) {
                candidates.push(ComponentCandidate {
                    name,
                    function,
                    kind,
                    statement,
                });
            }
        }
    }

    candidates
}

fn top_level_functions(ast: &Ast, statement: StmtId) -> Vec<(String, FunctionId)> {
    match ast.kind(statement) {
        StmtKind::FunctionDecl(function) => ast
            .function(*function)
            .name
            .clone()
            .map(|name| vec![(name, *function)])
            .unwrap_or_default(),

        StmtKind::VarDecl(declaration) => declaration
            .declarators
            .iter()
            .filter_map(|declarator| match (&declarator.target, &declarator.init) {
                (Pattern::Identifier(name), Some(Expr::Function(function))) => Some((name.clone(), *function)),
                _ => None,
            })
            .collect(),

        StmtKind::Export(ExportDecl::Declaration(inner)) => top_level_functions(ast, *inner),

        StmtKind::Export(ExportDecl::DefaultFunction(function)) => ast
            .function(*function)
            .name
            .clone()
            .map(|name| vec![(name, *function)])
            .unwrap_or_default(),

        _ => Vec::new(),
    }
}

fn classify(ast: &Ast, name: &str, function: FunctionId, hooks: &HookPredicate) -> Option<CandidateKind> {
    let returns = function_returns(ast, function);
    if returns.is_empty() {
        return None;
    }

    if is_component_name(name) {
        let initialisers = jsx_initialised_names(ast, function);
        let renders = returns.iter().all(|returned| match returned {
            Some(expression) => returns_renderable(expression, &initialisers),
            None => false,
        });
        if renders {
            return Some(CandidateKind::Component);
        }
    }

    if hooks.is_hook_name(name) {
        return Some(CandidateKind::Hook);
    }

    None
}

/// `/^_?[A-Z]/`
pub fn is_component_name(name: &str) -> bool {
    name.strip_prefix('_')
        .unwrap_or(name)
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_uppercase())
}

/// The value of every return directly in the function, with an expression body as one return.
fn function_returns(ast: &Ast, function: FunctionId) -> Vec<Option<&Expr>> {
    let body = match &ast.function(function).body {
        FunctionBody::Expression(expression) => return vec![Some(expression.as_ref())],
        FunctionBody::Block(body) => *body,
    };

    let mut returns = Vec::new();
    let mut stack = vec![body];
    while let Some(current) = stack.pop() {
        if let StmtKind::Return(argument) = ast.kind(current) {
            returns.push(argument.as_ref());
        }
        stack.extend(ast.child_statements(current));
    }
    returns
}

fn returns_renderable(expression: &Expr, initialisers: &[String]) -> bool {
    match expression {
        Expr::Null => true,
        expression if expression.is_jsx() => true,
        Expr::Identifier(name) => initialisers.contains(name),
        Expr::Conditional {
            consequent,
            alternate,
            ..
        } => returns_renderable(consequent, initialisers) && returns_renderable(alternate, initialisers),
        _ => false,
    }
}

/// Names declared in the function with JSX or `null` as their initial value.
fn jsx_initialised_names(ast: &Ast, function: FunctionId) -> Vec<String> {
    let Some(body) = ast.function_block(function) else {
        return Vec::new();
    };

    let mut names = Vec::new();
    let mut stack = vec![body];
    while let Some(current) = stack.pop() {
        if let StmtKind::VarDecl(declaration) = ast.kind(current) {
            for declarator in &declaration.declarators {
                if let (Pattern::Identifier(name), Some(init)) = (&declarator.target, &declarator.init)
                    && (init.is_jsx() || matches!(init, Expr::Null))
                {
                    names.push(name.clone());
                }
            }
        }
        stack.extend(ast.child_statements(current));
    }
    names
}

#[cfg(test)]
#[path = "tests/find_components_tests.rs"]
mod tests;
