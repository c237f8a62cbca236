//! Statement tree index and name resolution for one function scope.
//!
//! The AST arena only stores child links, so resolving a name from a statement
//! needs a parent index first. The index covers the statements of one function and
//! stops at nested functions, which have their own scopes.

use crate::compiler_frontend::ast::ast::{Ast, pattern_binding_names, pattern_binds};
use crate::compiler_frontend::ast::ast_nodes::{
    DeclKind, ForHead, ForInit, FunctionBody, FunctionId, StmtId, StmtKind,
};
use crate::compiler_frontend::ast::visit::{Visitor, walk_function};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct TreeIndex {
    function: FunctionId,
    parents: FxHashMap<StmtId, StmtId>,

    // Every indexed statement in pre-order
    order: Vec<StmtId>,
}

impl TreeIndex {
    /// Returns None for a function with an expression body.
    pub fn build(ast: &Ast, function: FunctionId) -> Option<TreeIndex> {
        let root = ast.function_block(function)?;
        let mut index = TreeIndex {
            function,
            parents: FxHashMap::default(),
            order: Vec::new(),
        };

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            index.order.push(current);
            let children = ast.child_statements(current);
            for child in children.iter().rev() {
                index.parents.insert(*child, current);
                stack.push(*child);
            }
        }

        Some(index)
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn parent(&self, id: StmtId) -> Option<StmtId> {
        self.parents.get(&id).copied()
    }

    pub fn statements(&self) -> &[StmtId] {
        &self.order
    }

    /// Parents from the closest outwards, ending at the body block.
    pub fn ancestors(&self, id: StmtId) -> Vec<StmtId> {
        let mut ancestors = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            ancestors.push(parent);
            current = parent;
        }
        ancestors
    }

    /// The statement directly inside `block` that holds `id`, if any.
    pub fn child_of_block(&self, block: StmtId, id: StmtId) -> Option<StmtId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == block {
                return Some(current);
            }
            current = parent;
        }
    }

    /// The closest enclosing statement that is analysed as one opaque unit
    /// (loops, switch and labeled statements).
    pub fn opaque_ancestor(&self, ast: &Ast, id: StmtId) -> Option<StmtId> {
        self.ancestors(id)
            .into_iter()
            .find(|ancestor| is_opaque_statement(ast.kind(*ancestor)))
    }
}

pub fn is_opaque_statement(kind: &StmtKind) -> bool {
    kind.is_loop() || matches!(kind, StmtKind::Switch { .. } | StmtKind::Labeled { .. })
}

/// Where a local name was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingSite {
    Declaration(StmtId),
    Param(usize),
    ForInit(StmtId),
    ForHead(StmtId),
    Catch(StmtId),
}

impl BindingSite {
    /// Only declarations and parameters can own a cache slot.
    pub fn is_trackable(self) -> bool {
        matches!(self, BindingSite::Declaration(_) | BindingSite::Param(_))
    }

    pub fn statement(self) -> Option<StmtId> {
        match self {
            BindingSite::Declaration(id)
            | BindingSite::ForInit(id)
            | BindingSite::ForHead(id)
            | BindingSite::Catch(id) => Some(id),
            BindingSite::Param(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Local(BindingSite),

    // Globals, imports and closure variables from outside the function
    Outer,
}

/// Resolves `name` as seen from statement `from`.
pub fn resolve_name(ast: &Ast, index: &TreeIndex, from: StmtId, name: &str) -> Resolution {
    // A for statement's own header sees its own bindings
    if let Some(site) = loop_head_binding(ast, from, name) {
        return Resolution::Local(site);
    }

    let mut child = from;
    while let Some(parent) = index.parent(child) {
        match ast.kind(parent) {
            StmtKind::Block(statements) => {
                if let Some(declaration) = find_declaration(ast, statements, name) {
                    return Resolution::Local(BindingSite::Declaration(declaration));
                }
            }

            StmtKind::Switch { cases, .. } => {
                let statements: Vec<StmtId> = cases
                    .iter()
                    .flat_map(|case| case.consequent.iter().copied())
                    .collect();
                if let Some(declaration) = find_declaration(ast, &statements, name) {
                    return Resolution::Local(BindingSite::Declaration(declaration));
                }
            }

            StmtKind::Try {
                handler: Some(handler),
                ..
            } if handler.body == child => {
                if handler.param.as_ref().is_some_and(|param| pattern_binds(param, name)) {
                    return Resolution::Local(BindingSite::Catch(parent));
                }
            }

            _ => {
                if let Some(site) = loop_head_binding(ast, parent, name) {
                    return Resolution::Local(site);
                }
            }
        }

        child = parent;
    }

    let function = ast.function(index.function());
    if let Some(position) = function
        .params
        .iter()
        .position(|param| pattern_binds(param, name))
    {
        return Resolution::Local(BindingSite::Param(position));
    }

    // `var` is visible across the whole function
    for &statement in index.statements() {
        match ast.kind(statement) {
            StmtKind::VarDecl(declaration) if declaration.kind == DeclKind::Var => {
                if declaration
                    .declarators
                    .iter()
                    .any(|declarator| pattern_binds(&declarator.target, name))
                {
                    return Resolution::Local(BindingSite::Declaration(statement));
                }
            }
            StmtKind::For { .. } | StmtKind::ForIn { .. } | StmtKind::ForOf { .. } => {
                if let Some(site) = loop_head_binding(ast, statement, name) {
                    return Resolution::Local(site);
                }
            }
            _ => {}
        }
    }

    Resolution::Outer
}

fn find_declaration(ast: &Ast, statements: &[StmtId], name: &str) -> Option<StmtId> {
    statements.iter().copied().find(|statement| match ast.kind(*statement) {
        StmtKind::VarDecl(declaration) => declaration
            .declarators
            .iter()
            .any(|declarator| pattern_binds(&declarator.target, name)),
        StmtKind::FunctionDecl(function) => ast.function(*function).name.as_deref() == Some(name),
        _ => false,
    })
}

fn loop_head_binding(ast: &Ast, statement: StmtId, name: &str) -> Option<BindingSite> {
    match ast.kind(statement) {
        StmtKind::For {
            init: Some(ForInit::VarDecl(declaration)),
            ..
        } => declaration
            .declarators
            .iter()
            .any(|declarator| pattern_binds(&declarator.target, name))
            .then_some(BindingSite::ForInit(statement)),
        StmtKind::ForIn {
            left: ForHead::VarDecl { target, .. },
            ..
        }
        | StmtKind::ForOf {
            left: ForHead::VarDecl { target, .. },
            ..
        } => pattern_binds(target, name).then_some(BindingSite::ForHead(statement)),
        _ => None,
    }
}

/// Names a nested function binds for itself: its own name, parameters and every
/// declaration anywhere in its body. Block scoping inside the nested function is
/// flattened, which can only hide a reference, never invent one.
pub fn function_local_names(ast: &Ast, function: FunctionId) -> FxHashSet<String> {
    struct Declarations<'a> {
        names: &'a mut Vec<String>,
        depth: usize,
    }

    impl Visitor for Declarations<'_> {
        fn visit_statement(&mut self, ast: &Ast, id: StmtId) {
            if self.depth == 0 {
                self.names.extend(ast.declared_names(id));
                self.names.extend(ast.for_head_names(id));
                if let StmtKind::Try {
                    handler: Some(handler),
                    ..
                } = ast.kind(id)
                    && let Some(param) = &handler.param
                {
                    pattern_binding_names(param, self.names);
                }
            }
            crate::compiler_frontend::ast::visit::walk_statement(self, ast, id);
        }

        fn visit_function(&mut self, ast: &Ast, id: FunctionId) {
            self.depth += 1;
            walk_function(self, ast, id);
            self.depth -= 1;
        }
    }

    let mut names = Vec::new();
    let declaration = ast.function(function);
    if let Some(name) = &declaration.name {
        names.push(name.clone());
    }
    for param in &declaration.params {
        pattern_binding_names(param, &mut names);
    }

    if let FunctionBody::Block(block) = declaration.body {
        let mut collector = Declarations {
            names: &mut names,
            depth: 0,
        };
        collector.visit_statement(ast, block);
    }

    names.into_iter().collect()
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
