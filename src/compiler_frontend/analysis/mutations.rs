//! Mutation and alias finders.
//!
//! A mutation is anything that can change the value held by a binding after its
//! declaration: assignments, updates, `delete`, and calls to known mutating methods
//! on a member chain. Aliases record which bindings may hold the same object, so
//! `const y = x; y.push(1)` counts as a mutation of `x` as well.

use crate::compiler_frontend::analysis::scope::{
    BindingSite, Resolution, TreeIndex, function_local_names, resolve_name,
};
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    AssignOperator, Expr, ForHead, FunctionId, LogicalOperator, MemberProp, ObjectPatternProp,
    Pattern, StmtId, StmtKind, UnaryOperator,
};
use crate::compiler_frontend::ast::visit::{Visitor, walk_expression, walk_function, walk_statement_header};
use crate::projects::settings::MUTATING_METHODS;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub name: String,
    pub statement: StmtId,
}

/// Mutations anywhere inside the statement, each tagged with its innermost statement.
pub fn subtree_mutations(ast: &Ast, id: StmtId) -> Vec<Mutation> {
    let mut finder = MutationFinder::new(id);
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        finder.collect_header(ast, current);
        let children = ast.child_statements(current);
        stack.extend(children.into_iter().rev());
    }
    finder.mutations
}

struct MutationFinder {
    statement: StmtId,
    mutations: Vec<Mutation>,
    shadowed: Vec<FxHashSet<String>>,
}

impl MutationFinder {
    fn new(statement: StmtId) -> Self {
        MutationFinder {
            statement,
            mutations: Vec::new(),
            shadowed: Vec::new(),
        }
    }

    fn collect_header(&mut self, ast: &Ast, id: StmtId) {
        self.statement = id;
        if let StmtKind::ForIn {
            left: ForHead::Pattern(target),
            ..
        }
        | StmtKind::ForOf {
            left: ForHead::Pattern(target),
            ..
        } = ast.kind(id)
        {
            self.record_target(target);
        }
        walk_statement_header(self, ast, id);
    }

    fn record(&mut self, name: &str) {
        if self.shadowed.iter().any(|names| names.contains(name)) {
            return;
        }
        self.mutations.push(Mutation {
            name: name.to_owned(),
            statement: self.statement,
        });
    }

    fn record_target(&mut self, target: &Pattern) {
        match target {
            Pattern::Identifier(name) => self.record(name),
            Pattern::Expression(expression) => {
                if let Some(root) = member_root(expression) {
                    self.record(root);
                }
            }
            Pattern::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.record_target(element);
                }
            }
            Pattern::Object(props) => {
                for prop in props {
                    match prop {
                        ObjectPatternProp::KeyValue { value, .. } => self.record_target(value),
                        ObjectPatternProp::Rest(rest) => self.record_target(rest),
                    }
                }
            }
            Pattern::Default { target, .. } | Pattern::Rest(target) => self.record_target(target),
        }
    }
}

impl Visitor for MutationFinder {
    fn visit_expression(&mut self, ast: &Ast, expression: &Expr) {
        match expression {
            Expr::Assign { target, .. } => self.record_target(target),

            Expr::Update { argument, .. }
            | Expr::Unary {
                operator: UnaryOperator::Delete,
                argument,
            } => {
                if let Some(root) = member_root(argument) {
                    self.record(root);
                }
            }

            Expr::Call { callee, .. } => {
                if let Expr::Member {
                    object,
                    property: MemberProp::Identifier(method),
                    ..
                } = callee.as_ref()
                    && MUTATING_METHODS.contains(&method.as_str())
                    && let Some(root) = member_root(object)
                {
                    self.record(root);
                }
            }

            _ => {}
        }

        walk_expression(self, ast, expression);
    }

    fn visit_function(&mut self, ast: &Ast, id: FunctionId) {
        self.shadowed.push(function_local_names(ast, id));
        walk_function(self, ast, id);
        self.shadowed.pop();
    }
}

/// The identifier a member chain starts from: `a` for `a.b[c].d`.
pub fn member_root(expression: &Expr) -> Option<&str> {
    match expression {
        Expr::Identifier(name) => Some(name),
        Expr::Member { object, .. } => member_root(object),
        _ => None,
    }
}

/// Names whose value an expression may evaluate to.
pub fn alias_roots(expression: &Expr, roots: &mut Vec<String>) {
    match expression {
        Expr::Identifier(name) => roots.push(name.clone()),
        Expr::Member { .. } => {
            if let Some(root) = member_root(expression) {
                roots.push(root.to_owned());
            }
        }
        Expr::Conditional {
            consequent,
            alternate,
            ..
        } => {
            alias_roots(consequent, roots);
            alias_roots(alternate, roots);
        }
        Expr::Logical {
            operator: LogicalOperator::And,
            right,
            ..
        } => alias_roots(right, roots),
        Expr::Logical { left, right, .. } => {
            alias_roots(left, roots);
            alias_roots(right, roots);
        }
        Expr::Sequence(expressions) => {
            if let Some(last) = expressions.last() {
                alias_roots(last, roots);
            }
        }
        Expr::Assign {
            operator: AssignOperator::Assign,
            value,
            ..
        } => alias_roots(value, roots),
        Expr::Annotated { expression, .. } => alias_roots(expression, roots),
        _ => {}
    }
}

/// Which bindings may hold the same object as which, across one function.
/// Aliasing is symmetric: after `const y = x`, mutating either one changes both.
#[derive(Debug, Default)]
pub struct AliasGraph {
    edges: FxHashMap<BindingSite, FxHashSet<BindingSite>>,
}

impl AliasGraph {
    pub fn build(ast: &Ast, index: &TreeIndex) -> AliasGraph {
        let mut graph = AliasGraph::default();

        for &statement in index.statements() {
            let mut pairs: Vec<(String, Vec<String>)> = Vec::new();

            match ast.kind(statement) {
                StmtKind::VarDecl(declaration) => {
                    for declarator in &declaration.declarators {
                        if let (Pattern::Identifier(name), Some(init)) =
                            (&declarator.target, &declarator.init)
                        {
                            let mut roots = Vec::new();
                            alias_roots(init, &mut roots);
                            pairs.push((name.clone(), roots));
                        }
                    }
                }
                StmtKind::Expression(expression) => collect_assignment_aliases(expression, &mut pairs),
                _ => {}
            }

            for (name, roots) in pairs {
                let Resolution::Local(alias) = resolve_name(ast, index, statement, &name) else {
                    continue;
                };
                for root in roots {
                    if let Resolution::Local(target) = resolve_name(ast, index, statement, &root)
                        && target != alias
                    {
                        graph.edges.entry(alias).or_default().insert(target);
                        graph.edges.entry(target).or_default().insert(alias);
                    }
                }
            }
        }

        graph
    }

    /// The site itself and every site that may share its value, transitively.
    pub fn expand(&self, site: BindingSite) -> Vec<BindingSite> {
        let mut seen = vec![site];
        let mut stack = vec![site];
        while let Some(current) = stack.pop() {
            if let Some(targets) = self.edges.get(&current) {
                for target in targets {
                    if !seen.contains(target) {
                        seen.push(*target);
                        stack.push(*target);
                    }
                }
            }
        }
        seen
    }
}

fn collect_assignment_aliases(expression: &Expr, pairs: &mut Vec<(String, Vec<String>)>) {
    match expression {
        Expr::Assign {
            operator: AssignOperator::Assign,
            target,
            value,
        } => {
            if let Pattern::Identifier(name) = target.as_ref() {
                let mut roots = Vec::new();
                alias_roots(value, &mut roots);
                pairs.push((name.clone(), roots));
            }
            collect_assignment_aliases(value, pairs);
        }
        Expr::Sequence(expressions) => {
            for inner in expressions {
                collect_assignment_aliases(inner, pairs);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "tests/mutations_tests.rs"]
mod tests;
