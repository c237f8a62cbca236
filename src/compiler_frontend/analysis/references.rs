//! Free variable collection.
//!
//! Every read of a name that is not bound inside a nested function is recorded
//! together with the access chain used at the read site and the innermost statement
//! holding it, so the caller can resolve the name from the right scope.

use crate::compiler_frontend::analysis::scope::function_local_names;
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    Expr, ForHead, FunctionId, JsxElement, JsxName, MemberProp, ObjectPatternProp, Pattern,
    PropKey, StmtId, StmtKind, UnaryOperator,
};
use crate::compiler_frontend::ast::visit::{
    Visitor, walk_expression, walk_function, walk_jsx_element, walk_pattern, walk_statement_header,
};
use crate::compiler_frontend::memoization::access_chain::AccessChain;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub name: String,
    pub chain: AccessChain,
    pub statement: StmtId,
}

/// References made by the statement itself, including inside closures it creates,
/// but not by its child statements.
pub fn statement_references(ast: &Ast, id: StmtId) -> Vec<Reference> {
    let mut collector = ReferenceCollector::new(id);
    collector.collect_header(ast, id);
    collector.references
}

/// References made anywhere inside the statement, each tagged with the innermost
/// statement it appears in.
pub fn subtree_references(ast: &Ast, id: StmtId) -> Vec<Reference> {
    let mut collector = ReferenceCollector::new(id);
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        collector.collect_header(ast, current);
        let children = ast.child_statements(current);
        stack.extend(children.into_iter().rev());
    }
    collector.references
}

struct ReferenceCollector {
    statement: StmtId,
    references: Vec<Reference>,

    // Names bound by the nested functions currently being walked
    shadowed: Vec<FxHashSet<String>>,
}

impl ReferenceCollector {
    fn new(statement: StmtId) -> Self {
        ReferenceCollector {
            statement,
            references: Vec::new(),
            shadowed: Vec::new(),
        }
    }

    fn collect_header(&mut self, ast: &Ast, id: StmtId) {
        self.statement = id;

        // Assigning to an existing binding in a for-in/of head writes that binding
        if let StmtKind::ForIn {
            left: ForHead::Pattern(target),
            ..
        }
        | StmtKind::ForOf {
            left: ForHead::Pattern(target),
            ..
        } = ast.kind(id)
        {
            self.record_target(ast, target);
        }

        walk_statement_header(self, ast, id);
    }

    fn is_shadowed(&self, name: &str) -> bool {
        self.shadowed.iter().any(|names| names.contains(name))
    }

    fn record(&mut self, chain: AccessChain) {
        let Ok(name) = chain.leftmost_id() else {
            return;
        };

        if self.is_shadowed(name) {
            return;
        }

        self.references.push(Reference {
            name: name.to_owned(),
            chain,
            statement: self.statement,
        });
    }

    /// Assignment targets only read their root.
    fn record_target(&mut self, ast: &Ast, target: &Pattern) {
        match target {
            Pattern::Identifier(name) => self.record(AccessChain::from_identifier(name.clone())),
            Pattern::Expression(expression) => {
                self.record_member_root(ast, expression);
            }
            Pattern::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.record_target(ast, element);
                }
            }
            Pattern::Object(props) => {
                for prop in props {
                    match prop {
                        ObjectPatternProp::KeyValue { key, value, .. } => {
                            if let PropKey::Computed(key) = key {
                                self.visit_expression(ast, key);
                            }
                            self.record_target(ast, value);
                        }
                        ObjectPatternProp::Rest(rest) => self.record_target(ast, rest),
                    }
                }
            }
            Pattern::Default { target, value } => {
                self.record_target(ast, target);
                self.visit_expression(ast, value);
            }
            Pattern::Rest(inner) => self.record_target(ast, inner),
        }
    }

    /// Records only the root of a member expression, then walks its dynamic keys.
    fn record_member_root(&mut self, ast: &Ast, expression: &Expr) {
        let chain = AccessChain::from_expression(ast, expression);
        if chain.leftmost_id().is_ok() {
            self.record(AccessChain::from_identifier(chain.root()));
            self.visit_dynamic_keys(ast, expression);
        } else {
            walk_expression(self, ast, expression);
        }
    }

    fn visit_dynamic_keys(&mut self, ast: &Ast, expression: &Expr) {
        if let Expr::Member {
            object, property, ..
        } = expression
        {
            if let MemberProp::Computed(key) = property {
                self.visit_expression(ast, key);
            }
            self.visit_dynamic_keys(ast, object);
        }
    }
}

impl Visitor for ReferenceCollector {
    fn visit_expression(&mut self, ast: &Ast, expression: &Expr) {
        match expression {
            Expr::Identifier(name) => self.record(AccessChain::from_identifier(name.clone())),

            Expr::Member { .. } => {
                let chain = AccessChain::from_expression(ast, expression);
                if chain.leftmost_id().is_ok() {
                    self.record(chain);
                    self.visit_dynamic_keys(ast, expression);
                } else {
                    walk_expression(self, ast, expression);
                }
            }

            Expr::Call {
                callee, arguments, ..
            } if matches!(callee.as_ref(), Expr::Member { .. }) => {
                let chain = AccessChain::from_expression(ast, callee);
                if chain.leftmost_id().is_ok() {
                    self.record(chain.without_last_link());
                    self.visit_dynamic_keys(ast, callee);
                } else {
                    walk_expression(self, ast, callee);
                }
                for argument in arguments {
                    self.visit_expression(ast, argument);
                }
            }

            Expr::Assign { target, value, .. } => {
                self.record_target(ast, target);
                self.visit_expression(ast, value);
            }

            Expr::Update { argument, .. }
            | Expr::Unary {
                operator: UnaryOperator::Delete,
                argument,
            } => self.record_member_root(ast, argument),

            _ => walk_expression(self, ast, expression),
        }
    }

    fn visit_pattern(&mut self, ast: &Ast, pattern: &Pattern) {
        // Declaration patterns bind names, only their defaults and computed keys read
        walk_pattern(self, ast, pattern);
    }

    fn visit_function(&mut self, ast: &Ast, id: FunctionId) {
        self.shadowed.push(function_local_names(ast, id));
        walk_function(self, ast, id);
        self.shadowed.pop();
    }

    fn visit_jsx_element(&mut self, ast: &Ast, element: &JsxElement) {
        match &element.name {
            JsxName::Identifier(name) if !element.name.is_intrinsic() => {
                self.record(AccessChain::from_identifier(name.clone()));
            }
            JsxName::Member(parts) => {
                if let Some(root) = parts.first() {
                    self.record(AccessChain::from_identifier(root.clone()));
                }
            }
            _ => {}
        }
        walk_jsx_element(self, ast, element);
    }
}

/// Every name read by an expression, ignoring access chains.
pub fn expression_reads(ast: &Ast, expression: &Expr, statement: StmtId) -> Vec<String> {
    let mut collector = ReferenceCollector::new(statement);
    collector.visit_expression(ast, expression);
    collector
        .references
        .into_iter()
        .map(|reference| reference.name)
        .collect()
}

#[cfg(test)]
#[path = "tests/references_tests.rs"]
mod tests;
