//! Recognising calls to reactive primitives.
//!
//! A hook is any function whose name is one of the configured prefixes followed by
//! an uppercase letter (`useState`, `useMemo`...). Hook calls are never skipped, so
//! when a callee has no static name the call is treated as a hook.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{Expr, FunctionId, StmtId};
use crate::compiler_frontend::ast::visit::{Visitor, walk_expression, walk_statement_header};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::access_chain::AccessChain;
use crate::projects::settings::DEFAULT_HOOK_PREFIX;

#[derive(Debug, Clone)]
pub struct HookPredicate {
    prefixes: Vec<String>,
}

impl Default for HookPredicate {
    fn default() -> Self {
        HookPredicate::new(vec![String::from(DEFAULT_HOOK_PREFIX)])
    }
}

impl HookPredicate {
    pub fn new(prefixes: Vec<String>) -> Self {
        HookPredicate { prefixes }
    }

    pub fn is_hook_name(&self, name: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            name.strip_prefix(prefix.as_str())
                .and_then(|rest| rest.chars().next())
                .is_some_and(|first| first.is_ascii_uppercase())
        })
    }

    /// Callees without a static name count as hooks.
    pub fn is_hook_call(&self, ast: &Ast, callee: &Expr) -> bool {
        match callee_name(ast, callee) {
            Ok(name) => self.is_hook_name(&name),
            Err(_) => true,
        }
    }

    /// Whether the statement itself calls a hook, outside any closure it creates.
    pub fn statement_calls_hook(&self, ast: &Ast, id: StmtId) -> bool {
        let mut finder = HookCallFinder {
            predicate: self,
            found: false,
        };
        walk_statement_header(&mut finder, ast, id);
        finder.found
    }

    /// Whether the statement or any of its child statements calls a hook.
    pub fn subtree_calls_hook(&self, ast: &Ast, id: StmtId) -> bool {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.statement_calls_hook(ast, current) {
                return true;
            }
            stack.extend(ast.child_statements(current));
        }
        false
    }
}

/// The rightmost name of a callee: `useState` for both `useState(...)` and `React.useState(...)`.
pub fn callee_name(ast: &Ast, callee: &Expr) -> Result<String, CompilerError> {
    let chain = AccessChain::from_expression(ast, callee);
    chain.leftmost_id()?;
    chain.rightmost_id().map(str::to_owned)
}

struct HookCallFinder<'a> {
    predicate: &'a HookPredicate,
    found: bool,
}

impl Visitor for HookCallFinder<'_> {
    fn visit_expression(&mut self, ast: &Ast, expression: &Expr) {
        if self.found {
            return;
        }
        if let Expr::Call { callee, .. } = expression
            && self.predicate.is_hook_call(ast, callee)
        {
            self.found = true;
            return;
        }
        walk_expression(self, ast, expression);
    }

    // Calls inside closures run later, not during the statement
    fn visit_function(&mut self, _ast: &Ast, _id: FunctionId) {}
}

#[cfg(test)]
#[path = "tests/hook_calls_tests.rs"]
mod tests;
