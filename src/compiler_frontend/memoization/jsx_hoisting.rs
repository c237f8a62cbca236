//! JSX hoisting.
//!
//! Pulls JSX elements and non-trivial `{expression}` containers out of a statement into
//! `const` temporaries right before it, so each one becomes a segment that can be cached
//! on its own:
//!
//! ```js
//! return <div title={format(user)}><Avatar user={user} /></div>;
//! // becomes
//! const _unwrappedJsxExp = format(user);
//! const _unwrappedJsxEl = <Avatar user={user} />;
//! const _unwrappedJsxEl2 = <div title={_unwrappedJsxExp}>{_unwrappedJsxEl}</div>;
//! return _unwrappedJsxEl2;
//! ```
//!
//! Only JSX that the statement always evaluates is hoisted: a returned value, the
//! initialiser of a single declaration or the value of a plain assignment statement.
//! Inside JSX, attributes and children are hoisted in evaluation order, children before
//! their parent element, so the order of side effects does not change. Containers are
//! hoisted whole, so conditional branches and callbacks inside them stay lazy.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    AssignOperator, DeclKind, Expr, JsxAttribute, JsxAttributeValue, JsxChild, Pattern, StmtId,
    StmtKind,
};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::projects::settings::{UNWRAPPED_JSX_ELEMENT, UNWRAPPED_JSX_EXPRESSION};

/// Hoists JSX out of every statement of the block. Returns how many temporaries were created.
pub fn hoist_block_jsx(ast: &mut Ast, block: StmtId) -> usize {
    let mut total = 0;

    for statement in ast.block_statements(block).to_vec() {
        let hoistable = match ast.kind(statement) {
            StmtKind::Return(Some(_)) => true,
            StmtKind::VarDecl(declaration) => declaration.declarators.len() == 1,
            StmtKind::Expression(Expr::Assign {
                operator: AssignOperator::Assign,
                target,
                ..
            }) => matches!(target.as_ref(), Pattern::Identifier(_)),
            _ => false,
        };

        if !hoistable {
            continue;
        }

        let location = ast.location(statement);
        let mut kind = ast.take_statement(statement);
        let mut hoister = JsxHoister {
            ast: &mut *ast,
            location,
            hoisted: Vec::new(),
        };

        match &mut kind {
            StmtKind::Return(Some(argument)) => hoister.hoist_value(argument),
            StmtKind::VarDecl(declaration) => {
                for declarator in &mut declaration.declarators {
                    if let Some(init) = &mut declarator.init {
                        hoister.hoist_inside(init);
                    }
                }
            }
            StmtKind::Expression(Expr::Assign { value, .. }) => hoister.hoist_inside(value),
            _ => {}
        }

        let hoisted = hoister.hoisted;
        ast.replace_statement(statement, kind);

        if !hoisted.is_empty() {
            total += hoisted.len();
            ast.insert_before(block, statement, hoisted);
        }
    }

    total
}

struct JsxHoister<'a> {
    ast: &'a mut Ast,
    location: TextLocation,
    hoisted: Vec<StmtId>,
}

impl JsxHoister<'_> {
    /// Hoists the JSX inside `expression` and then `expression` itself when it is JSX.
    fn hoist_value(&mut self, expression: &mut Expr) {
        if expression.is_jsx() {
            self.hoist_inside(expression);
            self.extract(expression, UNWRAPPED_JSX_ELEMENT);
        }
    }

    fn hoist_inside(&mut self, expression: &mut Expr) {
        match expression {
            Expr::JsxElement(element) => {
                for attribute in &mut element.attributes {
                    match attribute {
                        JsxAttribute::Attribute {
                            value: Some(value), ..
                        } => match value {
                            JsxAttributeValue::Expression(inner) => self.hoist_container(inner),
                            JsxAttributeValue::Element(inner) => {
                                self.hoist_value(inner);
                                let hoisted = std::mem::replace(inner, Expr::Null);
                                *value = JsxAttributeValue::Expression(hoisted);
                            }
                            JsxAttributeValue::String(_) => {}
                        },
                        JsxAttribute::Spread(inner) => self.hoist_container(inner),
                        JsxAttribute::Attribute { value: None, .. } => {}
                    }
                }
                self.hoist_children(&mut element.children);
            }
            Expr::JsxFragment(children) => self.hoist_children(children),
            _ => {}
        }
    }

    fn hoist_children(&mut self, children: &mut [JsxChild]) {
        for child in children {
            match child {
                JsxChild::Expression(inner) | JsxChild::Spread(inner) => self.hoist_container(inner),
                JsxChild::Element(inner) => {
                    self.hoist_value(inner);
                    let hoisted = std::mem::replace(inner, Expr::Null);
                    *child = JsxChild::Expression(hoisted);
                }
                JsxChild::Text(_) | JsxChild::EmptyExpression => {}
            }
        }
    }

    fn hoist_container(&mut self, expression: &mut Expr) {
        if expression.is_jsx() {
            self.hoist_value(expression);
        } else if !expression.is_trivial() {
            self.extract(expression, UNWRAPPED_JSX_EXPRESSION);
        }
    }

    /// Replaces `expression` with a fresh identifier bound to it by a new `const`.
    fn extract(&mut self, expression: &mut Expr, base: &str) {
        let name = self.ast.generate_unique_name(base);
        let value = std::mem::replace(expression, Expr::Identifier(name.clone()));
        let statement = self.ast.variable_declaration(
            DeclKind::Const,
            Pattern::Identifier(name),
            Some(value),
            self.location,
        );
        self.hoisted.push(statement);
    }
}

#[cfg(test)]
#[path = "tests/jsx_hoisting_tests.rs"]
mod tests;
