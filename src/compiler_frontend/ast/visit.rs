//! Read-only traversal over the arena AST.
//!
//! Implementors override the hooks they care about and call the matching `walk_*`
//! function to keep descending. Statement walks never leave the arena, so nested
//! function bodies are reached through `visit_function`.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    ExportDecl, Expr, ForHead, ForInit, FunctionBody, FunctionId, JsxAttribute,
    JsxAttributeValue, JsxChild, JsxElement, MemberProp, ObjectPatternProp, ObjectProp, Pattern,
    PropKey, StmtId, StmtKind,
};

pub trait Visitor {
    fn visit_statement(&mut self, ast: &Ast, id: StmtId) {
        walk_statement(self, ast, id);
    }

    fn visit_expression(&mut self, ast: &Ast, expression: &Expr) {
        walk_expression(self, ast, expression);
    }

    fn visit_pattern(&mut self, ast: &Ast, pattern: &Pattern) {
        walk_pattern(self, ast, pattern);
    }

    fn visit_function(&mut self, ast: &Ast, id: FunctionId) {
        walk_function(self, ast, id);
    }

    fn visit_jsx_element(&mut self, ast: &Ast, element: &JsxElement) {
        walk_jsx_element(self, ast, element);
    }
}

/// Visits a statement's own expressions and patterns, then its child statements.
pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: StmtId) {
    walk_statement_header(visitor, ast, id);
    for child in ast.child_statements(id) {
        visitor.visit_statement(ast, child);
    }
}

/// Visits only what a statement evaluates itself, not its child statements.
/// For a leaf statement this is everything it contains.
pub fn walk_statement_header<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: StmtId) {
    match ast.kind(id) {
        StmtKind::Expression(expression) | StmtKind::Throw(expression) => {
            visitor.visit_expression(ast, expression);
        }
        StmtKind::Return(argument) => {
            if let Some(argument) = argument {
                visitor.visit_expression(ast, argument);
            }
        }
        StmtKind::VarDecl(declaration) => {
            for declarator in &declaration.declarators {
                visitor.visit_pattern(ast, &declarator.target);
                if let Some(init) = &declarator.init {
                    visitor.visit_expression(ast, init);
                }
            }
        }
        StmtKind::FunctionDecl(function) => visitor.visit_function(ast, *function),
        StmtKind::If { test, .. } | StmtKind::While { test, .. } | StmtKind::DoWhile { test, .. } => {
            visitor.visit_expression(ast, test);
        }
        StmtKind::For {
            init, test, update, ..
        } => {
            match init {
                Some(ForInit::VarDecl(declaration)) => {
                    for declarator in &declaration.declarators {
                        visitor.visit_pattern(ast, &declarator.target);
                        if let Some(init) = &declarator.init {
                            visitor.visit_expression(ast, init);
                        }
                    }
                }
                Some(ForInit::Expression(expression)) => visitor.visit_expression(ast, expression),
                None => {}
            }
            if let Some(test) = test {
                visitor.visit_expression(ast, test);
            }
            if let Some(update) = update {
                visitor.visit_expression(ast, update);
            }
        }
        StmtKind::ForIn { left, right, .. } | StmtKind::ForOf { left, right, .. } => {
            match left {
                ForHead::VarDecl { target, .. } | ForHead::Pattern(target) => {
                    visitor.visit_pattern(ast, target);
                }
            }
            visitor.visit_expression(ast, right);
        }
        StmtKind::Try { handler, .. } => {
            if let Some(param) = handler.as_ref().and_then(|handler| handler.param.as_ref()) {
                visitor.visit_pattern(ast, param);
            }
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            visitor.visit_expression(ast, discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    visitor.visit_expression(ast, test);
                }
            }
        }
        StmtKind::Export(export) => match export {
            ExportDecl::DefaultFunction(function) => visitor.visit_function(ast, *function),
            ExportDecl::DefaultExpression(expression) => visitor.visit_expression(ast, expression),
            _ => {}
        },
        StmtKind::Block(_)
        | StmtKind::Labeled { .. }
        | StmtKind::Break(_)
        | StmtKind::Continue(_)
        | StmtKind::Import(_)
        | StmtKind::Debugger
        | StmtKind::Empty
        | StmtKind::Removed => {}
    }
}

pub fn walk_function<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: FunctionId) {
    let function = ast.function(id);
    for param in &function.params {
        visitor.visit_pattern(ast, param);
    }
    match &function.body {
        FunctionBody::Block(block) => visitor.visit_statement(ast, *block),
        FunctionBody::Expression(expression) => visitor.visit_expression(ast, expression),
    }
}

/// Visits the expressions held by a pattern: defaults, computed keys and assignment targets.
pub fn walk_pattern<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, pattern: &Pattern) {
    match pattern {
        Pattern::Identifier(_) => {}
        Pattern::Array(elements) => {
            for element in elements.iter().flatten() {
                visitor.visit_pattern(ast, element);
            }
        }
        Pattern::Object(props) => {
            for prop in props {
                match prop {
                    ObjectPatternProp::KeyValue { key, value, .. } => {
                        if let PropKey::Computed(key) = key {
                            visitor.visit_expression(ast, key);
                        }
                        visitor.visit_pattern(ast, value);
                    }
                    ObjectPatternProp::Rest(rest) => visitor.visit_pattern(ast, rest),
                }
            }
        }
        Pattern::Default { target, value } => {
            visitor.visit_pattern(ast, target);
            visitor.visit_expression(ast, value);
        }
        Pattern::Rest(inner) => visitor.visit_pattern(ast, inner),
        Pattern::Expression(expression) => visitor.visit_expression(ast, expression),
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, expression: &Expr) {
    match expression {
        Expr::Identifier(_)
        | Expr::This
        | Expr::Null
        | Expr::Bool(_)
        | Expr::Number(_)
        | Expr::String(_)
        | Expr::Regex { .. } => {}
        Expr::Template { expressions, .. } => {
            for inner in expressions {
                visitor.visit_expression(ast, inner);
            }
        }
        Expr::TaggedTemplate {
            tag, expressions, ..
        } => {
            visitor.visit_expression(ast, tag);
            for inner in expressions {
                visitor.visit_expression(ast, inner);
            }
        }
        Expr::Array(elements) => {
            for element in elements.iter().flatten() {
                visitor.visit_expression(ast, element);
            }
        }
        Expr::Object(props) => {
            for prop in props {
                match prop {
                    ObjectProp::KeyValue { key, value } => {
                        if let PropKey::Computed(key) = key {
                            visitor.visit_expression(ast, key);
                        }
                        visitor.visit_expression(ast, value);
                    }
                    ObjectProp::Shorthand(name) => {
                        visitor.visit_expression(ast, &Expr::Identifier(name.clone()));
                    }
                    ObjectProp::Method { key, function, .. } => {
                        if let PropKey::Computed(key) = key {
                            visitor.visit_expression(ast, key);
                        }
                        visitor.visit_function(ast, *function);
                    }
                    ObjectProp::Spread(inner) => visitor.visit_expression(ast, inner),
                }
            }
        }
        Expr::Function(function) => visitor.visit_function(ast, *function),
        Expr::Unary { argument, .. }
        | Expr::Update { argument, .. }
        | Expr::Spread(argument)
        | Expr::Await(argument) => visitor.visit_expression(ast, argument),
        Expr::Yield { argument, .. } => {
            if let Some(argument) = argument {
                visitor.visit_expression(ast, argument);
            }
        }
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            visitor.visit_expression(ast, left);
            visitor.visit_expression(ast, right);
        }
        Expr::Assign { target, value, .. } => {
            visitor.visit_pattern(ast, target);
            visitor.visit_expression(ast, value);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expression(ast, test);
            visitor.visit_expression(ast, consequent);
            visitor.visit_expression(ast, alternate);
        }
        Expr::Call {
            callee, arguments, ..
        }
        | Expr::New { callee, arguments } => {
            visitor.visit_expression(ast, callee);
            for argument in arguments {
                visitor.visit_expression(ast, argument);
            }
        }
        Expr::Member {
            object, property, ..
        } => {
            visitor.visit_expression(ast, object);
            if let MemberProp::Computed(property) = property {
                visitor.visit_expression(ast, property);
            }
        }
        Expr::Sequence(expressions) => {
            for inner in expressions {
                visitor.visit_expression(ast, inner);
            }
        }
        Expr::JsxElement(element) => visitor.visit_jsx_element(ast, element),
        Expr::JsxFragment(children) => walk_jsx_children(visitor, ast, children),
        Expr::Annotated { expression, .. } => visitor.visit_expression(ast, expression),
    }
}

pub fn walk_jsx_element<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, element: &JsxElement) {
    for attribute in &element.attributes {
        match attribute {
            JsxAttribute::Attribute { value, .. } => match value {
                Some(JsxAttributeValue::Expression(expression))
                | Some(JsxAttributeValue::Element(expression)) => {
                    visitor.visit_expression(ast, expression);
                }
                Some(JsxAttributeValue::String(_)) | None => {}
            },
            JsxAttribute::Spread(expression) => visitor.visit_expression(ast, expression),
        }
    }
    walk_jsx_children(visitor, ast, &element.children);
}

pub fn walk_jsx_children<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, children: &[JsxChild]) {
    for child in children {
        match child {
            JsxChild::Expression(expression)
            | JsxChild::Spread(expression)
            | JsxChild::Element(expression) => visitor.visit_expression(ast, expression),
            JsxChild::Text(_) | JsxChild::EmptyExpression => {}
        }
    }
}
