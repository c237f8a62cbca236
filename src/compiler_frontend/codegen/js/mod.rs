//! JavaScript printer
//!
//! Turns the AST back into JavaScript source.
//!
//! Design goals:
//! - Untouched top level statements are copied from the original file byte for byte
//! - Rewritten statements are printed with 4 space indentation
//! - Parentheses are only added where precedence requires them

mod js_expr;
mod js_jsx;
mod js_statement;

pub use js_expr::quote_js_string;

use crate::codegen_log;
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{Expr, Pattern, StmtId};

/// Internal state for JS emission
///
/// This is *not* an IR. It is a structured printer with context.
pub struct JsEmitter<'a> {
    /// The AST being printed
    pub ast: &'a Ast,

    /// Output buffer
    pub out: String,

    /// Current indentation depth
    pub indent: usize,
}

impl<'a> JsEmitter<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        JsEmitter {
            ast,
            out: String::new(),
            indent: 0,
        }
    }

    /// Emits a newline followed by indentation (4 spaces per level)
    pub(crate) fn emit_indent(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    /// Emits a string directly to the output buffer
    pub(crate) fn emit(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Increases indentation depth
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decreases indentation depth
    pub fn dedent(&mut self) {
        if self.indent > 0 {
            self.indent -= 1;
        }
    }

    /// Prints into a scratch emitter at the current indentation and hands back the text.
    /// Used where the printed form decides whether parentheses are needed.
    pub(crate) fn capture(&self, print: impl FnOnce(&mut JsEmitter<'a>)) -> String {
        let mut scratch = JsEmitter {
            ast: self.ast,
            out: String::new(),
            indent: self.indent,
        };
        print(&mut scratch);
        scratch.out
    }
}

pub fn print_expression(ast: &Ast, expression: &Expr) -> String {
    let mut emitter = JsEmitter::new(ast);
    emitter.emit_expression(expression, 0);
    emitter.out
}

pub fn print_pattern(ast: &Ast, pattern: &Pattern) -> String {
    let mut emitter = JsEmitter::new(ast);
    emitter.emit_pattern(pattern);
    emitter.out
}

pub fn print_statement(ast: &Ast, id: StmtId) -> String {
    let mut emitter = JsEmitter::new(ast);
    emitter.emit_statement_inline(id);
    emitter.out
}

/// Prints a whole file.
///
/// Top level statements that were not changed are copied straight from `source`,
/// together with the comments and whitespace around them. Changed statements replace
/// their original span, and statements with no span (inserted ones) get their own line.
pub fn emit_program(ast: &Ast, source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    let mut cursor = 0;

    for &id in &ast.body {
        let span = ast.location(id).span;
        let has_source = span.end > span.start && span.end <= source.len() && span.start >= cursor;

        if !has_source {
            out.push_str(&print_statement(ast, id));
            out.push('\n');
            continue;
        }

        out.push_str(&source[cursor..span.start]);

        if ast.changed.contains(&id) {
            codegen_log!("Reprinting changed top level statement ", #id);
            out.push_str(&print_statement(ast, id));
        } else {
            out.push_str(&source[span.start..span.end]);
        }

        cursor = span.end;
    }

    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
#[path = "tests/js_emitter_tests.rs"]
mod tests;
