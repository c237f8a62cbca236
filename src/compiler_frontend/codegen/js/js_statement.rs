use crate::compiler_frontend::ast::ast_nodes::{
    ExportDecl, ForHead, ForInit, ImportSpecifier, StmtId, StmtKind, VarDecl,
};
use crate::compiler_frontend::codegen::js::JsEmitter;
use crate::compiler_frontend::codegen::js::js_expr::{PRECEDENCE_ASSIGNMENT, quote_js_string};

impl<'a> JsEmitter<'a> {
    /// Emits a statement on a new line at the current indentation.
    pub fn emit_statement(&mut self, id: StmtId) {
        if matches!(self.ast.kind(id), StmtKind::Removed) {
            return;
        }
        self.emit_indent();
        self.emit_statement_inline(id);
    }

    /// Emits a block with its braces, starting at the current position.
    pub fn emit_block(&mut self, id: StmtId) {
        let ast = self.ast;
        let statements: Vec<StmtId> = ast
            .block_statements(id)
            .iter()
            .copied()
            .filter(|statement| !matches!(ast.kind(*statement), StmtKind::Removed))
            .collect();

        if statements.is_empty() {
            self.emit("{}");
            return;
        }

        self.emit("{");
        self.indent();
        for statement in statements {
            self.emit_statement(statement);
        }
        self.dedent();
        self.emit_indent();
        self.emit("}");
    }

    /// Emits a statement starting at the current position, without a leading newline.
    pub fn emit_statement_inline(&mut self, id: StmtId) {
        let ast = self.ast;

        match ast.kind(id) {
            StmtKind::Expression(expression) => {
                let text = self.capture(|emitter| emitter.emit_expression(expression, 0));
                // These would parse as a declaration or a block at the start of a statement
                if text.starts_with('{')
                    || text.starts_with("function")
                    || text.starts_with("async function")
                    || text.starts_with("class")
                    || text.starts_with("let [")
                {
                    self.emit("(");
                    self.emit(&text);
                    self.emit(");");
                } else {
                    self.emit(&text);
                    self.emit(";");
                }
            }

            StmtKind::VarDecl(declaration) => {
                self.emit_variable_declaration(declaration);
                self.emit(";");
            }

            StmtKind::FunctionDecl(function) => self.emit_function(*function),

            StmtKind::Return(argument) => match argument {
                Some(argument) => {
                    self.emit("return ");
                    self.emit_expression(argument, 0);
                    self.emit(";");
                }
                None => self.emit("return;"),
            },

            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.emit("if (");
                self.emit_expression(test, 0);
                self.emit(")");
                let consequent_is_block = self.emit_body(*consequent);

                if let Some(alternate) = alternate {
                    if consequent_is_block {
                        self.emit(" else");
                    } else {
                        self.emit_indent();
                        self.emit("else");
                    }

                    if matches!(ast.kind(*alternate), StmtKind::If { .. }) {
                        self.emit(" ");
                        self.emit_statement_inline(*alternate);
                    } else {
                        self.emit_body(*alternate);
                    }
                }
            }

            StmtKind::Block(_) => self.emit_block(id),

            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.emit("for (");
                match init {
                    Some(ForInit::VarDecl(declaration)) => self.emit_variable_declaration(declaration),
                    Some(ForInit::Expression(expression)) => self.emit_expression(expression, 0),
                    None => {}
                }
                self.emit(";");
                if let Some(test) = test {
                    self.emit(" ");
                    self.emit_expression(test, 0);
                }
                self.emit(";");
                if let Some(update) = update {
                    self.emit(" ");
                    self.emit_expression(update, 0);
                }
                self.emit(")");
                self.emit_body(*body);
            }

            StmtKind::ForIn { left, right, body } => {
                self.emit("for (");
                self.emit_for_head(left);
                self.emit(" in ");
                self.emit_expression(right, 0);
                self.emit(")");
                self.emit_body(*body);
            }

            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            } => {
                self.emit(if *is_await { "for await (" } else { "for (" });
                self.emit_for_head(left);
                self.emit(" of ");
                self.emit_expression(right, PRECEDENCE_ASSIGNMENT);
                self.emit(")");
                self.emit_body(*body);
            }

            StmtKind::While { test, body } => {
                self.emit("while (");
                self.emit_expression(test, 0);
                self.emit(")");
                self.emit_body(*body);
            }

            StmtKind::DoWhile { body, test } => {
                self.emit("do");
                if self.emit_body(*body) {
                    self.emit(" ");
                } else {
                    self.emit_indent();
                }
                self.emit("while (");
                self.emit_expression(test, 0);
                self.emit(");");
            }

            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.emit("try ");
                self.emit_block(*block);
                if let Some(handler) = handler {
                    self.emit(" catch ");
                    if let Some(param) = &handler.param {
                        self.emit("(");
                        self.emit_pattern(param);
                        self.emit(") ");
                    }
                    self.emit_block(handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.emit(" finally ");
                    self.emit_block(*finalizer);
                }
            }

            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.emit("switch (");
                self.emit_expression(discriminant, 0);
                self.emit(") {");
                self.indent();
                for case in cases {
                    self.emit_indent();
                    match &case.test {
                        Some(test) => {
                            self.emit("case ");
                            self.emit_expression(test, 0);
                            self.emit(":");
                        }
                        None => self.emit("default:"),
                    }
                    self.indent();
                    for statement in &case.consequent {
                        self.emit_statement(*statement);
                    }
                    self.dedent();
                }
                self.dedent();
                self.emit_indent();
                self.emit("}");
            }

            StmtKind::Labeled { label, body } => {
                self.emit(label);
                self.emit(": ");
                self.emit_statement_inline(*body);
            }

            StmtKind::Break(label) | StmtKind::Continue(label) => {
                self.emit(if matches!(ast.kind(id), StmtKind::Break(_)) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = label {
                    self.emit(" ");
                    self.emit(label);
                }
                self.emit(";");
            }

            StmtKind::Throw(argument) => {
                self.emit("throw ");
                self.emit_expression(argument, 0);
                self.emit(";");
            }

            StmtKind::Import(import) => {
                self.emit("import ");

                let mut default = None;
                let mut namespace = None;
                let mut named = Vec::new();
                for specifier in &import.specifiers {
                    match specifier {
                        ImportSpecifier::Default(local) => default = Some(local.as_str()),
                        ImportSpecifier::Namespace(local) => namespace = Some(local.as_str()),
                        ImportSpecifier::Named { imported, local } if imported == local => {
                            named.push(local.to_owned());
                        }
                        ImportSpecifier::Named { imported, local } => {
                            named.push(format!("{imported} as {local}"));
                        }
                    }
                }

                let mut clauses = Vec::new();
                if let Some(default) = default {
                    clauses.push(default.to_owned());
                }
                if let Some(namespace) = namespace {
                    clauses.push(format!("* as {namespace}"));
                }
                if !named.is_empty() {
                    clauses.push(format!("{{ {} }}", named.join(", ")));
                }

                if !clauses.is_empty() {
                    self.emit(&clauses.join(", "));
                    self.emit(" from ");
                }
                self.emit(&quote_js_string(&import.source));
                self.emit(";");
            }

            StmtKind::Export(export) => {
                self.emit("export ");
                match export {
                    ExportDecl::Declaration(declaration) => self.emit_statement_inline(*declaration),
                    ExportDecl::DefaultFunction(function) => {
                        self.emit("default ");
                        self.emit_function(*function);
                    }
                    ExportDecl::DefaultExpression(expression) => {
                        self.emit("default ");
                        self.emit_expression(expression, PRECEDENCE_ASSIGNMENT);
                        self.emit(";");
                    }
                    ExportDecl::Named { specifiers, source } => {
                        let specifiers: Vec<String> = specifiers
                            .iter()
                            .map(|specifier| {
                                if specifier.local == specifier.exported {
                                    specifier.local.to_owned()
                                } else {
                                    format!("{} as {}", specifier.local, specifier.exported)
                                }
                            })
                            .collect();
                        self.emit(&format!("{{ {} }}", specifiers.join(", ")));
                        if let Some(source) = source {
                            self.emit(" from ");
                            self.emit(&quote_js_string(source));
                        }
                        self.emit(";");
                    }
                    ExportDecl::All { alias, source } => {
                        self.emit("*");
                        if let Some(alias) = alias {
                            self.emit(" as ");
                            self.emit(alias);
                        }
                        self.emit(" from ");
                        self.emit(&quote_js_string(source));
                        self.emit(";");
                    }
                }
            }

            StmtKind::Debugger => self.emit("debugger;"),
            StmtKind::Empty => self.emit(";"),
            StmtKind::Removed => {}
        }
    }

    /// Emits the body of a control flow statement.
    /// Blocks go on the same line, anything else on its own indented line.
    /// Returns whether the body was a block.
    fn emit_body(&mut self, body: StmtId) -> bool {
        if matches!(self.ast.kind(body), StmtKind::Block(_)) {
            self.emit(" ");
            self.emit_block(body);
            return true;
        }

        self.indent();
        self.emit_statement(body);
        self.dedent();
        false
    }

    fn emit_variable_declaration(&mut self, declaration: &VarDecl) {
        self.emit(declaration.kind.as_str());
        self.emit(" ");
        for (index, declarator) in declaration.declarators.iter().enumerate() {
            if index > 0 {
                self.emit(", ");
            }
            self.emit_pattern(&declarator.target);
            if let Some(init) = &declarator.init {
                self.emit(" = ");
                self.emit_expression(init, PRECEDENCE_ASSIGNMENT);
            }
        }
    }

    fn emit_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::VarDecl { kind, target } => {
                self.emit(kind.as_str());
                self.emit(" ");
                self.emit_pattern(target);
            }
            ForHead::Pattern(target) => self.emit_pattern(target),
        }
    }
}
