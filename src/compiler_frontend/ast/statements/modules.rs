use crate::compiler_frontend::ast::ast_nodes::{
    ExportDecl, ExportSpecifier, ImportDecl, ImportSpecifier, StmtId, StmtKind,
};
use crate::compiler_frontend::ast::build_ast::Parser;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use crate::return_syntax_error;

impl<'a> Parser<'a> {
    /// import "x"
    /// import a, { b as c } from "x"
    /// import * as ns from "x"
    pub(crate) fn parse_import(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("import", "Import Parsing")?;

        if let TokenKind::StringLiteral(source) = self.current_kind() {
            let source = source.to_owned();
            self.token_stream.advance();
            self.consume_statement_end()?;
            return Ok(self.add_statement(
                StmtKind::Import(ImportDecl {
                    specifiers: Vec::new(),
                    source,
                }),
                start,
            ));
        }

        if self.token_stream.is_word("type")
            && matches!(
                self.token_stream.peek_next_token(),
                Some(TokenKind::Identifier(_) | TokenKind::OpenCurly)
            )
        {
            return_syntax_error!(
                "Type imports are not supported",
                start,
                {
                    CompilationStage => "Import Parsing",
                    PrimarySuggestion => "Compile the TypeScript to JavaScript first",
                }
            )
        }

        let mut specifiers = Vec::new();

        if matches!(self.current_kind(), TokenKind::Identifier(_)) && !self.token_stream.is_word("from") {
            let local = self.binding_identifier("Import Parsing")?;
            specifiers.push(ImportSpecifier::Default(local));
            self.token_stream.eat(&TokenKind::Comma);
        }

        if self.token_stream.eat(&TokenKind::Multiply) {
            self.expect_word("as", "Import Parsing")?;
            let local = self.binding_identifier("Import Parsing")?;
            specifiers.push(ImportSpecifier::Namespace(local));
        } else if self.token_stream.eat(&TokenKind::OpenCurly) {
            while self.current_kind() != &TokenKind::CloseCurly {
                let imported = self.module_export_name()?;
                let local = if self.token_stream.eat_word("as") {
                    self.binding_identifier("Import Parsing")?
                } else {
                    self.ast.register_name(&imported);
                    imported.clone()
                };
                specifiers.push(ImportSpecifier::Named { imported, local });

                if !self.token_stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseCurly, "Import Parsing")?;
        }

        self.expect_word("from", "Import Parsing")?;
        let source = self.module_source()?;
        self.consume_statement_end()?;

        Ok(self.add_statement(StmtKind::Import(ImportDecl { specifiers, source }), start))
    }

    pub(crate) fn parse_export(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("export", "Export Parsing")?;

        if self.token_stream.eat_word("default") {
            let is_async_function = self.token_stream.is_word("async")
                && self.token_stream.peek_next_token()
                    == Some(&TokenKind::Identifier(String::from("function")));

            if self.token_stream.is_word("function") || is_async_function {
                if is_async_function {
                    self.token_stream.advance();
                }
                let function = self.parse_function(is_async_function, false)?;
                return Ok(self.add_statement(
                    StmtKind::Export(ExportDecl::DefaultFunction(function)),
                    start,
                ));
            }

            let expression = self.parse_assignment()?;
            self.consume_statement_end()?;
            return Ok(self.add_statement(
                StmtKind::Export(ExportDecl::DefaultExpression(expression)),
                start,
            ));
        }

        if self.token_stream.eat(&TokenKind::Multiply) {
            let alias = if self.token_stream.eat_word("as") {
                Some(self.module_export_name()?)
            } else {
                None
            };
            self.expect_word("from", "Export Parsing")?;
            let source = self.module_source()?;
            self.consume_statement_end()?;
            return Ok(self.add_statement(StmtKind::Export(ExportDecl::All { alias, source }), start));
        }

        if self.token_stream.eat(&TokenKind::OpenCurly) {
            let mut specifiers = Vec::new();
            while self.current_kind() != &TokenKind::CloseCurly {
                let local = self.module_export_name()?;
                let exported = if self.token_stream.eat_word("as") {
                    self.module_export_name()?
                } else {
                    local.clone()
                };
                specifiers.push(ExportSpecifier { local, exported });

                if !self.token_stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseCurly, "Export Parsing")?;

            let source = if self.token_stream.eat_word("from") {
                Some(self.module_source()?)
            } else {
                None
            };
            self.consume_statement_end()?;

            return Ok(self.add_statement(
                StmtKind::Export(ExportDecl::Named { specifiers, source }),
                start,
            ));
        }

        // export function / export const ...
        let declaration = self.parse_statement()?;
        if !matches!(
            self.ast.kind(declaration),
            StmtKind::VarDecl(_) | StmtKind::FunctionDecl(_)
        ) {
            return_syntax_error!(
                "Expected a declaration after 'export'",
                self.location_from(start),
                {
                    CompilationStage => "Export Parsing",
                }
            )
        }

        Ok(self.add_statement(StmtKind::Export(ExportDecl::Declaration(declaration)), start))
    }

    // Names in import and export lists may be keywords or strings
    fn module_export_name(&mut self) -> Result<String, CompilerError> {
        if let TokenKind::StringLiteral(name) = self.current_kind() {
            let name = name.to_owned();
            self.token_stream.advance();
            return Ok(name);
        }
        self.property_name("Module Parsing")
    }

    fn module_source(&mut self) -> Result<String, CompilerError> {
        if let TokenKind::StringLiteral(source) = self.current_kind() {
            let source = source.to_owned();
            self.token_stream.advance();
            return Ok(source);
        }

        let found = self.current_kind().to_string();
        return_syntax_error!(
            format!("Expected a module path string but found '{found}'"),
            self.location(),
            {
                CompilationStage => "Module Parsing",
                FoundToken => found,
            }
        )
    }
}
