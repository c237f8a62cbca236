use crate::compiler_frontend::ast::ast_nodes::{ForHead, ForInit, StmtId, StmtKind};
use crate::compiler_frontend::ast::build_ast::Parser;
use crate::compiler_frontend::ast::statements::declarations::expression_to_pattern;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{TextLocation, TokenKind};
use crate::{ast_log, return_syntax_error};

/// Whether the loop iterates with `in` or `of`.
#[derive(Clone, Copy, PartialEq)]
enum IterationKind {
    In,
    Of,
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_for_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("for", "Loop Parsing")?;

        let is_await = self.token_stream.eat_word("await");
        self.expect(TokenKind::OpenParenthesis, "Loop Parsing")?;

        // for (;;)
        if self.token_stream.eat(&TokenKind::Semicolon) {
            return self.finish_classic_for(None, start);
        }

        let is_declaration = self.token_stream.is_word("var")
            || self.token_stream.is_word("const")
            || (self.token_stream.is_word("let")
                && matches!(
                    self.token_stream.peek_next_token(),
                    Some(TokenKind::Identifier(_) | TokenKind::OpenBracket | TokenKind::OpenCurly)
                ));

        if is_declaration {
            let kind = self.parse_declaration_kind()?;

            let previous = std::mem::replace(&mut self.no_in, true);
            let declaration = self.parse_declarators(kind, false);
            self.no_in = previous;
            let mut declaration = declaration?;

            if let Some(iteration) = self.iteration_kind() {
                if declaration.declarators.len() != 1 || declaration.declarators[0].init.is_some() {
                    return_syntax_error!(
                        "A for-in or for-of loop declares exactly one binding without an initializer",
                        self.location_from(start),
                        {
                            CompilationStage => "Loop Parsing",
                        }
                    )
                }

                let target = declaration.declarators.remove(0).target;
                return self.finish_iteration_for(ForHead::VarDecl { kind, target }, iteration, is_await, start);
            }

            self.expect(TokenKind::Semicolon, "Loop Parsing")?;
            return self.finish_classic_for(Some(ForInit::VarDecl(declaration)), start);
        }

        let head_location = self.location();
        let previous = std::mem::replace(&mut self.no_in, true);
        let init = self.parse_expression();
        self.no_in = previous;
        let init = init?;

        if let Some(iteration) = self.iteration_kind() {
            let target = expression_to_pattern(init, head_location)?;
            return self.finish_iteration_for(ForHead::Pattern(target), iteration, is_await, start);
        }

        self.expect(TokenKind::Semicolon, "Loop Parsing")?;
        self.finish_classic_for(Some(ForInit::Expression(init)), start)
    }

    fn iteration_kind(&mut self) -> Option<IterationKind> {
        if self.token_stream.eat_word("of") {
            return Some(IterationKind::Of);
        }
        if self.token_stream.eat_word("in") {
            return Some(IterationKind::In);
        }
        None
    }

    // Everything after the first semicolon of `for (init; test; update) body`
    fn finish_classic_for(
        &mut self,
        init: Option<ForInit>,
        start: TextLocation,
    ) -> Result<StmtId, CompilerError> {
        let test = if self.current_kind() == &TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "Loop Parsing")?;

        let update = if self.current_kind() == &TokenKind::CloseParenthesis {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::CloseParenthesis, "Loop Parsing")?;

        let body = self.parse_statement()?;

        ast_log!("Parsed a classic for loop");

        Ok(self.add_statement(
            StmtKind::For {
                init,
                test,
                update,
                body,
            },
            start,
        ))
    }

    fn finish_iteration_for(
        &mut self,
        left: ForHead,
        iteration: IterationKind,
        is_await: bool,
        start: TextLocation,
    ) -> Result<StmtId, CompilerError> {
        let right = match iteration {
            IterationKind::Of => self.parse_assignment()?,
            IterationKind::In => self.parse_expression()?,
        };
        self.expect(TokenKind::CloseParenthesis, "Loop Parsing")?;

        let body = self.parse_statement()?;

        let kind = match iteration {
            IterationKind::Of => StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            },
            IterationKind::In => StmtKind::ForIn { left, right, body },
        };

        Ok(self.add_statement(kind, start))
    }

    pub(crate) fn parse_while_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("while", "Loop Parsing")?;

        let test = self.parse_parenthesized_expression("Loop Parsing")?;
        let body = self.parse_statement()?;

        Ok(self.add_statement(StmtKind::While { test, body }, start))
    }

    pub(crate) fn parse_do_while_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("do", "Loop Parsing")?;

        let body = self.parse_statement()?;
        self.expect_word("while", "Loop Parsing")?;
        let test = self.parse_parenthesized_expression("Loop Parsing")?;

        // The semicolon after do-while is always optional
        self.token_stream.eat(&TokenKind::Semicolon);

        Ok(self.add_statement(StmtKind::DoWhile { body, test }, start))
    }
}
