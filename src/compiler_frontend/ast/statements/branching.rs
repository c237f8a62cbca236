use crate::compiler_frontend::ast::ast_nodes::{CatchClause, StmtId, StmtKind, SwitchCase};
use crate::compiler_frontend::ast::build_ast::Parser;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use crate::return_syntax_error;

// if / switch / try
impl<'a> Parser<'a> {
    pub(crate) fn parse_if_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("if", "If Statement Parsing")?;

        let test = self.parse_parenthesized_expression("If Statement Parsing")?;
        let consequent = self.parse_statement()?;

        let alternate = if self.token_stream.eat_word("else") {
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(self.add_statement(
            StmtKind::If {
                test,
                consequent,
                alternate,
            },
            start,
        ))
    }

    pub(crate) fn parse_switch_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("switch", "Switch Parsing")?;

        let discriminant = self.parse_parenthesized_expression("Switch Parsing")?;
        self.expect(TokenKind::OpenCurly, "Switch Parsing")?;

        let mut cases = Vec::new();
        let mut seen_default = false;

        while self.current_kind() != &TokenKind::CloseCurly {
            let test = if self.token_stream.eat_word("case") {
                Some(self.parse_expression()?)
            } else if self.token_stream.is_word("default") {
                if seen_default {
                    return_syntax_error!(
                        "A switch statement can only have one default case",
                        self.location(),
                        {
                            CompilationStage => "Switch Parsing",
                        }
                    )
                }
                seen_default = true;
                self.token_stream.advance();
                None
            } else {
                let found = self.current_kind().to_string();
                return_syntax_error!(
                    format!("Expected 'case' or 'default' but found '{found}'"),
                    self.location(),
                    {
                        CompilationStage => "Switch Parsing",
                        FoundToken => found,
                    }
                )
            };

            self.expect(TokenKind::Colon, "Switch Parsing")?;

            let mut consequent = Vec::new();
            while !(self.token_stream.is_word("case")
                || self.token_stream.is_word("default")
                || matches!(self.current_kind(), TokenKind::CloseCurly | TokenKind::Eof))
            {
                consequent.push(self.parse_statement()?);
            }

            cases.push(SwitchCase { test, consequent });
        }

        self.expect(TokenKind::CloseCurly, "Switch Parsing")?;

        Ok(self.add_statement(
            StmtKind::Switch {
                discriminant,
                cases,
            },
            start,
        ))
    }

    pub(crate) fn parse_try_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect_word("try", "Try Statement Parsing")?;

        let block = self.parse_block()?;

        let handler = if self.token_stream.eat_word("catch") {
            let param = if self.token_stream.eat(&TokenKind::OpenParenthesis) {
                let param = self.parse_binding_target()?;
                self.expect(TokenKind::CloseParenthesis, "Try Statement Parsing")?;
                Some(param)
            } else {
                None
            };

            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.token_stream.eat_word("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return_syntax_error!(
                "A try statement needs a catch or finally block",
                self.location_from(start),
                {
                    CompilationStage => "Try Statement Parsing",
                }
            )
        }

        Ok(self.add_statement(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            start,
        ))
    }
}
