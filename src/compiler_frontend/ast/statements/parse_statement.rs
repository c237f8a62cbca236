use crate::compiler_frontend::ast::ast_nodes::{StmtId, StmtKind};
use crate::compiler_frontend::ast::build_ast::{Parser, is_reserved_word};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use crate::{ast_log, return_syntax_error};

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();

        let word = match self.current_kind() {
            TokenKind::OpenCurly => return self.parse_block(),
            TokenKind::Semicolon => {
                self.token_stream.advance();
                return Ok(self.add_statement(StmtKind::Empty, start));
            }
            TokenKind::Identifier(word) => word.to_owned(),
            _ => return self.parse_expression_statement(),
        };

        match word.as_str() {
            "var" | "const" => self.parse_variable_statement(),

            // `let` is only a declaration when a binding follows it
            "let" if matches!(
                self.token_stream.peek_next_token(),
                Some(TokenKind::Identifier(_) | TokenKind::OpenBracket | TokenKind::OpenCurly)
            ) =>
            {
                self.parse_variable_statement()
            }

            "function" => self.parse_function_declaration(false),
            "async"
                if self.token_stream.peek_next_token() == Some(&TokenKind::Identifier(String::from("function"))) =>
            {
                self.token_stream.advance();
                self.parse_function_declaration(true)
            }

            "if" => self.parse_if_statement(),
            "for" => self.parse_for_statement(),
            "while" => self.parse_while_statement(),
            "do" => self.parse_do_while_statement(),
            "try" => self.parse_try_statement(),
            "switch" => self.parse_switch_statement(),

            "return" => {
                self.token_stream.advance();
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_statement_end()?;
                Ok(self.add_statement(StmtKind::Return(argument), start))
            }

            "break" | "continue" => {
                self.token_stream.advance();
                let label = match self.current_kind() {
                    TokenKind::Identifier(label)
                        if !self.token_stream.newline_before() && !is_reserved_word(label) =>
                    {
                        let label = label.to_owned();
                        self.token_stream.advance();
                        Some(label)
                    }
                    _ => None,
                };
                self.consume_statement_end()?;

                let kind = if word == "break" {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                };
                Ok(self.add_statement(kind, start))
            }

            "throw" => {
                self.token_stream.advance();
                if self.token_stream.newline_before() {
                    return_syntax_error!(
                        "Illegal newline after throw",
                        self.location(),
                        {
                            CompilationStage => "Statement Parsing",
                        }
                    )
                }
                let argument = self.parse_expression()?;
                self.consume_statement_end()?;
                Ok(self.add_statement(StmtKind::Throw(argument), start))
            }

            "debugger" => {
                self.token_stream.advance();
                self.consume_statement_end()?;
                Ok(self.add_statement(StmtKind::Debugger, start))
            }

            "import"
                if !matches!(
                    self.token_stream.peek_next_token(),
                    Some(TokenKind::OpenParenthesis | TokenKind::Dot)
                ) =>
            {
                self.parse_import()
            }

            "export" => self.parse_export(),

            "class" => {
                return_syntax_error!(
                    "Class declarations are not supported",
                    start,
                    {
                        CompilationStage => "Statement Parsing",
                        PrimarySuggestion => "Only function components and hooks can be compiled",
                    }
                )
            }

            "interface" | "type" | "enum" | "declare"
                if matches!(self.token_stream.peek_next_token(), Some(TokenKind::Identifier(_))) =>
            {
                return_syntax_error!(
                    "TypeScript syntax is not supported",
                    start,
                    {
                        CompilationStage => "Statement Parsing",
                        PrimarySuggestion => "Compile the TypeScript to JavaScript first",
                    }
                )
            }

            _ if !is_reserved_word(&word) && self.token_stream.peek_next_token() == Some(&TokenKind::Colon) => {
                self.token_stream.advance();
                self.token_stream.advance();
                let body = self.parse_statement()?;
                Ok(self.add_statement(StmtKind::Labeled { label: word.clone(), body }, start))
            }

            _ => self.parse_expression_statement(),
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        self.expect(TokenKind::OpenCurly, "Block Parsing")?;

        let mut statements = Vec::new();
        while !matches!(self.current_kind(), TokenKind::CloseCurly | TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }

        self.expect(TokenKind::CloseCurly, "Block Parsing")?;

        ast_log!("Block with ", statements.len(), " statements");

        Ok(self.add_statement(StmtKind::Block(statements), start))
    }

    fn parse_expression_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        let expression = self.parse_expression()?;
        self.consume_statement_end()?;
        Ok(self.add_statement(StmtKind::Expression(expression), start))
    }

    /// Whether the statement ends here, following the same rules as semicolon insertion.
    pub(crate) fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::CloseCurly | TokenKind::Eof
        ) || self.token_stream.newline_before()
    }
}
