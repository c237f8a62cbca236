use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{StmtId, StmtKind};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{FileTokens, TextLocation, TokenKind};
use crate::{ast_log, return_syntax_error};

// Words that can never be used as a binding, label or plain identifier reference
pub const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "finally", "for", "function", "if", "import", "in", "instanceof",
    "new", "return", "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while",
    "with", "null", "true", "false", "enum",
];

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// Recursive descent parser over an already tokenized file.
/// Statement and expression rules live in their own modules as further `impl Parser` blocks.
pub struct Parser<'a> {
    pub(crate) token_stream: &'a mut FileTokens,
    pub(crate) ast: Ast,

    // Set while parsing a for-loop head, where `in` ends the init expression
    pub(crate) no_in: bool,
}

pub fn build_ast(token_stream: &mut FileTokens) -> Result<Ast, CompilerError> {
    let mut parser = Parser {
        token_stream,
        ast: Ast::new(),
        no_in: false,
    };

    while parser.token_stream.current_token_kind() != &TokenKind::Eof {
        let statement = parser.parse_statement()?;
        parser.ast.body.push(statement);
    }

    ast_log!("Parsed ", parser.ast.body.len(), " top level statements");

    Ok(parser.ast)
}

impl<'a> Parser<'a> {
    pub(crate) fn current_kind(&self) -> &TokenKind {
        self.token_stream.current_token_kind()
    }

    pub(crate) fn location(&self) -> TextLocation {
        self.token_stream.current_location()
    }

    /// Span from `start` up to the last consumed token.
    pub(crate) fn location_from(&self, start: TextLocation) -> TextLocation {
        start.to(self.token_stream.previous_location())
    }

    pub(crate) fn add_statement(&mut self, kind: StmtKind, start: TextLocation) -> StmtId {
        let location = self.location_from(start);
        self.ast.add_statement(kind, location)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, stage: &'static str) -> Result<(), CompilerError> {
        if self.current_kind() == &kind {
            self.token_stream.advance();
            return Ok(());
        }

        let found = self.current_kind().to_string();
        return_syntax_error!(
            format!("Expected '{kind}' but found '{found}'"),
            self.location(),
            {
                CompilationStage => stage,
                FoundToken => found,
            }
        )
    }

    pub(crate) fn expect_word(&mut self, word: &str, stage: &'static str) -> Result<(), CompilerError> {
        if self.token_stream.eat_word(word) {
            return Ok(());
        }

        let found = self.current_kind().to_string();
        return_syntax_error!(
            format!("Expected '{word}' but found '{found}'"),
            self.location(),
            {
                CompilationStage => stage,
                FoundToken => found,
            }
        )
    }

    /// Reads a binding name and records it so generated names can't collide with it.
    pub(crate) fn binding_identifier(&mut self, stage: &'static str) -> Result<String, CompilerError> {
        if let TokenKind::Identifier(name) = self.current_kind() {
            if !is_reserved_word(name) {
                let name = name.to_owned();
                self.ast.register_name(&name);
                self.token_stream.advance();
                return Ok(name);
            }
        }

        let found = self.current_kind().to_string();
        return_syntax_error!(
            format!("Expected an identifier but found '{found}'"),
            self.location(),
            {
                CompilationStage => stage,
                FoundToken => found,
            }
        )
    }

    /// Any word, keywords included. Property names after a dot are allowed to be keywords.
    pub(crate) fn property_name(&mut self, stage: &'static str) -> Result<String, CompilerError> {
        if let TokenKind::Identifier(name) = self.current_kind() {
            let name = name.to_owned();
            self.token_stream.advance();
            return Ok(name);
        }

        let found = self.current_kind().to_string();
        return_syntax_error!(
            format!("Expected a property name but found '{found}'"),
            self.location(),
            {
                CompilationStage => stage,
                FoundToken => found,
            }
        )
    }

    /// Automatic semicolon insertion: a statement may end without `;`
    /// before a `}`, at the end of the file or at a line break.
    pub(crate) fn consume_statement_end(&mut self) -> Result<(), CompilerError> {
        match self.current_kind() {
            TokenKind::Semicolon => {
                self.token_stream.advance();
                Ok(())
            }
            TokenKind::CloseCurly | TokenKind::Eof => Ok(()),
            _ if self.token_stream.newline_before() => Ok(()),
            _ => {
                let found = self.current_kind().to_string();
                return_syntax_error!(
                    format!("Expected ';' but found '{found}'"),
                    self.location(),
                    {
                        CompilationStage => "Statement Parsing",
                        PrimarySuggestion => "Add a semicolon or a line break to end the statement",
                        FoundToken => found,
                    }
                )
            }
        }
    }

    /// Whether the `(` at the current position opens an arrow function parameter list.
    pub(crate) fn is_arrow_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut offset = 0;

        loop {
            match self.token_stream.peek_nth(offset) {
                TokenKind::OpenParenthesis | TokenKind::OpenBracket | TokenKind::OpenCurly => {
                    depth += 1;
                }
                TokenKind::CloseParenthesis | TokenKind::CloseBracket | TokenKind::CloseCurly => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.token_stream.peek_nth(offset + 1) == &TokenKind::Arrow;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    /// Runs `parse` with `in` allowed as an operator again, e.g. inside parentheses in a for head.
    pub(crate) fn with_in_allowed<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, CompilerError>,
    ) -> Result<T, CompilerError> {
        let previous = std::mem::replace(&mut self.no_in, false);
        let result = parse(self);
        self.no_in = previous;
        result
    }
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod tests;
