use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

/// Byte offsets into the source file. Used to copy untouched statements back verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TextLocation {
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
    pub span: Span,
}

impl TextLocation {
    pub fn new(start: CharPosition, end: CharPosition, span: Span) -> Self {
        Self {
            start_pos: start,
            end_pos: end,
            span,
        }
    }

    pub fn new_just_line(line: i32) -> Self {
        Self {
            start_pos: CharPosition {
                line_number: line,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: line,
                char_column: 120, // Arbitrary number
            },
            span: Span::default(),
        }
    }

    /// A location covering both `self` and `end`.
    pub fn to(self, end: TextLocation) -> TextLocation {
        TextLocation {
            start_pos: self.start_pos,
            end_pos: end.end_pos,
            span: Span {
                start: self.span.start,
                end: end.span.end.max(self.span.end),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: TextLocation,

    // Automatic semicolon insertion only cares whether a line break came before a token
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, location: TextLocation) -> Self {
        Token {
            kind,
            location,
            newline_before: false,
        }
    }
}

#[derive(Debug)]
pub struct FileTokens {
    pub tokens: Vec<Token>,
    pub index: usize,
}

impl FileTokens {
    pub fn new(tokens: Vec<Token>) -> FileTokens {
        FileTokens { tokens, index: 0 }
    }

    // The token list always ends with Eof, so the index is clamped to it
    pub fn current_token(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.index.min(last)]
    }

    pub fn current_token_kind(&self) -> &TokenKind {
        &self.current_token().kind
    }

    pub fn current_location(&self) -> TextLocation {
        self.current_token().location
    }

    /// Location of the last consumed token. Used to close statement spans.
    pub fn previous_location(&self) -> TextLocation {
        match self.index.checked_sub(1).and_then(|index| self.tokens.get(index)) {
            Some(token) => token.location,
            None => self.current_location(),
        }
    }

    pub fn peek_next_token(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index + 1).map(|token| &token.kind)
    }

    pub fn peek_nth(&self, n: usize) -> &TokenKind {
        match self.tokens.get(self.index + n) {
            Some(token) => &token.kind,
            None => &TokenKind::Eof,
        }
    }

    pub fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    /// Consumes the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current_token_kind() == kind {
            self.advance();
            return true;
        }
        false
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.current_token_kind().is_identifier(word)
    }

    pub fn eat_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.advance();
            return true;
        }
        false
    }

    pub fn newline_before(&self) -> bool {
        self.current_token().newline_before
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TokenKind {
    // Includes keywords, the parser decides what a word means in context
    Identifier(String),

    // Raw numeric text, parsed to a value by the parser
    Number(String),

    // Escapes already applied
    StringLiteral(String),

    // Raw template text between the delimiters
    TemplateNoSubstitution(String),
    TemplateHead(String),
    TemplateMiddle(String),
    TemplateTail(String),

    Regex {
        pattern: String,
        flags: String,
    },

    // Brackets
    OpenParenthesis,
    CloseParenthesis,
    OpenCurly,
    CloseCurly,
    OpenBracket,
    CloseBracket,

    // Separators
    Semicolon,
    Comma,
    Dot,
    QuestionDot,
    Ellipsis,
    Question,
    Colon,
    Arrow,

    // Assignment
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
    ExponentAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
    UnsignedShiftRightAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    AndAssign,
    OrAssign,
    NullishAssign,

    // Comparison
    Equal,
    StrictEqual,
    NotEqual,
    StrictNotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,

    // Arithmetic and bitwise
    Add,
    Subtract,
    Multiply,
    Exponent,
    Divide,
    Remainder,
    Increment,
    Decrement,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    Not,
    BitNot,
    And,
    Or,
    Nullish,

    // JSX
    JsxTagStart,        // < opening a tag
    JsxClosingTagStart, // </
    JsxTagEnd,          // > closing a tag
    JsxSelfClosingEnd,  // />
    JsxText(String),
    JsxAttributeString(String), // Raw, including the quotes

    Eof,
}

impl TokenKind {
    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, TokenKind::Identifier(id) if id == name)
    }

    /// Whether a regex literal or a JSX element can start after this token.
    pub fn allows_expression_after(&self) -> bool {
        match self {
            TokenKind::Identifier(word) => matches!(
                word.as_str(),
                "return"
                    | "typeof"
                    | "instanceof"
                    | "in"
                    | "of"
                    | "new"
                    | "delete"
                    | "void"
                    | "throw"
                    | "case"
                    | "do"
                    | "else"
                    | "yield"
                    | "await"
                    | "default"
                    | "export"
            ),
            TokenKind::Number(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::TemplateNoSubstitution(_)
            | TokenKind::TemplateTail(_)
            | TokenKind::Regex { .. }
            | TokenKind::CloseParenthesis
            | TokenKind::CloseBracket
            | TokenKind::CloseCurly
            | TokenKind::Increment
            | TokenKind::Decrement
            | TokenKind::JsxTagEnd
            | TokenKind::JsxSelfClosingEnd
            | TokenKind::JsxText(_)
            | TokenKind::JsxAttributeString(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Identifier(name) => return write!(f, "{name}"),
            TokenKind::Number(raw) => return write!(f, "{raw}"),
            TokenKind::StringLiteral(value) => return write!(f, "\"{value}\""),
            TokenKind::TemplateNoSubstitution(raw) => return write!(f, "`{raw}`"),
            TokenKind::TemplateHead(raw) => return write!(f, "`{raw}${{"),
            TokenKind::TemplateMiddle(raw) => return write!(f, "}}{raw}${{"),
            TokenKind::TemplateTail(raw) => return write!(f, "}}{raw}`"),
            TokenKind::Regex { pattern, flags } => return write!(f, "/{pattern}/{flags}"),
            TokenKind::JsxText(text) => return write!(f, "{text}"),
            TokenKind::JsxAttributeString(raw) => return write!(f, "{raw}"),
            TokenKind::OpenParenthesis => "(",
            TokenKind::CloseParenthesis => ")",
            TokenKind::OpenCurly => "{",
            TokenKind::CloseCurly => "}",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::QuestionDot => "?.",
            TokenKind::Ellipsis => "...",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "=>",
            TokenKind::Assign => "=",
            TokenKind::AddAssign => "+=",
            TokenKind::SubtractAssign => "-=",
            TokenKind::MultiplyAssign => "*=",
            TokenKind::DivideAssign => "/=",
            TokenKind::RemainderAssign => "%=",
            TokenKind::ExponentAssign => "**=",
            TokenKind::ShiftLeftAssign => "<<=",
            TokenKind::ShiftRightAssign => ">>=",
            TokenKind::UnsignedShiftRightAssign => ">>>=",
            TokenKind::BitAndAssign => "&=",
            TokenKind::BitOrAssign => "|=",
            TokenKind::BitXorAssign => "^=",
            TokenKind::AndAssign => "&&=",
            TokenKind::OrAssign => "||=",
            TokenKind::NullishAssign => "??=",
            TokenKind::Equal => "==",
            TokenKind::StrictEqual => "===",
            TokenKind::NotEqual => "!=",
            TokenKind::StrictNotEqual => "!==",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThanOrEqual => "<=",
            TokenKind::GreaterThanOrEqual => ">=",
            TokenKind::Add => "+",
            TokenKind::Subtract => "-",
            TokenKind::Multiply => "*",
            TokenKind::Exponent => "**",
            TokenKind::Divide => "/",
            TokenKind::Remainder => "%",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::ShiftLeft => "<<",
            TokenKind::ShiftRight => ">>",
            TokenKind::UnsignedShiftRight => ">>>",
            TokenKind::BitAnd => "&",
            TokenKind::BitOr => "|",
            TokenKind::BitXor => "^",
            TokenKind::Not => "!",
            TokenKind::BitNot => "~",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Nullish => "??",
            TokenKind::JsxTagStart => "<",
            TokenKind::JsxClosingTagStart => "</",
            TokenKind::JsxTagEnd => ">",
            TokenKind::JsxSelfClosingEnd => "/>",
            TokenKind::Eof => "end of file",
        };

        write!(f, "{text}")
    }
}

pub struct TokenStream<'a> {
    pub source: &'a str,
    pub byte_position: usize,
    pub position: CharPosition,
    pub start_position: CharPosition,
    pub start_byte: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            byte_position: 0,
            position: CharPosition::default(),
            start_position: CharPosition::default(),
            start_byte: 0,
        }
    }

    pub fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        if c == '\n' {
            self.position.line_number += 1;
            self.position.char_column = 0;
        } else {
            self.position.char_column += 1;
        }
        self.byte_position += c.len_utf8();
        Some(c)
    }

    pub fn peek(&self) -> Option<char> {
        self.source[self.byte_position..].chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.byte_position..].chars().nth(n)
    }

    pub fn next_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.next();
            return true;
        }
        false
    }

    pub fn starts_with(&self, text: &str) -> bool {
        self.source[self.byte_position..].starts_with(text)
    }

    pub fn new_location(&mut self) -> TextLocation {
        let location = TextLocation::new(
            self.start_position,
            self.position,
            Span {
                start: self.start_byte,
                end: self.byte_position,
            },
        );
        self.update_start_position();
        location
    }

    pub fn update_start_position(&mut self) {
        self.start_position = self.position;
        self.start_byte = self.byte_position;
    }
}
