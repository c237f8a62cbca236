use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{FileTokens, Token, TokenKind, TokenStream};
use crate::projects::settings;
use crate::{return_syntax_error, token_log};

#[macro_export]
macro_rules! return_token {
    ($kind:expr, $stream:expr $(,)?) => {
        return Ok(Token::new($kind, $stream.new_location()))
    };
}

/// What the tokenizer is currently inside of.
/// Braces, template substitutions and JSX all nest, so these live on a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexMode {
    Code,
    Brace,
    TemplateSubstitution,
    JsxExpression,
    JsxTag { closing: bool },
    JsxChildren,
}

pub fn tokenize(source_code: &str) -> Result<FileTokens, CompilerError> {
    let initial_capacity = source_code.len() / settings::SRC_TO_TOKEN_RATIO;

    let mut tokens: Vec<Token> = Vec::with_capacity(initial_capacity);
    let mut stream = TokenStream::new(source_code);
    let mut modes = vec![LexMode::Code];

    // Hashbang lines are not part of the program
    if stream.starts_with("#!") {
        while let Some(ch) = stream.peek() {
            if ch == '\n' {
                break;
            }
            stream.next();
        }
    }

    loop {
        let previous = tokens.last().map(|token| &token.kind);
        let token = get_token(&mut stream, &mut modes, previous)?;

        token_log!(#token);

        if token.kind == TokenKind::Eof {
            if modes.len() > 1 {
                return_syntax_error!(
                    "Unexpected end of file - a brace, template literal or JSX element was never closed",
                    token.location,
                    {
                        CompilationStage => "Tokenization",
                    }
                )
            }
            tokens.push(token);
            break;
        }

        tokens.push(token);
    }

    Ok(FileTokens::new(tokens))
}

fn get_token(
    stream: &mut TokenStream,
    modes: &mut Vec<LexMode>,
    previous: Option<&TokenKind>,
) -> Result<Token, CompilerError> {
    let mode = modes.last().copied().unwrap_or(LexMode::Code);

    // Whitespace is meaningful text between JSX children
    if mode == LexMode::JsxChildren {
        return jsx_children_token(stream, modes);
    }

    let newline_before = skip_trivia(stream)?;
    stream.update_start_position();

    let current_char = match stream.next() {
        Some(ch) => ch,
        None => {
            let mut token = Token::new(TokenKind::Eof, stream.new_location());
            token.newline_before = true;
            return Ok(token);
        }
    };

    let mut token = match mode {
        LexMode::JsxTag { closing } => jsx_tag_token(current_char, closing, stream, modes)?,
        _ => code_token(current_char, stream, modes, previous)?,
    };

    token.newline_before = newline_before;
    Ok(token)
}

/// Skips whitespace and comments. Returns true if a line break was crossed.
fn skip_trivia(stream: &mut TokenStream) -> Result<bool, CompilerError> {
    let mut newline = false;

    loop {
        match stream.peek() {
            Some(ch) if ch.is_whitespace() => {
                if ch == '\n' || ch == '\u{2028}' || ch == '\u{2029}' {
                    newline = true;
                }
                stream.next();
            }

            Some('/') if stream.peek_nth(1) == Some('/') => {
                while let Some(ch) = stream.peek() {
                    if ch == '\n' {
                        break;
                    }
                    stream.next();
                }
            }

            Some('/') if stream.peek_nth(1) == Some('*') => {
                stream.update_start_position();
                stream.next();
                stream.next();

                let mut closed = false;
                while let Some(ch) = stream.next() {
                    if ch == '\n' {
                        newline = true;
                    }
                    if ch == '*' && stream.peek() == Some('/') {
                        stream.next();
                        closed = true;
                        break;
                    }
                }

                if !closed {
                    return_syntax_error!(
                        "Unterminated block comment",
                        stream.new_location(),
                        {
                            CompilationStage => "Tokenization",
                            PrimarySuggestion => "Close the comment with */",
                        }
                    )
                }
            }

            _ => return Ok(newline),
        }
    }
}

fn code_token(
    current_char: char,
    stream: &mut TokenStream,
    modes: &mut Vec<LexMode>,
    previous: Option<&TokenKind>,
) -> Result<Token, CompilerError> {
    let expression_allowed = previous.is_none_or(TokenKind::allows_expression_after);

    if is_identifier_start(current_char) {
        let mut name = String::from(current_char);
        while let Some(ch) = stream.peek() {
            if !is_identifier_continue(ch) {
                break;
            }
            name.push(ch);
            stream.next();
        }
        return_token!(TokenKind::Identifier(name), stream);
    }

    if current_char.is_ascii_digit()
        || (current_char == '.' && stream.peek().is_some_and(|ch| ch.is_ascii_digit()))
    {
        let raw = read_number(current_char, stream);
        return_token!(TokenKind::Number(raw), stream);
    }

    match current_char {
        '"' | '\'' => {
            let value = read_string(current_char, stream)?;
            return_token!(TokenKind::StringLiteral(value), stream);
        }

        '`' => {
            let (raw, substitution) = read_template_part(stream)?;
            if substitution {
                modes.push(LexMode::TemplateSubstitution);
                return_token!(TokenKind::TemplateHead(raw), stream);
            }
            return_token!(TokenKind::TemplateNoSubstitution(raw), stream);
        }

        '{' => {
            modes.push(LexMode::Brace);
            return_token!(TokenKind::OpenCurly, stream);
        }

        '}' => {
            if modes.len() <= 1 {
                return_syntax_error!(
                    "Unexpected '}' - there is no open brace to close",
                    stream.new_location(),
                    {
                        CompilationStage => "Tokenization",
                    }
                )
            }

            match modes.pop() {
                Some(LexMode::TemplateSubstitution) => {
                    let (raw, substitution) = read_template_part(stream)?;
                    if substitution {
                        modes.push(LexMode::TemplateSubstitution);
                        return_token!(TokenKind::TemplateMiddle(raw), stream);
                    }
                    return_token!(TokenKind::TemplateTail(raw), stream);
                }
                _ => return_token!(TokenKind::CloseCurly, stream),
            }
        }

        '(' => return_token!(TokenKind::OpenParenthesis, stream),
        ')' => return_token!(TokenKind::CloseParenthesis, stream),
        '[' => return_token!(TokenKind::OpenBracket, stream),
        ']' => return_token!(TokenKind::CloseBracket, stream),
        ';' => return_token!(TokenKind::Semicolon, stream),
        ',' => return_token!(TokenKind::Comma, stream),
        ':' => return_token!(TokenKind::Colon, stream),
        '~' => return_token!(TokenKind::BitNot, stream),

        '.' => {
            if stream.starts_with("..") {
                stream.next();
                stream.next();
                return_token!(TokenKind::Ellipsis, stream);
            }
            return_token!(TokenKind::Dot, stream);
        }

        '?' => {
            // a?.5:b is a conditional, not optional chaining
            if stream.peek() == Some('.') && !stream.peek_nth(1).is_some_and(|ch| ch.is_ascii_digit()) {
                stream.next();
                return_token!(TokenKind::QuestionDot, stream);
            }
            if stream.next_if('?') {
                if stream.next_if('=') {
                    return_token!(TokenKind::NullishAssign, stream);
                }
                return_token!(TokenKind::Nullish, stream);
            }
            return_token!(TokenKind::Question, stream);
        }

        '=' => {
            if stream.next_if('=') {
                if stream.next_if('=') {
                    return_token!(TokenKind::StrictEqual, stream);
                }
                return_token!(TokenKind::Equal, stream);
            }
            if stream.next_if('>') {
                return_token!(TokenKind::Arrow, stream);
            }
            return_token!(TokenKind::Assign, stream);
        }

        '!' => {
            if stream.next_if('=') {
                if stream.next_if('=') {
                    return_token!(TokenKind::StrictNotEqual, stream);
                }
                return_token!(TokenKind::NotEqual, stream);
            }
            return_token!(TokenKind::Not, stream);
        }

        '<' => {
            let starts_jsx = stream
                .peek()
                .is_some_and(|ch| ch == '>' || is_identifier_start(ch));

            if expression_allowed && starts_jsx {
                modes.push(LexMode::JsxTag { closing: false });
                return_token!(TokenKind::JsxTagStart, stream);
            }

            if stream.next_if('<') {
                if stream.next_if('=') {
                    return_token!(TokenKind::ShiftLeftAssign, stream);
                }
                return_token!(TokenKind::ShiftLeft, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::LessThanOrEqual, stream);
            }
            return_token!(TokenKind::LessThan, stream);
        }

        '>' => {
            if stream.starts_with(">>=") {
                stream.next();
                stream.next();
                stream.next();
                return_token!(TokenKind::UnsignedShiftRightAssign, stream);
            }
            if stream.starts_with(">>") {
                stream.next();
                stream.next();
                return_token!(TokenKind::UnsignedShiftRight, stream);
            }
            if stream.starts_with(">=") {
                stream.next();
                stream.next();
                return_token!(TokenKind::ShiftRightAssign, stream);
            }
            if stream.next_if('>') {
                return_token!(TokenKind::ShiftRight, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::GreaterThanOrEqual, stream);
            }
            return_token!(TokenKind::GreaterThan, stream);
        }

        '+' => {
            if stream.next_if('+') {
                return_token!(TokenKind::Increment, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::AddAssign, stream);
            }
            return_token!(TokenKind::Add, stream);
        }

        '-' => {
            if stream.next_if('-') {
                return_token!(TokenKind::Decrement, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::SubtractAssign, stream);
            }
            return_token!(TokenKind::Subtract, stream);
        }

        '*' => {
            if stream.next_if('*') {
                if stream.next_if('=') {
                    return_token!(TokenKind::ExponentAssign, stream);
                }
                return_token!(TokenKind::Exponent, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::MultiplyAssign, stream);
            }
            return_token!(TokenKind::Multiply, stream);
        }

        '/' => {
            if expression_allowed {
                let (pattern, flags) = read_regex(stream)?;
                return_token!(TokenKind::Regex { pattern, flags }, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::DivideAssign, stream);
            }
            return_token!(TokenKind::Divide, stream);
        }

        '%' => {
            if stream.next_if('=') {
                return_token!(TokenKind::RemainderAssign, stream);
            }
            return_token!(TokenKind::Remainder, stream);
        }

        '&' => {
            if stream.next_if('&') {
                if stream.next_if('=') {
                    return_token!(TokenKind::AndAssign, stream);
                }
                return_token!(TokenKind::And, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::BitAndAssign, stream);
            }
            return_token!(TokenKind::BitAnd, stream);
        }

        '|' => {
            if stream.next_if('|') {
                if stream.next_if('=') {
                    return_token!(TokenKind::OrAssign, stream);
                }
                return_token!(TokenKind::Or, stream);
            }
            if stream.next_if('=') {
                return_token!(TokenKind::BitOrAssign, stream);
            }
            return_token!(TokenKind::BitOr, stream);
        }

        '^' => {
            if stream.next_if('=') {
                return_token!(TokenKind::BitXorAssign, stream);
            }
            return_token!(TokenKind::BitXor, stream);
        }

        _ => {
            return_syntax_error!(
                format!("Unexpected character '{current_char}'"),
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    FoundToken => current_char.to_string(),
                }
            )
        }
    }
}

fn jsx_tag_token(
    current_char: char,
    closing: bool,
    stream: &mut TokenStream,
    modes: &mut Vec<LexMode>,
) -> Result<Token, CompilerError> {
    // JSX names may contain dashes (aria-label, data-testid)
    if is_identifier_start(current_char) {
        let mut name = String::from(current_char);
        while let Some(ch) = stream.peek() {
            if !is_identifier_continue(ch) && ch != '-' {
                break;
            }
            name.push(ch);
            stream.next();
        }
        return_token!(TokenKind::Identifier(name), stream);
    }

    match current_char {
        '"' | '\'' => {
            let mut raw = String::from(current_char);
            loop {
                match stream.next() {
                    Some(ch) => {
                        raw.push(ch);
                        if ch == current_char {
                            break;
                        }
                    }
                    None => {
                        return_syntax_error!(
                            "Unterminated JSX attribute string",
                            stream.new_location(),
                            {
                                CompilationStage => "Tokenization",
                            }
                        )
                    }
                }
            }
            return_token!(TokenKind::JsxAttributeString(raw), stream);
        }

        '{' => {
            modes.push(LexMode::JsxExpression);
            return_token!(TokenKind::OpenCurly, stream);
        }

        '>' => {
            modes.pop();
            if closing {
                // Closing tag also ends the children of its element
                if modes.last() == Some(&LexMode::JsxChildren) {
                    modes.pop();
                }
            } else {
                modes.push(LexMode::JsxChildren);
            }
            return_token!(TokenKind::JsxTagEnd, stream);
        }

        '/' if stream.peek() == Some('>') => {
            stream.next();
            modes.pop();
            return_token!(TokenKind::JsxSelfClosingEnd, stream);
        }

        // Element as an attribute value: label=<b>text</b>
        '<' => {
            modes.push(LexMode::JsxTag { closing: false });
            return_token!(TokenKind::JsxTagStart, stream);
        }

        '=' => return_token!(TokenKind::Assign, stream),
        ':' => return_token!(TokenKind::Colon, stream),
        '.' => return_token!(TokenKind::Dot, stream),

        _ => {
            return_syntax_error!(
                format!("Unexpected character '{current_char}' inside a JSX tag"),
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    FoundToken => current_char.to_string(),
                }
            )
        }
    }
}

fn jsx_children_token(
    stream: &mut TokenStream,
    modes: &mut Vec<LexMode>,
) -> Result<Token, CompilerError> {
    stream.update_start_position();

    match stream.peek() {
        None => {
            return_syntax_error!(
                "Unexpected end of file inside JSX children",
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => "Add the missing closing tag",
                }
            )
        }

        Some('<') => {
            stream.next();
            if stream.next_if('/') {
                modes.push(LexMode::JsxTag { closing: true });
                return_token!(TokenKind::JsxClosingTagStart, stream);
            }
            modes.push(LexMode::JsxTag { closing: false });
            return_token!(TokenKind::JsxTagStart, stream);
        }

        Some('{') => {
            stream.next();
            modes.push(LexMode::JsxExpression);
            return_token!(TokenKind::OpenCurly, stream);
        }

        Some(_) => {
            let mut text = String::new();
            while let Some(ch) = stream.peek() {
                if ch == '<' || ch == '{' {
                    break;
                }
                text.push(ch);
                stream.next();
            }
            return_token!(TokenKind::JsxText(text), stream);
        }
    }
}

fn read_number(first: char, stream: &mut TokenStream) -> String {
    let mut raw = String::from(first);

    if first == '0' && stream.peek().is_some_and(|ch| matches!(ch, 'x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
        if let Some(prefix) = stream.next() {
            raw.push(prefix);
        }
        while let Some(ch) = stream.peek() {
            if !(ch.is_ascii_hexdigit() || ch == '_') {
                break;
            }
            raw.push(ch);
            stream.next();
        }
    } else {
        let mut seen_dot = first == '.';
        let mut seen_exponent = false;

        while let Some(ch) = stream.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                raw.push(ch);
                stream.next();
            } else if ch == '.' && !seen_dot && !seen_exponent {
                seen_dot = true;
                raw.push(ch);
                stream.next();
            } else if (ch == 'e' || ch == 'E') && !seen_exponent {
                seen_exponent = true;
                raw.push(ch);
                stream.next();
                if let Some(sign) = stream.peek() {
                    if sign == '+' || sign == '-' {
                        raw.push(sign);
                        stream.next();
                    }
                }
            } else {
                break;
            }
        }
    }

    // BigInt suffix
    if stream.next_if('n') {
        raw.push('n');
    }

    raw
}

fn read_string(quote: char, stream: &mut TokenStream) -> Result<String, CompilerError> {
    let mut value = String::new();

    loop {
        let Some(ch) = stream.next() else {
            return_syntax_error!(
                "Unterminated string literal",
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => format!("Add a closing {quote}"),
                }
            )
        };

        if ch == quote {
            return Ok(value);
        }

        if ch == '\n' {
            return_syntax_error!(
                "String literals can't span multiple lines",
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => "Use a template literal for multi-line strings",
                }
            )
        }

        if ch != '\\' {
            value.push(ch);
            continue;
        }

        let Some(escaped) = stream.next() else {
            continue;
        };

        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' => value.push('\0'),
            // Line continuation
            '\n' => {}
            'x' => {
                let hex: String = (0..2).filter_map(|_| stream.next()).collect();
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    value.push(c);
                }
            }
            'u' => {
                let hex: String = if stream.next_if('{') {
                    let mut digits = String::new();
                    while let Some(c) = stream.next() {
                        if c == '}' {
                            break;
                        }
                        digits.push(c);
                    }
                    digits
                } else {
                    (0..4).filter_map(|_| stream.next()).collect()
                };
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    value.push(c);
                }
            }
            other => value.push(other),
        }
    }
}

/// Reads template text up to the closing backtick or the next `${`.
/// Returns the raw text and whether a substitution follows.
fn read_template_part(stream: &mut TokenStream) -> Result<(String, bool), CompilerError> {
    let mut raw = String::new();

    loop {
        let Some(ch) = stream.next() else {
            return_syntax_error!(
                "Unterminated template literal - missing closing backtick",
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => "Add a closing backtick at the end of the template",
                }
            )
        };

        match ch {
            '`' => return Ok((raw, false)),
            '$' if stream.peek() == Some('{') => {
                stream.next();
                return Ok((raw, true));
            }
            '\\' => {
                raw.push(ch);
                if let Some(escaped) = stream.next() {
                    raw.push(escaped);
                }
            }
            _ => raw.push(ch),
        }
    }
}

fn read_regex(stream: &mut TokenStream) -> Result<(String, String), CompilerError> {
    let mut pattern = String::new();
    let mut in_class = false;

    loop {
        let Some(ch) = stream.next() else {
            return_syntax_error!(
                "Unterminated regular expression",
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                }
            )
        };

        match ch {
            '\n' => {
                return_syntax_error!(
                    "Unterminated regular expression",
                    stream.new_location(),
                    {
                        CompilationStage => "Tokenization",
                    }
                )
            }
            '\\' => {
                pattern.push(ch);
                if let Some(escaped) = stream.next() {
                    pattern.push(escaped);
                }
            }
            '[' => {
                in_class = true;
                pattern.push(ch);
            }
            ']' => {
                in_class = false;
                pattern.push(ch);
            }
            '/' if !in_class => break,
            _ => pattern.push(ch),
        }
    }

    let mut flags = String::new();
    while let Some(ch) = stream.peek() {
        if !is_identifier_continue(ch) {
            break;
        }
        flags.push(ch);
        stream.next();
    }

    Ok((pattern, flags))
}

pub fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

pub fn is_identifier_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200c}' || ch == '\u{200d}'
}

pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_continue),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/tokenizer_tests.rs"]
mod tests;
