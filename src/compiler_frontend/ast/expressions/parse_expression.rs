use crate::compiler_frontend::ast::ast_nodes::{
    AssignOperator, BinaryOperator, Expr, Function, FunctionBody, LogicalOperator, MemberProp,
    MethodKind, ObjectProp, Pattern, PropKey, UnaryOperator, UpdateOperator,
};
use crate::compiler_frontend::ast::build_ast::{Parser, is_reserved_word};
use crate::compiler_frontend::ast::statements::declarations::expression_to_pattern;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use crate::return_syntax_error;

// Binary and logical operators share one precedence climbing loop
#[derive(Clone, Copy)]
enum InfixOperator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

impl InfixOperator {
    fn precedence(self) -> u8 {
        match self {
            InfixOperator::Binary(operator) => operator.precedence(),
            InfixOperator::Logical(operator) => operator.precedence(),
        }
    }
}

impl<'a> Parser<'a> {
    /// Full expression, including the comma operator.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, CompilerError> {
        let first = self.parse_assignment()?;

        if self.current_kind() != &TokenKind::Comma {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.token_stream.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }

        Ok(Expr::Sequence(expressions))
    }

    pub(crate) fn parse_parenthesized_expression(&mut self, stage: &'static str) -> Result<Expr, CompilerError> {
        self.expect(TokenKind::OpenParenthesis, stage)?;
        let expression = self.with_in_allowed(|parser| parser.parse_expression())?;
        self.expect(TokenKind::CloseParenthesis, stage)?;
        Ok(expression)
    }

    pub(crate) fn parse_assignment(&mut self) -> Result<Expr, CompilerError> {
        let start = self.location();

        match self.current_kind() {
            TokenKind::Identifier(word) if word == "yield" => return self.parse_yield(),

            TokenKind::Identifier(word)
                if word == "async"
                    && matches!(self.token_stream.peek_next_token(), Some(TokenKind::Identifier(_)))
                    && self.token_stream.peek_nth(2) == &TokenKind::Arrow =>
            {
                self.token_stream.advance();
                return self.parse_arrow_function(true);
            }

            TokenKind::Identifier(word)
                if word == "async"
                    && self.token_stream.peek_next_token() == Some(&TokenKind::OpenParenthesis) =>
            {
                let index = self.token_stream.index;
                self.token_stream.advance();
                if self.is_arrow_ahead() {
                    return self.parse_arrow_function(true);
                }
                // Plain call to something named async
                self.token_stream.index = index;
            }

            TokenKind::Identifier(word)
                if !is_reserved_word(word) && self.token_stream.peek_next_token() == Some(&TokenKind::Arrow) =>
            {
                return self.parse_arrow_function(false);
            }

            TokenKind::OpenParenthesis if self.is_arrow_ahead() => {
                return self.parse_arrow_function(false);
            }

            _ => {}
        }

        let left = self.parse_conditional()?;

        let Some(operator) = assignment_operator(self.current_kind()) else {
            return Ok(left);
        };

        if operator != AssignOperator::Assign && !matches!(left, Expr::Identifier(_) | Expr::Member { .. }) {
            return_syntax_error!(
                "Invalid left-hand side in compound assignment",
                self.location_from(start),
                {
                    CompilationStage => "Expression Parsing",
                }
            )
        }

        let target = expression_to_pattern(left, self.location_from(start))?;
        self.token_stream.advance();
        let value = self.parse_assignment()?;

        Ok(Expr::Assign {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_yield(&mut self) -> Result<Expr, CompilerError> {
        self.expect_word("yield", "Expression Parsing")?;
        let delegate = !self.token_stream.newline_before() && self.token_stream.eat(&TokenKind::Multiply);

        let ends_here = self.at_statement_end()
            || matches!(
                self.current_kind(),
                TokenKind::CloseParenthesis
                    | TokenKind::CloseBracket
                    | TokenKind::Comma
                    | TokenKind::Colon
            );

        let argument = if ends_here && !delegate {
            None
        } else {
            Some(Box::new(self.parse_assignment()?))
        };

        Ok(Expr::Yield { argument, delegate })
    }

    fn parse_conditional(&mut self) -> Result<Expr, CompilerError> {
        let test = self.parse_binary(1)?;

        if !self.token_stream.eat(&TokenKind::Question) {
            return Ok(test);
        }

        let consequent = self.with_in_allowed(|parser| parser.parse_assignment())?;
        self.expect(TokenKind::Colon, "Conditional Expression Parsing")?;
        let alternate = self.parse_assignment()?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, CompilerError> {
        let mut left = self.parse_unary()?;

        while let Some(operator) = self.infix_operator() {
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }
            self.token_stream.advance();

            // ** is the only right associative binary operator
            let right = match operator {
                InfixOperator::Binary(BinaryOperator::Exponent) => self.parse_binary(precedence)?,
                _ => self.parse_binary(precedence + 1)?,
            };

            left = match operator {
                InfixOperator::Binary(operator) => Expr::binary(operator, left, right),
                InfixOperator::Logical(operator) => Expr::logical(operator, left, right),
            };
        }

        Ok(left)
    }

    fn infix_operator(&self) -> Option<InfixOperator> {
        let binary = match self.current_kind() {
            TokenKind::And => return Some(InfixOperator::Logical(LogicalOperator::And)),
            TokenKind::Or => return Some(InfixOperator::Logical(LogicalOperator::Or)),
            TokenKind::Nullish => return Some(InfixOperator::Logical(LogicalOperator::Nullish)),

            TokenKind::Equal => BinaryOperator::Equal,
            TokenKind::NotEqual => BinaryOperator::NotEqual,
            TokenKind::StrictEqual => BinaryOperator::StrictEqual,
            TokenKind::StrictNotEqual => BinaryOperator::StrictNotEqual,
            TokenKind::LessThan => BinaryOperator::LessThan,
            TokenKind::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
            TokenKind::GreaterThan => BinaryOperator::GreaterThan,
            TokenKind::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
            TokenKind::ShiftLeft => BinaryOperator::ShiftLeft,
            TokenKind::ShiftRight => BinaryOperator::ShiftRight,
            TokenKind::UnsignedShiftRight => BinaryOperator::UnsignedShiftRight,
            TokenKind::Add => BinaryOperator::Add,
            TokenKind::Subtract => BinaryOperator::Subtract,
            TokenKind::Multiply => BinaryOperator::Multiply,
            TokenKind::Divide => BinaryOperator::Divide,
            TokenKind::Remainder => BinaryOperator::Remainder,
            TokenKind::Exponent => BinaryOperator::Exponent,
            TokenKind::BitOr => BinaryOperator::BitOr,
            TokenKind::BitXor => BinaryOperator::BitXor,
            TokenKind::BitAnd => BinaryOperator::BitAnd,
            TokenKind::Identifier(word) if word == "instanceof" => BinaryOperator::Instanceof,
            TokenKind::Identifier(word) if word == "in" && !self.no_in => BinaryOperator::In,
            _ => return None,
        };

        Some(InfixOperator::Binary(binary))
    }

    fn parse_unary(&mut self) -> Result<Expr, CompilerError> {
        let operator = match self.current_kind() {
            TokenKind::Not => Some(UnaryOperator::Not),
            TokenKind::Subtract => Some(UnaryOperator::Minus),
            TokenKind::Add => Some(UnaryOperator::Plus),
            TokenKind::BitNot => Some(UnaryOperator::BitNot),
            TokenKind::Identifier(word) if word == "typeof" => Some(UnaryOperator::Typeof),
            TokenKind::Identifier(word) if word == "void" => Some(UnaryOperator::Void),
            TokenKind::Identifier(word) if word == "delete" => Some(UnaryOperator::Delete),
            _ => None,
        };

        if let Some(operator) = operator {
            self.token_stream.advance();
            let argument = self.parse_unary()?;
            return Ok(Expr::Unary {
                operator,
                argument: Box::new(argument),
            });
        }

        let update = match self.current_kind() {
            TokenKind::Increment => Some(UpdateOperator::Increment),
            TokenKind::Decrement => Some(UpdateOperator::Decrement),
            _ => None,
        };

        if let Some(operator) = update {
            self.token_stream.advance();
            let argument = self.parse_unary()?;
            return Ok(Expr::Update {
                operator,
                prefix: true,
                argument: Box::new(argument),
            });
        }

        if self.token_stream.is_word("await")
            && !matches!(
                self.token_stream.peek_next_token(),
                Some(
                    TokenKind::Assign
                        | TokenKind::Dot
                        | TokenKind::Arrow
                        | TokenKind::CloseParenthesis
                        | TokenKind::CloseBracket
                        | TokenKind::CloseCurly
                        | TokenKind::Comma
                        | TokenKind::Semicolon
                        | TokenKind::Colon
                )
            )
        {
            self.token_stream.advance();
            let argument = self.parse_unary()?;
            return Ok(Expr::Await(Box::new(argument)));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompilerError> {
        let expression = self.parse_left_hand_side()?;

        // a line break before ++ starts a new statement
        if self.token_stream.newline_before() {
            return Ok(expression);
        }

        let operator = match self.current_kind() {
            TokenKind::Increment => UpdateOperator::Increment,
            TokenKind::Decrement => UpdateOperator::Decrement,
            _ => return Ok(expression),
        };

        self.token_stream.advance();
        Ok(Expr::Update {
            operator,
            prefix: false,
            argument: Box::new(expression),
        })
    }

    fn parse_left_hand_side(&mut self) -> Result<Expr, CompilerError> {
        let expression = if self.token_stream.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        self.parse_member_suffixes(expression, true)
    }

    fn parse_new(&mut self) -> Result<Expr, CompilerError> {
        self.expect_word("new", "Expression Parsing")?;

        // new.target
        if self.token_stream.eat(&TokenKind::Dot) {
            let property = self.property_name("Expression Parsing")?;
            return Ok(Expr::member(Expr::identifier("new"), &property));
        }

        let callee = if self.token_stream.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let callee = self.parse_member_suffixes(callee, false)?;

        let arguments = if self.current_kind() == &TokenKind::OpenParenthesis {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expr::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    /// `.a`, `?.a`, `[a]`, `(args)` and tagged templates after a primary expression.
    fn parse_member_suffixes(&mut self, mut expression: Expr, allow_call: bool) -> Result<Expr, CompilerError> {
        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.token_stream.advance();
                    let property = self.property_name("Member Access Parsing")?;
                    expression = Expr::Member {
                        object: Box::new(expression),
                        property: MemberProp::Identifier(property),
                        optional: false,
                    };
                }

                TokenKind::QuestionDot => {
                    self.token_stream.advance();
                    expression = match self.current_kind() {
                        TokenKind::OpenParenthesis if allow_call => Expr::Call {
                            callee: Box::new(expression),
                            arguments: self.parse_arguments()?,
                            optional: true,
                        },
                        TokenKind::OpenBracket => {
                            self.token_stream.advance();
                            let property = self.with_in_allowed(|parser| parser.parse_expression())?;
                            self.expect(TokenKind::CloseBracket, "Member Access Parsing")?;
                            Expr::Member {
                                object: Box::new(expression),
                                property: MemberProp::Computed(Box::new(property)),
                                optional: true,
                            }
                        }
                        _ => Expr::Member {
                            object: Box::new(expression),
                            property: MemberProp::Identifier(self.property_name("Member Access Parsing")?),
                            optional: true,
                        },
                    };
                }

                TokenKind::OpenBracket => {
                    self.token_stream.advance();
                    let property = self.with_in_allowed(|parser| parser.parse_expression())?;
                    self.expect(TokenKind::CloseBracket, "Member Access Parsing")?;
                    expression = Expr::computed_member(expression, property);
                }

                TokenKind::OpenParenthesis if allow_call => {
                    expression = Expr::Call {
                        callee: Box::new(expression),
                        arguments: self.parse_arguments()?,
                        optional: false,
                    };
                }

                TokenKind::TemplateNoSubstitution(_) | TokenKind::TemplateHead(_) => {
                    let (quasis, expressions) = self.parse_template_parts()?;
                    expression = Expr::TaggedTemplate {
                        tag: Box::new(expression),
                        quasis,
                        expressions,
                    };
                }

                _ => return Ok(expression),
            }
        }
    }

    pub(crate) fn parse_arguments(&mut self) -> Result<Vec<Expr>, CompilerError> {
        self.expect(TokenKind::OpenParenthesis, "Argument Parsing")?;

        let arguments = self.with_in_allowed(|parser| {
            let mut arguments = Vec::new();
            while parser.current_kind() != &TokenKind::CloseParenthesis {
                if parser.token_stream.eat(&TokenKind::Ellipsis) {
                    arguments.push(Expr::Spread(Box::new(parser.parse_assignment()?)));
                } else {
                    arguments.push(parser.parse_assignment()?);
                }

                if !parser.token_stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(arguments)
        })?;

        self.expect(TokenKind::CloseParenthesis, "Argument Parsing")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompilerError> {
        let location = self.location();

        match self.current_kind().to_owned() {
            TokenKind::Identifier(word) => match word.as_str() {
                "this" => {
                    self.token_stream.advance();
                    Ok(Expr::This)
                }
                "null" => {
                    self.token_stream.advance();
                    Ok(Expr::Null)
                }
                "true" | "false" => {
                    self.token_stream.advance();
                    Ok(Expr::Bool(word == "true"))
                }
                "function" => Ok(Expr::Function(self.parse_function(false, false)?)),
                "async"
                    if self.token_stream.peek_next_token()
                        == Some(&TokenKind::Identifier(String::from("function"))) =>
                {
                    self.token_stream.advance();
                    Ok(Expr::Function(self.parse_function(true, false)?))
                }
                "class" => {
                    return_syntax_error!(
                        "Class expressions are not supported",
                        location,
                        {
                            CompilationStage => "Expression Parsing",
                        }
                    )
                }
                // super(...) and import(...) behave like plain callees here
                "super" | "import" => {
                    self.token_stream.advance();
                    Ok(Expr::Identifier(word))
                }
                _ if is_reserved_word(&word) => {
                    return_syntax_error!(
                        format!("Unexpected keyword '{word}'"),
                        location,
                        {
                            CompilationStage => "Expression Parsing",
                            FoundToken => word,
                        }
                    )
                }
                _ => {
                    self.ast.register_name(&word);
                    self.token_stream.advance();
                    Ok(Expr::Identifier(word))
                }
            },

            TokenKind::Number(raw) => {
                self.token_stream.advance();
                Ok(Expr::Number(raw))
            }

            TokenKind::StringLiteral(value) => {
                self.token_stream.advance();
                Ok(Expr::String(value))
            }

            TokenKind::TemplateNoSubstitution(_) | TokenKind::TemplateHead(_) => {
                let (quasis, expressions) = self.parse_template_parts()?;
                Ok(Expr::Template { quasis, expressions })
            }

            TokenKind::Regex { pattern, flags } => {
                self.token_stream.advance();
                Ok(Expr::Regex { pattern, flags })
            }

            TokenKind::OpenParenthesis => self.parse_parenthesized_expression("Expression Parsing"),
            TokenKind::OpenBracket => self.parse_array_literal(),
            TokenKind::OpenCurly => self.parse_object_literal(),
            TokenKind::JsxTagStart => self.parse_jsx(),

            other => {
                let found = other.to_string();
                return_syntax_error!(
                    format!("Unexpected token '{found}' in expression"),
                    location,
                    {
                        CompilationStage => "Expression Parsing",
                        FoundToken => found,
                    }
                )
            }
        }
    }

    /// Template literal pieces: the raw quasis and the substituted expressions between them.
    fn parse_template_parts(&mut self) -> Result<(Vec<String>, Vec<Expr>), CompilerError> {
        match self.current_kind().to_owned() {
            TokenKind::TemplateNoSubstitution(raw) => {
                self.token_stream.advance();
                Ok((vec![raw], Vec::new()))
            }

            TokenKind::TemplateHead(raw) => {
                self.token_stream.advance();
                let mut quasis = vec![raw];
                let mut expressions = Vec::new();

                loop {
                    expressions.push(self.with_in_allowed(|parser| parser.parse_expression())?);

                    match self.current_kind().to_owned() {
                        TokenKind::TemplateMiddle(raw) => {
                            self.token_stream.advance();
                            quasis.push(raw);
                        }
                        TokenKind::TemplateTail(raw) => {
                            self.token_stream.advance();
                            quasis.push(raw);
                            return Ok((quasis, expressions));
                        }
                        other => {
                            let found = other.to_string();
                            return_syntax_error!(
                                format!("Expected the end of a template substitution but found '{found}'"),
                                self.location(),
                                {
                                    CompilationStage => "Template Parsing",
                                    FoundToken => found,
                                }
                            )
                        }
                    }
                }
            }

            other => {
                let found = other.to_string();
                return_syntax_error!(
                    format!("Expected a template literal but found '{found}'"),
                    self.location(),
                    {
                        CompilationStage => "Template Parsing",
                        FoundToken => found,
                    }
                )
            }
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, CompilerError> {
        self.expect(TokenKind::OpenBracket, "Array Parsing")?;

        let elements = self.with_in_allowed(|parser| {
            let mut elements = Vec::new();
            loop {
                match parser.current_kind() {
                    TokenKind::CloseBracket => break,
                    TokenKind::Comma => {
                        parser.token_stream.advance();
                        elements.push(None);
                        continue;
                    }
                    TokenKind::Ellipsis => {
                        parser.token_stream.advance();
                        elements.push(Some(Expr::Spread(Box::new(parser.parse_assignment()?))));
                    }
                    _ => elements.push(Some(parser.parse_assignment()?)),
                }

                if !parser.token_stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(elements)
        })?;

        self.expect(TokenKind::CloseBracket, "Array Parsing")?;
        Ok(Expr::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, CompilerError> {
        self.expect(TokenKind::OpenCurly, "Object Parsing")?;

        let props = self.with_in_allowed(|parser| {
            let mut props = Vec::new();
            while parser.current_kind() != &TokenKind::CloseCurly {
                props.push(parser.parse_object_property()?);
                if !parser.token_stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(props)
        })?;

        self.expect(TokenKind::CloseCurly, "Object Parsing")?;
        Ok(Expr::Object(props))
    }

    fn parse_object_property(&mut self) -> Result<ObjectProp, CompilerError> {
        if self.token_stream.eat(&TokenKind::Ellipsis) {
            return Ok(ObjectProp::Spread(self.parse_assignment()?));
        }

        // `async`, `get` and `set` are modifiers only when another key follows them
        let modifier_applies = |parser: &Self| {
            !matches!(
                parser.token_stream.peek_next_token(),
                Some(
                    TokenKind::OpenParenthesis
                        | TokenKind::Colon
                        | TokenKind::Comma
                        | TokenKind::CloseCurly
                        | TokenKind::Assign
                )
            )
        };

        let is_async = self.token_stream.is_word("async") && modifier_applies(&*self);
        if is_async {
            self.token_stream.advance();
        }
        let is_generator = self.token_stream.eat(&TokenKind::Multiply);

        let mut kind = MethodKind::Method;
        if !is_async && !is_generator && modifier_applies(&*self) {
            if self.token_stream.is_word("get") {
                kind = MethodKind::Getter;
                self.token_stream.advance();
            } else if self.token_stream.is_word("set") {
                kind = MethodKind::Setter;
                self.token_stream.advance();
            }
        }

        let shorthand_name = match self.current_kind() {
            TokenKind::Identifier(name) if !is_reserved_word(name) => Some(name.to_owned()),
            _ => None,
        };

        let location = self.location();
        let key = self.parse_property_key()?;

        if self.current_kind() == &TokenKind::OpenParenthesis {
            let params = self.parse_parameters()?;
            let body = self.parse_function_body()?;
            let function = self.ast.add_function(Function {
                name: None,
                params,
                body: FunctionBody::Block(body),
                is_arrow: false,
                is_async,
                is_generator,
            });
            return Ok(ObjectProp::Method { key, kind, function });
        }

        if is_async || is_generator || kind != MethodKind::Method {
            return_syntax_error!(
                "Expected '(' after a method name",
                self.location(),
                {
                    CompilationStage => "Object Parsing",
                }
            )
        }

        if self.token_stream.eat(&TokenKind::Colon) {
            return Ok(ObjectProp::KeyValue {
                key,
                value: self.parse_assignment()?,
            });
        }

        let Some(name) = shorthand_name else {
            return_syntax_error!(
                "Expected ':' after an object key",
                location,
                {
                    CompilationStage => "Object Parsing",
                }
            )
        };

        self.ast.register_name(&name);

        // `{ a = 1 }` is only valid once the object turns out to be a pattern
        if self.token_stream.eat(&TokenKind::Assign) {
            let default = self.parse_assignment()?;
            return Ok(ObjectProp::KeyValue {
                key: PropKey::Identifier(name.clone()),
                value: Expr::assign(Pattern::Identifier(name), default),
            });
        }

        Ok(ObjectProp::Shorthand(name))
    }
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignOperator> {
    let operator = match kind {
        TokenKind::Assign => AssignOperator::Assign,
        TokenKind::AddAssign => AssignOperator::Add,
        TokenKind::SubtractAssign => AssignOperator::Subtract,
        TokenKind::MultiplyAssign => AssignOperator::Multiply,
        TokenKind::DivideAssign => AssignOperator::Divide,
        TokenKind::RemainderAssign => AssignOperator::Remainder,
        TokenKind::ExponentAssign => AssignOperator::Exponent,
        TokenKind::ShiftLeftAssign => AssignOperator::ShiftLeft,
        TokenKind::ShiftRightAssign => AssignOperator::ShiftRight,
        TokenKind::UnsignedShiftRightAssign => AssignOperator::UnsignedShiftRight,
        TokenKind::BitAndAssign => AssignOperator::BitAnd,
        TokenKind::BitOrAssign => AssignOperator::BitOr,
        TokenKind::BitXorAssign => AssignOperator::BitXor,
        TokenKind::AndAssign => AssignOperator::And,
        TokenKind::OrAssign => AssignOperator::Or,
        TokenKind::NullishAssign => AssignOperator::Nullish,
        _ => return None,
    };
    Some(operator)
}
