use crate::compiler_frontend::ast::ast_nodes::{
    AssignOperator, DeclKind, Declarator, Expr, ObjectPatternProp, ObjectProp, Pattern, PropKey,
    StmtId, StmtKind, VarDecl,
};
use crate::compiler_frontend::ast::build_ast::Parser;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{TextLocation, TokenKind};
use crate::return_syntax_error;

impl<'a> Parser<'a> {
    pub(crate) fn parse_variable_statement(&mut self) -> Result<StmtId, CompilerError> {
        let start = self.location();
        let kind = self.parse_declaration_kind()?;
        let declaration = self.parse_declarators(kind, true)?;
        self.consume_statement_end()?;
        Ok(self.add_statement(StmtKind::VarDecl(declaration), start))
    }

    pub(crate) fn parse_declaration_kind(&mut self) -> Result<DeclKind, CompilerError> {
        let kind = match self.current_kind() {
            TokenKind::Identifier(word) if word == "var" => DeclKind::Var,
            TokenKind::Identifier(word) if word == "let" => DeclKind::Let,
            TokenKind::Identifier(word) if word == "const" => DeclKind::Const,
            _ => {
                return_syntax_error!(
                    "Expected 'var', 'let' or 'const'",
                    self.location(),
                    {
                        CompilationStage => "Declaration Parsing",
                    }
                )
            }
        };
        self.token_stream.advance();
        Ok(kind)
    }

    /// `a = 1, [b, c] = d, e`
    /// When `require_const_init` is set a const without an initializer is an error.
    /// For heads skip that check, since `for (const x of xs)` has no initializer.
    pub(crate) fn parse_declarators(
        &mut self,
        kind: DeclKind,
        require_const_init: bool,
    ) -> Result<VarDecl, CompilerError> {
        let mut declarators = Vec::new();

        loop {
            let target_location = self.location();
            let target = self.parse_binding_target()?;

            let init = if self.token_stream.eat(&TokenKind::Assign) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            if init.is_none() && require_const_init {
                check_declarator_init(kind, &target, target_location)?;
            }

            declarators.push(Declarator { target, init });

            if !self.token_stream.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok(VarDecl { kind, declarators })
    }

    /// A name or a destructuring pattern, without a default.
    pub(crate) fn parse_binding_target(&mut self) -> Result<Pattern, CompilerError> {
        match self.current_kind() {
            TokenKind::OpenBracket => self.parse_array_binding(),
            TokenKind::OpenCurly => self.parse_object_binding(),
            _ => Ok(Pattern::Identifier(
                self.binding_identifier("Declaration Parsing")?,
            )),
        }
    }

    /// A binding target with an optional `= default`.
    pub(crate) fn parse_binding_element(&mut self) -> Result<Pattern, CompilerError> {
        let target = self.parse_binding_target()?;

        if self.token_stream.eat(&TokenKind::Assign) {
            let value = self.with_in_allowed(|parser| parser.parse_assignment())?;
            return Ok(Pattern::Default {
                target: Box::new(target),
                value: Box::new(value),
            });
        }

        Ok(target)
    }

    fn parse_array_binding(&mut self) -> Result<Pattern, CompilerError> {
        self.expect(TokenKind::OpenBracket, "Pattern Parsing")?;
        let mut elements = Vec::new();

        loop {
            match self.current_kind() {
                TokenKind::CloseBracket => break,
                TokenKind::Comma => {
                    self.token_stream.advance();
                    elements.push(None);
                    continue;
                }
                TokenKind::Ellipsis => {
                    self.token_stream.advance();
                    let rest = self.parse_binding_target()?;
                    elements.push(Some(Pattern::Rest(Box::new(rest))));
                }
                _ => elements.push(Some(self.parse_binding_element()?)),
            }

            if !self.token_stream.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::CloseBracket, "Pattern Parsing")?;
        Ok(Pattern::Array(elements))
    }

    fn parse_object_binding(&mut self) -> Result<Pattern, CompilerError> {
        self.expect(TokenKind::OpenCurly, "Pattern Parsing")?;
        let mut props = Vec::new();

        while self.current_kind() != &TokenKind::CloseCurly {
            if self.token_stream.eat(&TokenKind::Ellipsis) {
                let rest = self.parse_binding_target()?;
                props.push(ObjectPatternProp::Rest(rest));
            } else {
                let shorthand_name = match self.current_kind() {
                    TokenKind::Identifier(name) => Some(name.to_owned()),
                    _ => None,
                };

                let key = self.parse_property_key()?;

                if self.token_stream.eat(&TokenKind::Colon) {
                    let value = self.parse_binding_element()?;
                    props.push(ObjectPatternProp::KeyValue {
                        key,
                        value,
                        shorthand: false,
                    });
                } else {
                    let Some(name) = shorthand_name else {
                        return_syntax_error!(
                            "Expected ':' after a non-identifier key in an object pattern",
                            self.location(),
                            {
                                CompilationStage => "Pattern Parsing",
                            }
                        )
                    };

                    self.ast.register_name(&name);
                    let mut value = Pattern::Identifier(name);
                    if self.token_stream.eat(&TokenKind::Assign) {
                        let default = self.with_in_allowed(|parser| parser.parse_assignment())?;
                        value = Pattern::Default {
                            target: Box::new(value),
                            value: Box::new(default),
                        };
                    }

                    props.push(ObjectPatternProp::KeyValue {
                        key,
                        value,
                        shorthand: true,
                    });
                }
            }

            if !self.token_stream.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::CloseCurly, "Pattern Parsing")?;
        Ok(Pattern::Object(props))
    }

    /// Object keys: `a`, `"a"`, `1`, `[expr]`
    pub(crate) fn parse_property_key(&mut self) -> Result<PropKey, CompilerError> {
        let key = match self.current_kind() {
            TokenKind::Identifier(name) => PropKey::Identifier(name.to_owned()),
            TokenKind::StringLiteral(value) => PropKey::String(value.to_owned()),
            TokenKind::Number(raw) => PropKey::Number(raw.to_owned()),
            TokenKind::OpenBracket => {
                self.token_stream.advance();
                let expression = self.with_in_allowed(|parser| parser.parse_assignment())?;
                self.expect(TokenKind::CloseBracket, "Property Key Parsing")?;
                return Ok(PropKey::Computed(Box::new(expression)));
            }
            _ => {
                let found = self.current_kind().to_string();
                return_syntax_error!(
                    format!("Expected a property key but found '{found}'"),
                    self.location(),
                    {
                        CompilationStage => "Property Key Parsing",
                        FoundToken => found,
                    }
                )
            }
        };

        self.token_stream.advance();
        Ok(key)
    }
}

fn check_declarator_init(
    kind: DeclKind,
    target: &Pattern,
    location: TextLocation,
) -> Result<(), CompilerError> {
    if kind == DeclKind::Const {
        return_syntax_error!(
            "Missing initializer in const declaration",
            location,
            {
                CompilationStage => "Declaration Parsing",
                PrimarySuggestion => "Give the constant a value with '='",
            }
        )
    }

    if !matches!(target, Pattern::Identifier(_)) {
        return_syntax_error!(
            "Destructuring declarations need an initializer",
            location,
            {
                CompilationStage => "Declaration Parsing",
            }
        )
    }

    Ok(())
}

/// Reinterprets an already parsed expression as an assignment target.
/// `[a, b] = ...` and `({ a, b } = ...)` are parsed as literals first.
pub fn expression_to_pattern(expression: Expr, location: TextLocation) -> Result<Pattern, CompilerError> {
    match expression {
        Expr::Identifier(name) => Ok(Pattern::Identifier(name)),
        Expr::Member { .. } => Ok(Pattern::Expression(Box::new(expression))),

        Expr::Array(elements) => {
            let mut patterns = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    Some(element) => patterns.push(Some(expression_to_pattern(element, location)?)),
                    None => patterns.push(None),
                }
            }
            Ok(Pattern::Array(patterns))
        }

        Expr::Object(props) => {
            let mut patterns = Vec::with_capacity(props.len());
            for prop in props {
                let pattern = match prop {
                    ObjectProp::KeyValue { key, value } => ObjectPatternProp::KeyValue {
                        key,
                        value: expression_to_pattern(value, location)?,
                        shorthand: false,
                    },
                    ObjectProp::Shorthand(name) => ObjectPatternProp::KeyValue {
                        key: PropKey::Identifier(name.clone()),
                        value: Pattern::Identifier(name),
                        shorthand: true,
                    },
                    ObjectProp::Spread(inner) => {
                        ObjectPatternProp::Rest(expression_to_pattern(inner, location)?)
                    }
                    ObjectProp::Method { .. } => {
                        return_syntax_error!(
                            "Methods can't be assignment targets",
                            location,
                            {
                                CompilationStage => "Pattern Parsing",
                            }
                        )
                    }
                };
                patterns.push(pattern);
            }

            // `{ a = 1 } = obj` arrives as a shorthand key with an assignment value
            for pattern in &mut patterns {
                if let ObjectPatternProp::KeyValue {
                    key: PropKey::Identifier(key),
                    value: Pattern::Default { target, .. },
                    shorthand,
                } = pattern
                {
                    if matches!(target.as_ref(), Pattern::Identifier(name) if name == key) {
                        *shorthand = true;
                    }
                }
            }

            Ok(Pattern::Object(patterns))
        }

        Expr::Assign {
            operator: AssignOperator::Assign,
            target,
            value,
        } => Ok(Pattern::Default { target, value }),

        Expr::Spread(inner) => Ok(Pattern::Rest(Box::new(expression_to_pattern(*inner, location)?))),

        _ => {
            return_syntax_error!(
                "Invalid assignment target",
                location,
                {
                    CompilationStage => "Pattern Parsing",
                    PrimarySuggestion => "Only names, member expressions and destructuring patterns can be assigned to",
                }
            )
        }
    }
}
