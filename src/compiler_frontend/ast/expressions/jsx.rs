use crate::compiler_frontend::ast::ast_nodes::{
    Expr, JsxAttribute, JsxAttributeValue, JsxChild, JsxElement, JsxName,
};
use crate::compiler_frontend::ast::build_ast::Parser;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use crate::{ast_log, return_syntax_error};

impl<'a> Parser<'a> {
    /// `<Tag ...>children</Tag>`, `<Tag />` or `<>children</>`
    pub(crate) fn parse_jsx(&mut self) -> Result<Expr, CompilerError> {
        self.expect(TokenKind::JsxTagStart, "JSX Parsing")?;

        if self.token_stream.eat(&TokenKind::JsxTagEnd) {
            let children = self.parse_jsx_children()?;
            if self.current_kind() != &TokenKind::JsxTagEnd {
                return_syntax_error!(
                    "Expected '</>' to close the fragment",
                    self.location(),
                    {
                        CompilationStage => "JSX Parsing",
                    }
                )
            }
            self.token_stream.advance();
            return Ok(Expr::JsxFragment(children));
        }

        let name = self.parse_jsx_name()?;
        let mut attributes = Vec::new();

        loop {
            match self.current_kind() {
                TokenKind::JsxTagEnd | TokenKind::JsxSelfClosingEnd => break,

                TokenKind::OpenCurly => {
                    self.token_stream.advance();
                    self.expect(TokenKind::Ellipsis, "JSX Attribute Parsing")?;
                    let expression = self.with_in_allowed(|parser| parser.parse_assignment())?;
                    self.expect(TokenKind::CloseCurly, "JSX Attribute Parsing")?;
                    attributes.push(JsxAttribute::Spread(expression));
                }

                TokenKind::Identifier(_) => {
                    let mut attribute_name = self.property_name("JSX Attribute Parsing")?;
                    if self.token_stream.eat(&TokenKind::Colon) {
                        let local = self.property_name("JSX Attribute Parsing")?;
                        attribute_name = format!("{attribute_name}:{local}");
                    }

                    let value = if self.token_stream.eat(&TokenKind::Assign) {
                        Some(self.parse_jsx_attribute_value()?)
                    } else {
                        None
                    };

                    attributes.push(JsxAttribute::Attribute {
                        name: attribute_name,
                        value,
                    });
                }

                other => {
                    let found = other.to_string();
                    return_syntax_error!(
                        format!("Unexpected '{found}' inside a JSX tag"),
                        self.location(),
                        {
                            CompilationStage => "JSX Attribute Parsing",
                            FoundToken => found,
                        }
                    )
                }
            }
        }

        if self.token_stream.eat(&TokenKind::JsxSelfClosingEnd) {
            return Ok(Expr::JsxElement(Box::new(JsxElement {
                name,
                attributes,
                children: Vec::new(),
                self_closing: true,
            })));
        }

        self.expect(TokenKind::JsxTagEnd, "JSX Parsing")?;
        let children = self.parse_jsx_children()?;

        let closing_location = self.location();
        let closing_name = self.parse_jsx_name()?;
        if closing_name != name {
            return_syntax_error!(
                "JSX closing tag doesn't match its opening tag",
                closing_location,
                {
                    CompilationStage => "JSX Parsing",
                    PrimarySuggestion => "Close every element with the same name it was opened with",
                }
            )
        }
        self.expect(TokenKind::JsxTagEnd, "JSX Parsing")?;

        ast_log!("Parsed JSX element ", #name);

        Ok(Expr::JsxElement(Box::new(JsxElement {
            name,
            attributes,
            children,
            self_closing: false,
        })))
    }

    fn parse_jsx_name(&mut self) -> Result<JsxName, CompilerError> {
        let first = self.property_name("JSX Parsing")?;

        if self.token_stream.eat(&TokenKind::Colon) {
            let local = self.property_name("JSX Parsing")?;
            return Ok(JsxName::Namespaced(first, local));
        }

        if self.current_kind() != &TokenKind::Dot {
            self.ast.register_name(&first);
            return Ok(JsxName::Identifier(first));
        }

        self.ast.register_name(&first);
        let mut parts = vec![first];
        while self.token_stream.eat(&TokenKind::Dot) {
            parts.push(self.property_name("JSX Parsing")?);
        }

        Ok(JsxName::Member(parts))
    }

    fn parse_jsx_attribute_value(&mut self) -> Result<JsxAttributeValue, CompilerError> {
        match self.current_kind().to_owned() {
            TokenKind::JsxAttributeString(raw) => {
                self.token_stream.advance();
                Ok(JsxAttributeValue::String(raw))
            }

            TokenKind::OpenCurly => {
                self.token_stream.advance();
                let expression = self.with_in_allowed(|parser| parser.parse_assignment())?;
                self.expect(TokenKind::CloseCurly, "JSX Attribute Parsing")?;
                Ok(JsxAttributeValue::Expression(expression))
            }

            TokenKind::JsxTagStart => Ok(JsxAttributeValue::Element(self.parse_jsx()?)),

            other => {
                let found = other.to_string();
                return_syntax_error!(
                    format!("Expected an attribute value but found '{found}'"),
                    self.location(),
                    {
                        CompilationStage => "JSX Attribute Parsing",
                        FoundToken => found,
                    }
                )
            }
        }
    }

    /// Children up to and including the `</` of the closing tag.
    fn parse_jsx_children(&mut self) -> Result<Vec<JsxChild>, CompilerError> {
        let mut children = Vec::new();

        loop {
            match self.current_kind().to_owned() {
                TokenKind::JsxText(text) => {
                    self.token_stream.advance();
                    children.push(JsxChild::Text(text));
                }

                TokenKind::OpenCurly => {
                    self.token_stream.advance();

                    if self.token_stream.eat(&TokenKind::CloseCurly) {
                        children.push(JsxChild::EmptyExpression);
                        continue;
                    }

                    let spread = self.token_stream.eat(&TokenKind::Ellipsis);
                    let expression = self.with_in_allowed(|parser| parser.parse_expression())?;
                    self.expect(TokenKind::CloseCurly, "JSX Children Parsing")?;

                    children.push(if spread {
                        JsxChild::Spread(expression)
                    } else {
                        JsxChild::Expression(expression)
                    });
                }

                TokenKind::JsxTagStart => children.push(JsxChild::Element(self.parse_jsx()?)),

                TokenKind::JsxClosingTagStart => {
                    self.token_stream.advance();
                    return Ok(children);
                }

                other => {
                    let found = other.to_string();
                    return_syntax_error!(
                        format!("Unexpected '{found}' inside JSX children"),
                        self.location(),
                        {
                            CompilationStage => "JSX Children Parsing",
                            PrimarySuggestion => "Check that every JSX element has a matching closing tag",
                            FoundToken => found,
                        }
                    )
                }
            }
        }
    }
}
