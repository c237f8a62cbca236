use crate::compiler_frontend::ast::ast_nodes::{
    Expr, Function, FunctionBody, FunctionId, Pattern, StmtId, StmtKind,
};
use crate::compiler_frontend::ast::build_ast::Parser;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use crate::{ast_log, return_syntax_error};

impl<'a> Parser<'a> {
    /// `function name(params) { body }`, with `async` already consumed when `is_async` is set.
    pub(crate) fn parse_function_declaration(&mut self, is_async: bool) -> Result<StmtId, CompilerError> {
        let start = self.location();
        let function = self.parse_function(is_async, true)?;
        Ok(self.add_statement(StmtKind::FunctionDecl(function), start))
    }

    /// Parses from the `function` keyword onwards.
    pub(crate) fn parse_function(
        &mut self,
        is_async: bool,
        requires_name: bool,
    ) -> Result<FunctionId, CompilerError> {
        self.expect_word("function", "Function Parsing")?;
        let is_generator = self.token_stream.eat(&TokenKind::Multiply);

        let name = match self.current_kind() {
            TokenKind::Identifier(_) => Some(self.binding_identifier("Function Parsing")?),
            _ if requires_name => {
                return_syntax_error!(
                    "Function declarations need a name",
                    self.location(),
                    {
                        CompilationStage => "Function Parsing",
                    }
                )
            }
            _ => None,
        };

        ast_log!("Parsing function ", #name);

        let params = self.parse_parameters()?;
        let body = self.parse_function_body()?;

        Ok(self.ast.add_function(Function {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            is_async,
            is_generator,
        }))
    }

    /// `(a, { b }, [c] = [], ...rest)`
    pub(crate) fn parse_parameters(&mut self) -> Result<Vec<Pattern>, CompilerError> {
        self.expect(TokenKind::OpenParenthesis, "Parameter Parsing")?;

        let params = self.with_in_allowed(|parser| {
            let mut params = Vec::new();
            while parser.current_kind() != &TokenKind::CloseParenthesis {
                if parser.token_stream.eat(&TokenKind::Ellipsis) {
                    let rest = parser.parse_binding_target()?;
                    params.push(Pattern::Rest(Box::new(rest)));
                } else {
                    params.push(parser.parse_binding_element()?);
                }

                if parser.current_kind() == &TokenKind::Colon {
                    return_syntax_error!(
                        "Type annotations are not supported",
                        parser.location(),
                        {
                            CompilationStage => "Parameter Parsing",
                            PrimarySuggestion => "Compile the TypeScript to JavaScript first",
                        }
                    )
                }

                if !parser.token_stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(params)
        })?;

        self.expect(TokenKind::CloseParenthesis, "Parameter Parsing")?;
        Ok(params)
    }

    pub(crate) fn parse_function_body(&mut self) -> Result<StmtId, CompilerError> {
        self.with_in_allowed(|parser| parser.parse_block())
    }

    /// Arrow function starting at its parameters: `x => ...` or `(x, y) => ...`
    pub(crate) fn parse_arrow_function(&mut self, is_async: bool) -> Result<Expr, CompilerError> {
        let params = match self.current_kind() {
            TokenKind::OpenParenthesis => self.parse_parameters()?,
            _ => vec![Pattern::Identifier(self.binding_identifier("Arrow Function Parsing")?)],
        };

        if self.token_stream.newline_before() {
            return_syntax_error!(
                "Line break before '=>' is not allowed",
                self.location(),
                {
                    CompilationStage => "Arrow Function Parsing",
                }
            )
        }
        self.expect(TokenKind::Arrow, "Arrow Function Parsing")?;

        let body = if self.current_kind() == &TokenKind::OpenCurly {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };

        let function = self.ast.add_function(Function {
            name: None,
            params,
            body,
            is_arrow: true,
            is_async,
            is_generator: false,
        });

        Ok(Expr::Function(function))
    }
}
