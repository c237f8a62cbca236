use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, Expr, FunctionBody, FunctionId, LogicalOperator, MemberProp, MethodKind, ObjectPatternProp,
    ObjectProp, Pattern, PropKey, UnaryOperator, UpdateOperator,
};
use crate::compiler_frontend::codegen::js::JsEmitter;

// Precedence levels used for parenthesization.
// Binary and logical operators use their own levels from 4 to 15.
pub(crate) const PRECEDENCE_SEQUENCE: u8 = 1;
pub(crate) const PRECEDENCE_ASSIGNMENT: u8 = 2;
pub(crate) const PRECEDENCE_CONDITIONAL: u8 = 3;
pub(crate) const PRECEDENCE_PREFIX: u8 = 16;
pub(crate) const PRECEDENCE_POSTFIX: u8 = 17;
pub(crate) const PRECEDENCE_MEMBER: u8 = 18;
pub(crate) const PRECEDENCE_PRIMARY: u8 = 20;

impl<'a> JsEmitter<'a> {
    pub(crate) fn precedence(&self, expression: &Expr) -> u8 {
        match expression {
            Expr::Sequence(_) => PRECEDENCE_SEQUENCE,
            Expr::Assign { .. } | Expr::Yield { .. } | Expr::Spread(_) => PRECEDENCE_ASSIGNMENT,
            Expr::Function(function) if self.ast.function(*function).is_arrow => PRECEDENCE_ASSIGNMENT,
            Expr::Conditional { .. } => PRECEDENCE_CONDITIONAL,
            Expr::Logical { operator, .. } => operator.precedence(),
            Expr::Binary { operator, .. } => operator.precedence(),
            Expr::Unary { .. } | Expr::Await(_) => PRECEDENCE_PREFIX,
            Expr::Update { prefix: true, .. } => PRECEDENCE_PREFIX,
            Expr::Update { prefix: false, .. } => PRECEDENCE_POSTFIX,
            Expr::New { .. } | Expr::Call { .. } | Expr::Member { .. } | Expr::TaggedTemplate { .. } => {
                PRECEDENCE_MEMBER
            }
            Expr::Annotated { expression, .. } => self.precedence(expression),
            _ => PRECEDENCE_PRIMARY,
        }
    }

    /// Emits `expression`, wrapped in parentheses if it binds looser than `min_precedence`.
    pub fn emit_expression(&mut self, expression: &Expr, min_precedence: u8) {
        let needs_parens = self.precedence(expression) < min_precedence;
        if needs_parens {
            self.emit("(");
        }

        self.emit_expression_inner(expression);

        if needs_parens {
            self.emit(")");
        }
    }

    fn emit_expression_inner(&mut self, expression: &Expr) {
        match expression {
            Expr::Identifier(name) => self.emit(name),
            Expr::This => self.emit("this"),
            Expr::Null => self.emit("null"),
            Expr::Bool(value) => self.emit(if *value { "true" } else { "false" }),
            Expr::Number(raw) => self.emit(raw),
            Expr::String(value) => self.emit(&quote_js_string(value)),
            Expr::Regex { pattern, flags } => self.emit(&format!("/{pattern}/{flags}")),

            Expr::Template { quasis, expressions } => self.emit_template(quasis, expressions),
            Expr::TaggedTemplate {
                tag,
                quasis,
                expressions,
            } => {
                self.emit_expression(tag, PRECEDENCE_MEMBER);
                self.emit_template(quasis, expressions);
            }

            Expr::Array(elements) => {
                self.emit("[");
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        self.emit(", ");
                    }
                    if let Some(element) = element {
                        self.emit_expression(element, PRECEDENCE_ASSIGNMENT);
                    }
                }
                // A trailing hole needs its own comma to survive
                if matches!(elements.last(), Some(None)) {
                    self.emit(",");
                }
                self.emit("]");
            }

            Expr::Object(props) => self.emit_object(props),
            Expr::Function(function) => self.emit_function(*function),

            Expr::Unary { operator, argument } => {
                self.emit(operator.as_str());
                let text = self.capture(|emitter| emitter.emit_expression(argument, PRECEDENCE_PREFIX));
                let needs_space = match operator {
                    UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete => true,
                    UnaryOperator::Minus => text.starts_with('-'),
                    UnaryOperator::Plus => text.starts_with('+'),
                    _ => false,
                };
                if needs_space {
                    self.emit(" ");
                }
                self.emit(&text);
            }

            Expr::Update {
                operator,
                prefix,
                argument,
            } => {
                let symbol = match operator {
                    UpdateOperator::Increment => "++",
                    UpdateOperator::Decrement => "--",
                };
                if *prefix {
                    self.emit(symbol);
                    self.emit_expression(argument, PRECEDENCE_MEMBER);
                } else {
                    self.emit_expression(argument, PRECEDENCE_MEMBER);
                    self.emit(symbol);
                }
            }

            Expr::Binary {
                operator,
                left,
                right,
            } => {
                let precedence = operator.precedence();
                let (left_min, right_min) = match operator {
                    // Right associative, and a unary operand on the left must be parenthesized
                    BinaryOperator::Exponent => (PRECEDENCE_POSTFIX, precedence),
                    _ => (precedence, precedence + 1),
                };
                self.emit_expression(left, left_min);
                self.emit(" ");
                self.emit(operator.as_str());
                self.emit(" ");
                self.emit_expression(right, right_min);
            }

            Expr::Logical {
                operator,
                left,
                right,
            } => {
                let precedence = operator.precedence();
                self.emit_logical_operand(*operator, left, precedence);
                self.emit(" ");
                self.emit(operator.as_str());
                self.emit(" ");
                self.emit_logical_operand(*operator, right, precedence + 1);
            }

            Expr::Assign {
                operator,
                target,
                value,
            } => {
                self.emit_pattern(target);
                self.emit(" ");
                self.emit(operator.as_str());
                self.emit(" ");
                self.emit_expression(value, PRECEDENCE_ASSIGNMENT);
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.emit_expression(test, PRECEDENCE_CONDITIONAL + 1);
                self.emit(" ? ");
                self.emit_expression(consequent, PRECEDENCE_ASSIGNMENT);
                self.emit(" : ");
                self.emit_expression(alternate, PRECEDENCE_ASSIGNMENT);
            }

            Expr::Call {
                callee,
                arguments,
                optional,
            } => {
                self.emit_expression(callee, PRECEDENCE_MEMBER);
                if *optional {
                    self.emit("?.");
                }
                self.emit_arguments(arguments);
            }

            Expr::New { callee, arguments } => {
                self.emit("new ");
                // `new a().b()` would call the wrong thing without parentheses
                if contains_call(callee) {
                    self.emit("(");
                    self.emit_expression(callee, 0);
                    self.emit(")");
                } else {
                    self.emit_expression(callee, PRECEDENCE_MEMBER);
                }
                self.emit_arguments(arguments);
            }

            Expr::Member {
                object,
                property,
                optional,
            } => {
                if matches!(object.as_ref(), Expr::Number(_)) {
                    self.emit("(");
                    self.emit_expression(object, 0);
                    self.emit(")");
                } else {
                    self.emit_expression(object, PRECEDENCE_MEMBER);
                }

                match property {
                    MemberProp::Identifier(name) => {
                        self.emit(if *optional { "?." } else { "." });
                        self.emit(name);
                    }
                    MemberProp::Computed(property) => {
                        if *optional {
                            self.emit("?.");
                        }
                        self.emit("[");
                        self.emit_expression(property, 0);
                        self.emit("]");
                    }
                }
            }

            Expr::Sequence(expressions) => {
                for (index, inner) in expressions.iter().enumerate() {
                    if index > 0 {
                        self.emit(", ");
                    }
                    self.emit_expression(inner, PRECEDENCE_ASSIGNMENT);
                }
            }

            Expr::Spread(argument) => {
                self.emit("...");
                self.emit_expression(argument, PRECEDENCE_ASSIGNMENT);
            }

            Expr::Await(argument) => {
                self.emit("await ");
                self.emit_expression(argument, PRECEDENCE_PREFIX);
            }

            Expr::Yield { argument, delegate } => {
                self.emit(if *delegate { "yield*" } else { "yield" });
                if let Some(argument) = argument {
                    self.emit(" ");
                    self.emit_expression(argument, PRECEDENCE_ASSIGNMENT);
                }
            }

            Expr::JsxElement(element) => self.emit_jsx_element(element),
            Expr::JsxFragment(children) => {
                self.emit("<>");
                self.emit_jsx_children(children);
                self.emit("</>");
            }

            Expr::Annotated { comment, expression } => {
                self.emit("/*");
                self.emit(comment);
                self.emit("*/ ");
                self.emit_expression_inner(expression);
            }
        }
    }

    // `??` can't be mixed with `&&` or `||` without parentheses
    fn emit_logical_operand(&mut self, parent: LogicalOperator, operand: &Expr, min_precedence: u8) {
        let mixes_nullish = match operand {
            Expr::Logical { operator, .. } => {
                (*operator == LogicalOperator::Nullish) != (parent == LogicalOperator::Nullish)
            }
            _ => false,
        };

        if mixes_nullish {
            self.emit("(");
            self.emit_expression(operand, 0);
            self.emit(")");
        } else {
            self.emit_expression(operand, min_precedence);
        }
    }

    fn emit_arguments(&mut self, arguments: &[Expr]) {
        self.emit("(");
        for (index, argument) in arguments.iter().enumerate() {
            if index > 0 {
                self.emit(", ");
            }
            self.emit_expression(argument, PRECEDENCE_ASSIGNMENT);
        }
        self.emit(")");
    }

    fn emit_template(&mut self, quasis: &[String], expressions: &[Expr]) {
        self.emit("`");
        for (index, quasi) in quasis.iter().enumerate() {
            self.emit(quasi);
            if let Some(expression) = expressions.get(index) {
                self.emit("${");
                self.emit_expression(expression, 0);
                self.emit("}");
            }
        }
        self.emit("`");
    }

    fn emit_object(&mut self, props: &[ObjectProp]) {
        if props.is_empty() {
            self.emit("{}");
            return;
        }

        self.emit("{ ");
        for (index, prop) in props.iter().enumerate() {
            if index > 0 {
                self.emit(", ");
            }

            match prop {
                ObjectProp::KeyValue { key, value } => {
                    self.emit_property_key(key);
                    self.emit(": ");
                    self.emit_expression(value, PRECEDENCE_ASSIGNMENT);
                }
                ObjectProp::Shorthand(name) => self.emit(name),
                ObjectProp::Method {
                    key,
                    kind,
                    function,
                } => {
                    let ast = self.ast;
                    let function_node = ast.function(*function);
                    match kind {
                        MethodKind::Getter => self.emit("get "),
                        MethodKind::Setter => self.emit("set "),
                        MethodKind::Method => {
                            if function_node.is_async {
                                self.emit("async ");
                            }
                            if function_node.is_generator {
                                self.emit("*");
                            }
                        }
                    }
                    self.emit_property_key(key);
                    self.emit_parameters(&function_node.params);
                    self.emit(" ");
                    self.emit_function_body(&function_node.body);
                }
                ObjectProp::Spread(argument) => {
                    self.emit("...");
                    self.emit_expression(argument, PRECEDENCE_ASSIGNMENT);
                }
            }
        }
        self.emit(" }");
    }

    pub(crate) fn emit_property_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Identifier(name) => self.emit(name),
            PropKey::String(value) => self.emit(&quote_js_string(value)),
            PropKey::Number(raw) => self.emit(raw),
            PropKey::Computed(expression) => {
                self.emit("[");
                self.emit_expression(expression, PRECEDENCE_ASSIGNMENT);
                self.emit("]");
            }
        }
    }

    pub(crate) fn emit_function(&mut self, id: FunctionId) {
        let ast = self.ast;
        let function = ast.function(id);

        if function.is_async {
            self.emit("async ");
        }

        if function.is_arrow {
            self.emit_parameters(&function.params);
            self.emit(" => ");
            match &function.body {
                FunctionBody::Block(block) => self.emit_block(*block),
                FunctionBody::Expression(expression) => {
                    let text = self.capture(|emitter| {
                        emitter.emit_expression(expression, PRECEDENCE_ASSIGNMENT)
                    });
                    // An object literal body would read as a block
                    if text.starts_with('{') {
                        self.emit("(");
                        self.emit(&text);
                        self.emit(")");
                    } else {
                        self.emit(&text);
                    }
                }
            }
            return;
        }

        self.emit("function");
        if function.is_generator {
            self.emit("*");
        }
        if let Some(name) = &function.name {
            self.emit(" ");
            self.emit(name);
        }
        self.emit_parameters(&function.params);
        self.emit(" ");
        self.emit_function_body(&function.body);
    }

    fn emit_function_body(&mut self, body: &FunctionBody) {
        match body {
            FunctionBody::Block(block) => self.emit_block(*block),
            FunctionBody::Expression(expression) => {
                self.emit("{");
                self.indent();
                self.emit_indent();
                self.emit("return ");
                self.emit_expression(expression, 0);
                self.emit(";");
                self.dedent();
                self.emit_indent();
                self.emit("}");
            }
        }
    }

    pub(crate) fn emit_parameters(&mut self, params: &[Pattern]) {
        self.emit("(");
        for (index, param) in params.iter().enumerate() {
            if index > 0 {
                self.emit(", ");
            }
            self.emit_pattern(param);
        }
        self.emit(")");
    }

    pub fn emit_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Identifier(name) => self.emit(name),

            Pattern::Array(elements) => {
                self.emit("[");
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        self.emit(", ");
                    }
                    if let Some(element) = element {
                        self.emit_pattern(element);
                    }
                }
                if matches!(elements.last(), Some(None)) {
                    self.emit(",");
                }
                self.emit("]");
            }

            Pattern::Object(props) => {
                if props.is_empty() {
                    self.emit("{}");
                    return;
                }

                self.emit("{ ");
                for (index, prop) in props.iter().enumerate() {
                    if index > 0 {
                        self.emit(", ");
                    }
                    match prop {
                        ObjectPatternProp::KeyValue {
                            key,
                            value,
                            shorthand,
                        } => {
                            if *shorthand && is_shorthand_value(key, value) {
                                self.emit_pattern(value);
                            } else {
                                self.emit_property_key(key);
                                self.emit(": ");
                                self.emit_pattern(value);
                            }
                        }
                        ObjectPatternProp::Rest(rest) => {
                            self.emit("...");
                            self.emit_pattern(rest);
                        }
                    }
                }
                self.emit(" }");
            }

            Pattern::Default { target, value } => {
                self.emit_pattern(target);
                self.emit(" = ");
                self.emit_expression(value, PRECEDENCE_ASSIGNMENT);
            }

            Pattern::Rest(inner) => {
                self.emit("...");
                self.emit_pattern(inner);
            }

            Pattern::Expression(expression) => self.emit_expression(expression, PRECEDENCE_MEMBER),
        }
    }
}

// `{ a }` and `{ a = 1 }` only print short when the binding matches the key
fn is_shorthand_value(key: &PropKey, value: &Pattern) -> bool {
    let PropKey::Identifier(key) = key else {
        return false;
    };
    match value {
        Pattern::Identifier(name) => name == key,
        Pattern::Default { target, .. } => matches!(target.as_ref(), Pattern::Identifier(name) if name == key),
        _ => false,
    }
}

fn contains_call(expression: &Expr) -> bool {
    match expression {
        Expr::Call { .. } => true,
        Expr::Member { object, .. } => contains_call(object),
        Expr::TaggedTemplate { tag, .. } => contains_call(tag),
        _ => false,
    }
}

/// Double quoted JS string literal for a cooked string value.
pub fn quote_js_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');

    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}
