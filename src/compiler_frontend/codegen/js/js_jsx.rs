use crate::compiler_frontend::ast::ast_nodes::{
    JsxAttribute, JsxAttributeValue, JsxChild, JsxElement, JsxName,
};
use crate::compiler_frontend::codegen::js::JsEmitter;
use crate::compiler_frontend::codegen::js::js_expr::PRECEDENCE_ASSIGNMENT;

// JSX is printed back as JSX. Text children keep their raw source text,
// so whitespace handling stays with whatever compiles the JSX afterwards.
impl<'a> JsEmitter<'a> {
    pub(crate) fn emit_jsx_element(&mut self, element: &JsxElement) {
        let name = jsx_name_to_string(&element.name);

        self.emit("<");
        self.emit(&name);

        for attribute in &element.attributes {
            self.emit(" ");
            match attribute {
                JsxAttribute::Attribute { name, value } => {
                    self.emit(name);
                    match value {
                        Some(JsxAttributeValue::String(raw)) => {
                            self.emit("=");
                            self.emit(raw);
                        }
                        Some(JsxAttributeValue::Expression(expression)) => {
                            self.emit("={");
                            self.emit_expression(expression, PRECEDENCE_ASSIGNMENT);
                            self.emit("}");
                        }
                        Some(JsxAttributeValue::Element(expression)) => {
                            self.emit("=");
                            self.emit_expression(expression, PRECEDENCE_ASSIGNMENT);
                        }
                        None => {}
                    }
                }
                JsxAttribute::Spread(expression) => {
                    self.emit("{...");
                    self.emit_expression(expression, PRECEDENCE_ASSIGNMENT);
                    self.emit("}");
                }
            }
        }

        if element.self_closing && element.children.is_empty() {
            self.emit(" />");
            return;
        }

        self.emit(">");
        self.emit_jsx_children(&element.children);
        self.emit("</");
        self.emit(&name);
        self.emit(">");
    }

    pub(crate) fn emit_jsx_children(&mut self, children: &[JsxChild]) {
        for child in children {
            match child {
                JsxChild::Text(text) => self.emit(text),
                JsxChild::Expression(expression) => {
                    self.emit("{");
                    self.emit_expression(expression, 0);
                    self.emit("}");
                }
                JsxChild::EmptyExpression => self.emit("{}"),
                JsxChild::Spread(expression) => {
                    self.emit("{...");
                    self.emit_expression(expression, PRECEDENCE_ASSIGNMENT);
                    self.emit("}");
                }
                JsxChild::Element(expression) => self.emit_expression(expression, 0),
            }
        }
    }
}

pub fn jsx_name_to_string(name: &JsxName) -> String {
    match name {
        JsxName::Identifier(name) => name.to_owned(),
        JsxName::Member(parts) => parts.join("."),
        JsxName::Namespaced(namespace, local) => format!("{namespace}:{local}"),
    }
}
