//! A small tree walking interpreter for the subset of JavaScript components are written in.
//!
//! It runs straight off the parsed `Ast`, so both the source a user wrote and the code the
//! compiler printed can be executed and compared. Only what rendering needs is supported:
//! no prototypes, no `this`, no classes, no async.

use crate::compiler_frontend::analysis::test_support::parse;
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    AssignOperator, BinaryOperator, DeclKind, ExportDecl, Expr, ForHead, ForInit, FunctionBody, FunctionId,
    ImportSpecifier, JsxAttribute, JsxAttributeValue, JsxChild, JsxElement, JsxName, LogicalOperator, MemberProp,
    ObjectPatternProp, ObjectProp, Pattern, PropKey, StmtId, StmtKind, UnaryOperator, UpdateOperator,
};
use crate::compiler_frontend::codegen::js::print_expression;
use crate::compiler_tests::react_runtime::{HookState, install_react};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub(crate) type NativeFn = dyn Fn(&mut Interpreter, Vec<Value>) -> Flow<Value>;
pub(crate) type Flow<T> = Result<T, Control>;

#[derive(Clone)]
pub(crate) enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    // Compared by identity
    Symbol(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Vec<(String, Value)>>>),
    Function(Rc<Closure>),
    Native(Rc<NativeFn>),
    Element(Rc<Element>),
    Slot(Rc<CacheSlot>),
}

pub(crate) struct Closure {
    function: FunctionId,
    env: Rc<Scope>,
}

pub(crate) struct Element {
    pub(crate) kind: ElementKind,
    // Always an object, `children` included
    pub(crate) props: Value,
}

pub(crate) enum ElementKind {
    Host(String),
    Component(Value),
    Fragment,
}

/// One entry of the memo cache. Writes are staged and only land on commit.
pub(crate) struct CacheSlot {
    pub(crate) index: usize,
    pub(crate) value: RefCell<Value>,
    pub(crate) unset: Rc<str>,
    pub(crate) staged: Rc<RefCell<Vec<(usize, Value)>>>,
}

impl CacheSlot {
    fn is_unset(&self) -> bool {
        matches!(&*self.value.borrow(), Value::Symbol(symbol) if Rc::ptr_eq(symbol, &self.unset))
    }
}

pub(crate) enum Control {
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Value),
}

impl Value {
    pub(crate) fn string(text: impl AsRef<str>) -> Value {
        Value::String(Rc::from(text.as_ref()))
    }

    pub(crate) fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub(crate) fn object(entries: Vec<(&str, Value)>) -> Value {
        Value::Object(Rc::new(RefCell::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        )))
    }

    pub(crate) fn native(function: impl Fn(&mut Interpreter, Vec<Value>) -> Flow<Value> + 'static) -> Value {
        Value::Native(Rc::new(function))
    }

    pub(crate) fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub(crate) fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub(crate) fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(value) => *value,
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::String(text) => !text.is_empty(),
            _ => true,
        }
    }

    pub(crate) fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(value) => f64::from(u8::from(*value)),
            Value::Number(value) => *value,
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(items) => match items.borrow().as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            _ => f64::NAN,
        }
    }

    /// The string `String(value)` would produce.
    pub(crate) fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => String::from("undefined"),
            Value::Null => String::from("null"),
            Value::Bool(value) => value.to_string(),
            Value::Number(value) => number_to_string(*value),
            Value::String(text) => text.to_string(),
            Value::Symbol(description) => format!("Symbol({description})"),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Function(_) | Value::Native(_) => String::from("function () { [code] }"),
            Value::Object(_) | Value::Element(_) | Value::Slot(_) => String::from("[object Object]"),
        }
    }

    pub(crate) fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Element(_) | Value::Slot(_) => "object",
        }
    }

    /// Own enumerable entries of an object or array.
    pub(crate) fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Value::Object(entries) => entries.borrow().clone(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(text) => write!(f, "{text:?}"),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(entries) => {
                let mut map = f.debug_map();
                for (key, value) in entries.borrow().iter() {
                    map.entry(key, value);
                }
                map.finish()
            }
            Value::Element(element) => match &element.kind {
                ElementKind::Host(tag) => write!(f, "<{tag}>"),
                ElementKind::Component(_) => write!(f, "<Component>"),
                ElementKind::Fragment => write!(f, "<>"),
            },
            Value::Slot(slot) => write!(f, "Slot({})", slot.index),
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}

/// `Object.is`, except that `+0` and `-0` are the same.
pub(crate) fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => Rc::ptr_eq(a, b),
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
        (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
        (Value::Slot(a), Value::Slot(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() && b.is_nullish() => true,
        (a, b) if a.is_nullish() || b.is_nullish() => false,
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Number(_) | Value::String(_) | Value::Bool(_))
            if left.type_of() != right.type_of() =>
        {
            left.to_number() == right.to_number()
        }
        _ => strict_equals(left, right),
    }
}

pub(crate) fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        String::from("NaN")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value == value.trunc() && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub(crate) fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    let cleaned = cleaned.trim_end_matches('n');
    let radix = |digits: &str, radix: u32| i64::from_str_radix(digits, radix).map_or(f64::NAN, |value| value as f64);

    match cleaned.get(..2) {
        Some("0x" | "0X") => radix(&cleaned[2..], 16),
        Some("0o" | "0O") => radix(&cleaned[2..], 8),
        Some("0b" | "0B") => radix(&cleaned[2..], 2),
        _ => cleaned.parse().unwrap_or(f64::NAN),
    }
}

pub(crate) fn throw<T>(message: impl Into<String>) -> Flow<T> {
    Err(Control::Throw(Value::string(message.into())))
}

pub(crate) fn argument(arguments: &[Value], index: usize) -> Value {
    arguments.get(index).cloned().unwrap_or(Value::Undefined)
}

fn to_int32(value: &Value) -> i32 {
    let number = value.to_number();
    if number.is_finite() { number.trunc() as i64 as i32 } else { 0 }
}

pub(crate) struct Scope {
    variables: RefCell<FxHashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub(crate) fn root() -> Rc<Scope> {
        Rc::new(Scope {
            variables: RefCell::new(FxHashMap::default()),
            parent: None,
        })
    }

    pub(crate) fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            variables: RefCell::new(FxHashMap::default()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub(crate) fn declare(&self, name: &str, value: Value) {
        self.variables.borrow_mut().insert(name.to_owned(), value);
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.variables.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    fn assign(&self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.variables.borrow_mut().get_mut(name) {
            *slot = value;
            return true;
        }
        self.parent.as_ref().is_some_and(|parent| parent.assign(name, value))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Binding {
    Declare,
    Assign,
}

pub(crate) struct Interpreter {
    ast: Rc<Ast>,
    pub(crate) module: Rc<Scope>,
    builtin_modules: FxHashMap<String, Value>,
    pub(crate) hooks: HookState,
    pub(crate) logs: Vec<String>,
}

impl Interpreter {
    /// Parses and runs a module. Top level statements execute once, like an import would.
    pub(crate) fn load(source: &str) -> Result<Interpreter, String> {
        let ast = Rc::new(parse(source));
        let globals = Scope::root();
        let mut builtin_modules = FxHashMap::default();

        install_globals(&globals);
        install_react(&globals, &mut builtin_modules);

        let mut interpreter = Interpreter {
            ast: Rc::clone(&ast),
            module: Scope::child(&globals),
            builtin_modules,
            hooks: HookState::default(),
            logs: Vec::new(),
        };

        let module = Rc::clone(&interpreter.module);
        interpreter
            .run_statements(&ast.body, &module)
            .map_err(|control| describe(&control))?;

        Ok(interpreter)
    }

    pub(crate) fn binding(&self, name: &str) -> Option<Value> {
        self.module.lookup(name)
    }

    pub(crate) fn call(&mut self, callee: &Value, arguments: Vec<Value>) -> Flow<Value> {
        match callee {
            Value::Native(native) => {
                let native = Rc::clone(native);
                native(self, arguments)
            }
            Value::Function(closure) => self.call_closure(closure, arguments),
            other => throw(format!("{} is not a function", other.to_js_string())),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, arguments: Vec<Value>) -> Flow<Value> {
        let ast = Rc::clone(&self.ast);
        let function = ast.function(closure.function);
        let scope = Scope::child(&closure.env);

        if let (Some(name), false) = (&function.name, function.is_arrow) {
            scope.declare(name, Value::Function(Rc::clone(closure)));
        }

        for (index, param) in function.params.iter().enumerate() {
            match param {
                Pattern::Rest(target) => {
                    let rest = arguments.get(index..).map(<[Value]>::to_vec).unwrap_or_default();
                    self.bind_pattern(target, Value::array(rest), &scope, Binding::Declare)?;
                }
                _ => self.bind_pattern(param, argument(&arguments, index), &scope, Binding::Declare)?,
            }
        }

        match &function.body {
            FunctionBody::Expression(expression) => self.eval(expression, &scope),
            FunctionBody::Block(block) => match self.run_statements(ast.block_statements(*block), &scope) {
                Ok(()) | Err(Control::Break(_) | Control::Continue(_)) => Ok(Value::Undefined),
                Err(Control::Return(value)) => Ok(value),
                Err(thrown) => Err(thrown),
            },
        }
    }

    fn closure(&self, function: FunctionId, scope: &Rc<Scope>) -> Value {
        Value::Function(Rc::new(Closure {
            function,
            env: Rc::clone(scope),
        }))
    }

    fn run_statements(&mut self, statements: &[StmtId], scope: &Rc<Scope>) -> Flow<()> {
        let ast = Rc::clone(&self.ast);

        // Function declarations are visible to the whole block
        for &statement in statements {
            let declared = match ast.kind(statement) {
                StmtKind::FunctionDecl(function) => Some(*function),
                StmtKind::Export(ExportDecl::DefaultFunction(function)) => Some(*function),
                StmtKind::Export(ExportDecl::Declaration(inner)) => match ast.kind(*inner) {
                    StmtKind::FunctionDecl(function) => Some(*function),
                    _ => None,
                },
                _ => None,
            };
            if let Some(function) = declared {
                let name = ast.function(function).name.clone().unwrap_or_else(|| String::from("default"));
                scope.declare(&name, self.closure(function, scope));
            }
        }

        for &statement in statements {
            self.exec(statement, scope)?;
        }
        Ok(())
    }

    fn exec(&mut self, statement: StmtId, scope: &Rc<Scope>) -> Flow<()> {
        let ast = Rc::clone(&self.ast);

        match ast.kind(statement) {
            StmtKind::Expression(expression) => self.eval(expression, scope).map(|_| ()),

            StmtKind::VarDecl(declaration) => {
                for declarator in &declaration.declarators {
                    let value = match &declarator.init {
                        Some(init) => self.eval(init, scope)?,
                        None => Value::Undefined,
                    };
                    self.bind_pattern(&declarator.target, value, scope, Binding::Declare)?;
                }
                Ok(())
            }

            // Hoisted by the enclosing block
            StmtKind::FunctionDecl(_) => Ok(()),

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expression) => self.eval(expression, scope)?,
                    None => Value::Undefined,
                };
                Err(Control::Return(value))
            }

            StmtKind::If { test, consequent, alternate } => {
                if self.eval(test, scope)?.truthy() {
                    self.exec(*consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.exec(*alternate, scope)
                } else {
                    Ok(())
                }
            }

            StmtKind::Block(statements) => {
                let inner = Scope::child(scope);
                self.run_statements(statements, &inner)
            }

            StmtKind::For { .. }
            | StmtKind::ForIn { .. }
            | StmtKind::ForOf { .. }
            | StmtKind::While { .. }
            | StmtKind::DoWhile { .. } => self.exec_loop(statement, scope, None),

            StmtKind::Try { block, handler, finalizer } => {
                let result = match (self.exec(*block, scope), handler) {
                    (Err(Control::Throw(thrown)), Some(handler)) => {
                        let catch_scope = Scope::child(scope);
                        if let Some(param) = &handler.param {
                            self.bind_pattern(param, thrown, &catch_scope, Binding::Declare)?;
                        }
                        self.exec(handler.body, &catch_scope)
                    }
                    (result, _) => result,
                };

                if let Some(finalizer) = finalizer {
                    self.exec(*finalizer, scope)?;
                }
                result
            }

            StmtKind::Switch { discriminant, cases } => {
                let value = self.eval(discriminant, scope)?;
                let mut start = None;
                for (index, case) in cases.iter().enumerate() {
                    if let Some(test) = &case.test
                        && strict_equals(&value, &self.eval(test, scope)?)
                    {
                        start = Some(index);
                        break;
                    }
                }
                let start = start.or_else(|| cases.iter().position(|case| case.test.is_none()));

                let Some(start) = start else {
                    return Ok(());
                };

                let inner = Scope::child(scope);
                let statements: Vec<StmtId> = cases[start..]
                    .iter()
                    .flat_map(|case| case.consequent.iter().copied())
                    .collect();
                match self.run_statements(&statements, &inner) {
                    Err(Control::Break(None)) => Ok(()),
                    other => other,
                }
            }

            StmtKind::Labeled { label, body } => {
                let result = if ast.kind(*body).is_loop() {
                    self.exec_loop(*body, scope, Some(label))
                } else {
                    self.exec(*body, scope)
                };
                match result {
                    Err(Control::Break(Some(target))) if target == *label => Ok(()),
                    other => other,
                }
            }

            StmtKind::Break(label) => Err(Control::Break(label.clone())),
            StmtKind::Continue(label) => Err(Control::Continue(label.clone())),
            StmtKind::Throw(expression) => Err(Control::Throw(self.eval(expression, scope)?)),

            StmtKind::Import(import) => {
                let Some(module) = self.builtin_modules.get(&import.source).cloned() else {
                    return throw(format!("Cannot find module '{}'", import.source));
                };
                for specifier in &import.specifiers {
                    match specifier {
                        ImportSpecifier::Default(local) => scope.declare(local, self.get_property(&module, "default")?),
                        ImportSpecifier::Namespace(local) => scope.declare(local, module.clone()),
                        ImportSpecifier::Named { imported, local } => {
                            scope.declare(local, self.get_property(&module, imported)?)
                        }
                    }
                }
                Ok(())
            }

            StmtKind::Export(export) => match export {
                ExportDecl::Declaration(inner) => self.exec(*inner, scope),
                ExportDecl::DefaultExpression(expression) => {
                    let value = self.eval(expression, scope)?;
                    scope.declare("default", value);
                    Ok(())
                }
                ExportDecl::DefaultFunction(_) | ExportDecl::Named { .. } | ExportDecl::All { .. } => Ok(()),
            },

            StmtKind::Debugger | StmtKind::Empty | StmtKind::Removed => Ok(()),
        }
    }

    /// Runs the body once. `Ok(true)` means the loop should stop.
    fn loop_iteration(&mut self, body: StmtId, scope: &Rc<Scope>, label: Option<&str>) -> Flow<bool> {
        match self.exec(body, scope) {
            Ok(()) | Err(Control::Continue(None)) => Ok(false),
            Err(Control::Break(None)) => Ok(true),
            Err(Control::Continue(Some(target))) if label == Some(target.as_str()) => Ok(false),
            Err(Control::Break(Some(target))) if label == Some(target.as_str()) => Ok(true),
            Err(other) => Err(other),
        }
    }

    fn exec_loop(&mut self, statement: StmtId, scope: &Rc<Scope>, label: Option<&str>) -> Flow<()> {
        let ast = Rc::clone(&self.ast);

        match ast.kind(statement) {
            StmtKind::For { init, test, update, body } => {
                let loop_scope = Scope::child(scope);
                match init {
                    Some(ForInit::VarDecl(declaration)) => {
                        for declarator in &declaration.declarators {
                            let value = match &declarator.init {
                                Some(init) => self.eval(init, &loop_scope)?,
                                None => Value::Undefined,
                            };
                            self.bind_pattern(&declarator.target, value, &loop_scope, Binding::Declare)?;
                        }
                    }
                    Some(ForInit::Expression(expression)) => {
                        self.eval(expression, &loop_scope)?;
                    }
                    None => {}
                }

                loop {
                    if let Some(test) = test
                        && !self.eval(test, &loop_scope)?.truthy()
                    {
                        break;
                    }
                    let iteration = Scope::child(&loop_scope);
                    if self.loop_iteration(*body, &iteration, label)? {
                        break;
                    }
                    if let Some(update) = update {
                        self.eval(update, &loop_scope)?;
                    }
                }
                Ok(())
            }

            StmtKind::ForOf { left, right, body, .. } => {
                let iterable = self.eval(right, scope)?;
                for item in self.iterate(&iterable)? {
                    let iteration = Scope::child(scope);
                    self.bind_for_head(left, item, &iteration)?;
                    if self.loop_iteration(*body, &iteration, label)? {
                        break;
                    }
                }
                Ok(())
            }

            StmtKind::ForIn { left, right, body } => {
                let object = self.eval(right, scope)?;
                for (key, _) in object.entries() {
                    let iteration = Scope::child(scope);
                    self.bind_for_head(left, Value::string(key), &iteration)?;
                    if self.loop_iteration(*body, &iteration, label)? {
                        break;
                    }
                }
                Ok(())
            }

            StmtKind::While { test, body } => {
                while self.eval(test, scope)?.truthy() {
                    if self.loop_iteration(*body, scope, label)? {
                        break;
                    }
                }
                Ok(())
            }

            StmtKind::DoWhile { body, test } => {
                loop {
                    if self.loop_iteration(*body, scope, label)? || !self.eval(test, scope)?.truthy() {
                        break;
                    }
                }
                Ok(())
            }

            _ => self.exec(statement, scope),
        }
    }

    fn bind_for_head(&mut self, head: &ForHead, value: Value, scope: &Rc<Scope>) -> Flow<()> {
        match head {
            ForHead::VarDecl { kind: DeclKind::Var, target } | ForHead::Pattern(target) => {
                self.bind_pattern(target, value, scope, Binding::Assign)
            }
            ForHead::VarDecl { target, .. } => self.bind_pattern(target, value, scope, Binding::Declare),
        }
    }

    pub(crate) fn iterate(&self, value: &Value) -> Flow<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::String(text) => Ok(text.chars().map(|c| Value::string(c.to_string())).collect()),
            other => throw(format!("{} is not iterable", other.to_js_string())),
        }
    }

    fn bind_pattern(&mut self, pattern: &Pattern, value: Value, scope: &Rc<Scope>, binding: Binding) -> Flow<()> {
        match pattern {
            Pattern::Identifier(name) => {
                if binding == Binding::Declare {
                    scope.declare(name, value);
                    Ok(())
                } else if scope.assign(name, value) {
                    Ok(())
                } else {
                    throw(format!("{name} is not defined"))
                }
            }

            Pattern::Array(elements) => {
                let items = self.iterate(&value)?;
                for (index, element) in elements.iter().enumerate() {
                    match element {
                        Some(Pattern::Rest(target)) => {
                            let rest = items.get(index..).map(<[Value]>::to_vec).unwrap_or_default();
                            self.bind_pattern(target, Value::array(rest), scope, binding)?;
                        }
                        Some(element) => self.bind_pattern(element, argument(&items, index), scope, binding)?,
                        None => {}
                    }
                }
                Ok(())
            }

            Pattern::Object(props) => {
                if value.is_nullish() {
                    return throw(format!("Cannot destructure '{}'", value.to_js_string()));
                }

                let mut used = Vec::new();
                for prop in props {
                    match prop {
                        ObjectPatternProp::KeyValue { key, value: target, .. } => {
                            let key = self.prop_key(key, scope)?;
                            let field = self.get_property(&value, &key)?;
                            used.push(key);
                            self.bind_pattern(target, field, scope, binding)?;
                        }
                        ObjectPatternProp::Rest(target) => {
                            let rest: Vec<(String, Value)> = value
                                .entries()
                                .into_iter()
                                .filter(|(key, _)| !used.contains(key))
                                .collect();
                            let rest = Value::Object(Rc::new(RefCell::new(rest)));
                            self.bind_pattern(target, rest, scope, binding)?;
                        }
                    }
                }
                Ok(())
            }

            Pattern::Default { target, value: default } => {
                let value = match value {
                    Value::Undefined => self.eval(default, scope)?,
                    other => other,
                };
                self.bind_pattern(target, value, scope, binding)
            }

            Pattern::Rest(target) => self.bind_pattern(target, value, scope, binding),

            Pattern::Expression(expression) => self.assign_to(expression, value, scope),
        }
    }

    fn assign_to(&mut self, target: &Expr, value: Value, scope: &Rc<Scope>) -> Flow<()> {
        match target {
            Expr::Identifier(name) => {
                if scope.assign(name, value) {
                    Ok(())
                } else {
                    throw(format!("{name} is not defined"))
                }
            }
            Expr::Member { object, property, .. } => {
                let object = self.eval(object, scope)?;
                let key = self.member_key(property, scope)?;
                self.set_property(&object, &key, value)
            }
            _ => throw("Invalid assignment target"),
        }
    }

    pub(crate) fn eval(&mut self, expression: &Expr, scope: &Rc<Scope>) -> Flow<Value> {
        match expression {
            Expr::Identifier(name) => match scope.lookup(name) {
                Some(value) => Ok(value),
                None if name == "undefined" => Ok(Value::Undefined),
                None => throw(format!("{name} is not defined")),
            },
            Expr::This => Ok(Value::Undefined),
            Expr::Null => Ok(Value::Null),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Number(raw) => Ok(Value::Number(parse_number(raw))),
            Expr::String(text) => Ok(Value::string(text)),

            Expr::Template { quasis, expressions } => {
                let mut text = String::new();
                for (index, quasi) in quasis.iter().enumerate() {
                    text.push_str(quasi);
                    if let Some(expression) = expressions.get(index) {
                        text.push_str(&self.eval(expression, scope)?.to_js_string());
                    }
                }
                Ok(Value::string(text))
            }

            Expr::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        None => items.push(Value::Undefined),
                        Some(Expr::Spread(inner)) => {
                            let spread = self.eval(inner, scope)?;
                            items.extend(self.iterate(&spread)?);
                        }
                        Some(element) => items.push(self.eval(element, scope)?),
                    }
                }
                Ok(Value::array(items))
            }

            Expr::Object(props) => {
                let object = Value::object(Vec::new());
                for prop in props {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            let key = self.prop_key(key, scope)?;
                            let value = self.eval(value, scope)?;
                            self.set_property(&object, &key, value)?;
                        }
                        ObjectProp::Shorthand(name) => {
                            let value = self.eval(&Expr::identifier(name), scope)?;
                            self.set_property(&object, name, value)?;
                        }
                        ObjectProp::Method { key, function, .. } => {
                            let key = self.prop_key(key, scope)?;
                            let method = self.closure(*function, scope);
                            self.set_property(&object, &key, method)?;
                        }
                        ObjectProp::Spread(inner) => {
                            for (key, value) in self.eval(inner, scope)?.entries() {
                                self.set_property(&object, &key, value)?;
                            }
                        }
                    }
                }
                Ok(object)
            }

            Expr::Function(function) => Ok(self.closure(*function, scope)),

            Expr::Unary { operator, argument } => {
                if *operator == UnaryOperator::Typeof
                    && let Expr::Identifier(name) = argument.as_ref()
                    && scope.lookup(name).is_none()
                {
                    return Ok(Value::string("undefined"));
                }

                if *operator == UnaryOperator::Delete {
                    if let Expr::Member { object, property, .. } = argument.as_ref() {
                        let object = self.eval(object, scope)?;
                        let key = self.member_key(property, scope)?;
                        if let Value::Object(entries) = &object {
                            entries.borrow_mut().retain(|(existing, _)| *existing != key);
                        }
                    }
                    return Ok(Value::Bool(true));
                }

                let value = self.eval(argument, scope)?;
                Ok(match operator {
                    UnaryOperator::Minus => Value::Number(-value.to_number()),
                    UnaryOperator::Plus => Value::Number(value.to_number()),
                    UnaryOperator::Not => Value::Bool(!value.truthy()),
                    UnaryOperator::BitNot => Value::Number(f64::from(!to_int32(&value))),
                    UnaryOperator::Typeof => Value::string(value.type_of()),
                    UnaryOperator::Void | UnaryOperator::Delete => Value::Undefined,
                })
            }

            Expr::Update { operator, prefix, argument } => {
                let old = self.eval(argument, scope)?.to_number();
                let new = match operator {
                    UpdateOperator::Increment => old + 1.0,
                    UpdateOperator::Decrement => old - 1.0,
                };
                self.assign_to(argument, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Binary { operator, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                binary(*operator, &left, &right)
            }

            Expr::Logical { operator, left, right } => {
                let left = self.eval(left, scope)?;
                let short_circuits = match operator {
                    LogicalOperator::And => !left.truthy(),
                    LogicalOperator::Or => left.truthy(),
                    LogicalOperator::Nullish => !left.is_nullish(),
                };
                if short_circuits { Ok(left) } else { self.eval(right, scope) }
            }

            Expr::Assign { operator, target, value } => self.eval_assignment(*operator, target, value, scope),

            Expr::Conditional { test, consequent, alternate } => {
                if self.eval(test, scope)?.truthy() {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }

            Expr::Member { .. } | Expr::Call { .. } => {
                Ok(self.eval_chain(expression, scope)?.unwrap_or(Value::Undefined))
            }

            Expr::Sequence(expressions) => {
                let mut last = Value::Undefined;
                for expression in expressions {
                    last = self.eval(expression, scope)?;
                }
                Ok(last)
            }

            Expr::Annotated { expression, .. } => self.eval(expression, scope),

            Expr::JsxElement(element) => self.eval_jsx_element(element, scope),
            Expr::JsxFragment(children) => {
                let children = self.eval_jsx_children(children, scope)?;
                Ok(Value::Element(Rc::new(Element {
                    kind: ElementKind::Fragment,
                    props: Value::object(vec![("children", Value::array(children))]),
                })))
            }

            Expr::Spread(_) => throw("Unexpected spread"),
            Expr::New { .. } => throw("'new' is not supported"),
            Expr::Await(_) | Expr::Yield { .. } => throw("Suspending functions are not supported"),
            Expr::TaggedTemplate { .. } | Expr::Regex { .. } => throw("Unsupported literal"),
        }
    }

    fn eval_assignment(&mut self, operator: AssignOperator, target: &Pattern, value: &Expr, scope: &Rc<Scope>) -> Flow<Value> {
        if operator == AssignOperator::Assign {
            let value = self.eval(value, scope)?;
            self.bind_pattern(target, value.clone(), scope, Binding::Assign)?;
            return Ok(value);
        }

        let target_expression = match target {
            Pattern::Identifier(name) => Expr::identifier(name),
            Pattern::Expression(expression) => expression.as_ref().clone(),
            _ => return throw("Invalid compound assignment target"),
        };
        let current = self.eval(&target_expression, scope)?;

        let result = match operator {
            AssignOperator::And if !current.truthy() => return Ok(current),
            AssignOperator::Or if current.truthy() => return Ok(current),
            AssignOperator::Nullish if !current.is_nullish() => return Ok(current),
            AssignOperator::And | AssignOperator::Or | AssignOperator::Nullish => self.eval(value, scope)?,
            compound => {
                let right = self.eval(value, scope)?;
                binary(compound_operator(compound), &current, &right)?
            }
        };

        self.assign_to(&target_expression, result.clone(), scope)?;
        Ok(result)
    }

    /// Member and call chains. `None` means an optional link short-circuited the chain.
    fn eval_chain(&mut self, expression: &Expr, scope: &Rc<Scope>) -> Flow<Option<Value>> {
        match expression {
            Expr::Member { object, property, optional } => {
                let Some(object) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, scope)?;
                self.get_property(&object, &key).map(Some)
            }

            Expr::Call { callee, arguments, optional } => {
                let Some(function) = self.eval_chain(callee, scope)? else {
                    return Ok(None);
                };
                if *optional && function.is_nullish() {
                    return Ok(None);
                }

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    if let Expr::Spread(inner) = argument {
                        let spread = self.eval(inner, scope)?;
                        values.extend(self.iterate(&spread)?);
                    } else {
                        values.push(self.eval(argument, scope)?);
                    }
                }

                if !function.is_callable() {
                    let name = print_expression(&self.ast, callee);
                    return throw(format!("{name} is not a function"));
                }
                self.call(&function, values).map(Some)
            }

            other => self.eval(other, scope).map(Some),
        }
    }

    fn member_key(&mut self, property: &MemberProp, scope: &Rc<Scope>) -> Flow<String> {
        match property {
            MemberProp::Identifier(name) => Ok(name.clone()),
            MemberProp::Computed(expression) => Ok(self.eval(expression, scope)?.to_js_string()),
        }
    }

    fn prop_key(&mut self, key: &PropKey, scope: &Rc<Scope>) -> Flow<String> {
        match key {
            PropKey::Identifier(name) | PropKey::String(name) => Ok(name.clone()),
            PropKey::Number(raw) => Ok(number_to_string(parse_number(raw))),
            PropKey::Computed(expression) => Ok(self.eval(expression, scope)?.to_js_string()),
        }
    }

    pub(crate) fn get_property(&mut self, object: &Value, key: &str) -> Flow<Value> {
        match object {
            Value::Undefined | Value::Null => throw(format!(
                "Cannot read properties of {} (reading '{key}')",
                object.to_js_string()
            )),

            Value::Object(entries) => Ok(entries
                .borrow()
                .iter()
                .find(|(existing, _)| existing == key)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Undefined)),

            Value::Array(items) => {
                if key == "length" {
                    return Ok(Value::Number(items.borrow().len() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(argument(&items.borrow(), index));
                }
                Ok(array_method(items, key).unwrap_or(Value::Undefined))
            }

            Value::String(text) => {
                if key == "length" {
                    return Ok(Value::Number(text.chars().count() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(text
                        .chars()
                        .nth(index)
                        .map_or(Value::Undefined, |c| Value::string(c.to_string())));
                }
                Ok(string_method(text, key).unwrap_or(Value::Undefined))
            }

            Value::Slot(slot) => Ok(match key {
                "v" => slot.value.borrow().clone(),
                "n" => Value::Bool(slot.is_unset()),
                "e" => {
                    let slot = Rc::clone(slot);
                    Value::native(move |_, arguments| {
                        slot.staged.borrow_mut().push((slot.index, argument(&arguments, 0)));
                        Ok(Value::Undefined)
                    })
                }
                _ => Value::Undefined,
            }),

            Value::Element(element) => Ok(match key {
                "props" => element.props.clone(),
                _ => Value::Undefined,
            }),

            Value::Number(value) if key == "toFixed" => {
                let value = *value;
                Ok(Value::native(move |_, arguments| {
                    let digits = argument(&arguments, 0).to_number();
                    let digits = if digits.is_nan() { 0 } else { digits as usize };
                    Ok(Value::string(format!("{value:.digits$}")))
                }))
            }

            _ => Ok(Value::Undefined),
        }
    }

    pub(crate) fn set_property(&mut self, object: &Value, key: &str, value: Value) -> Flow<()> {
        match object {
            Value::Undefined | Value::Null => throw(format!(
                "Cannot set properties of {} (setting '{key}')",
                object.to_js_string()
            )),
            Value::Object(entries) => {
                let mut entries = entries.borrow_mut();
                match entries.iter_mut().find(|(existing, _)| existing == key) {
                    Some((_, existing)) => *existing = value,
                    None => entries.push((key.to_owned(), value)),
                }
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    items.truncate(value.to_number() as usize);
                } else if let Ok(index) = key.parse::<usize>() {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn eval_jsx_element(&mut self, element: &JsxElement, scope: &Rc<Scope>) -> Flow<Value> {
        let kind = match &element.name {
            JsxName::Identifier(name) if element.name.is_intrinsic() => ElementKind::Host(name.clone()),
            JsxName::Namespaced(namespace, name) => ElementKind::Host(format!("{namespace}:{name}")),
            JsxName::Identifier(name) => ElementKind::Component(self.eval(&Expr::identifier(name), scope)?),
            JsxName::Member(parts) => {
                let mut value = self.eval(&Expr::identifier(&parts[0]), scope)?;
                for part in &parts[1..] {
                    value = self.get_property(&value, part)?;
                }
                ElementKind::Component(value)
            }
        };

        let props = Value::object(Vec::new());
        for attribute in &element.attributes {
            match attribute {
                JsxAttribute::Attribute { name, value } => {
                    let value = match value {
                        None => Value::Bool(true),
                        Some(JsxAttributeValue::String(raw)) => {
                            Value::string(raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default())
                        }
                        Some(JsxAttributeValue::Expression(expression) | JsxAttributeValue::Element(expression)) => {
                            self.eval(expression, scope)?
                        }
                    };
                    self.set_property(&props, name, value)?;
                }
                JsxAttribute::Spread(expression) => {
                    for (key, value) in self.eval(expression, scope)?.entries() {
                        self.set_property(&props, &key, value)?;
                    }
                }
            }
        }

        let mut children = self.eval_jsx_children(&element.children, scope)?;
        match children.len() {
            0 => {}
            1 => self.set_property(&props, "children", children.remove(0))?,
            _ => self.set_property(&props, "children", Value::array(children))?,
        }

        Ok(Value::Element(Rc::new(Element { kind, props })))
    }

    fn eval_jsx_children(&mut self, children: &[JsxChild], scope: &Rc<Scope>) -> Flow<Vec<Value>> {
        let mut values = Vec::with_capacity(children.len());
        for child in children {
            match child {
                JsxChild::Text(text) => {
                    if let Some(text) = jsx_text(text) {
                        values.push(Value::string(text));
                    }
                }
                JsxChild::Expression(expression) | JsxChild::Element(expression) => {
                    values.push(self.eval(expression, scope)?);
                }
                JsxChild::Spread(expression) => {
                    let spread = self.eval(expression, scope)?;
                    values.extend(self.iterate(&spread)?);
                }
                JsxChild::EmptyExpression => {}
            }
        }
        Ok(values)
    }
}

/// JSX text keeps inner spacing but drops indentation and lines that are only whitespace.
fn jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() == 1 {
        return (!raw.is_empty()).then(|| raw.to_owned());
    }

    let last = lines.len() - 1;
    let parts: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| match index {
            0 => line.trim_end(),
            _ if index == last => line.trim_start(),
            _ => line.trim(),
        })
        .filter(|line| !line.is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}

fn compound_operator(operator: AssignOperator) -> BinaryOperator {
    match operator {
        AssignOperator::Add => BinaryOperator::Add,
        AssignOperator::Subtract => BinaryOperator::Subtract,
        AssignOperator::Multiply => BinaryOperator::Multiply,
        AssignOperator::Divide => BinaryOperator::Divide,
        AssignOperator::Remainder => BinaryOperator::Remainder,
        AssignOperator::Exponent => BinaryOperator::Exponent,
        AssignOperator::ShiftLeft => BinaryOperator::ShiftLeft,
        AssignOperator::ShiftRight => BinaryOperator::ShiftRight,
        AssignOperator::UnsignedShiftRight => BinaryOperator::UnsignedShiftRight,
        AssignOperator::BitAnd => BinaryOperator::BitAnd,
        AssignOperator::BitOr => BinaryOperator::BitOr,
        AssignOperator::BitXor => BinaryOperator::BitXor,
        AssignOperator::Assign | AssignOperator::And | AssignOperator::Or | AssignOperator::Nullish => {
            BinaryOperator::Add
        }
    }
}

fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Flow<Value> {
    let numbers = || (left.to_number(), right.to_number());
    let is_text = |value: &Value| !matches!(value, Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_));

    Ok(match operator {
        BinaryOperator::Add => {
            if is_text(left) || is_text(right) {
                Value::string(format!("{}{}", left.to_js_string(), right.to_js_string()))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOperator::Subtract => Value::Number(numbers().0 - numbers().1),
        BinaryOperator::Multiply => Value::Number(numbers().0 * numbers().1),
        BinaryOperator::Divide => Value::Number(numbers().0 / numbers().1),
        BinaryOperator::Remainder => Value::Number(numbers().0 % numbers().1),
        BinaryOperator::Exponent => Value::Number(numbers().0.powf(numbers().1)),

        BinaryOperator::StrictEqual => Value::Bool(strict_equals(left, right)),
        BinaryOperator::StrictNotEqual => Value::Bool(!strict_equals(left, right)),
        BinaryOperator::Equal => Value::Bool(loose_equals(left, right)),
        BinaryOperator::NotEqual => Value::Bool(!loose_equals(left, right)),

        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => numbers().0.partial_cmp(&numbers().1),
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Value::Bool(match operator {
                BinaryOperator::LessThan => ordering.is_lt(),
                BinaryOperator::LessThanOrEqual => ordering.is_le(),
                BinaryOperator::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }

        BinaryOperator::BitAnd => Value::Number(f64::from(to_int32(left) & to_int32(right))),
        BinaryOperator::BitOr => Value::Number(f64::from(to_int32(left) | to_int32(right))),
        BinaryOperator::BitXor => Value::Number(f64::from(to_int32(left) ^ to_int32(right))),
        BinaryOperator::ShiftLeft => Value::Number(f64::from(to_int32(left).wrapping_shl(to_int32(right) as u32 & 31))),
        BinaryOperator::ShiftRight => Value::Number(f64::from(to_int32(left).wrapping_shr(to_int32(right) as u32 & 31))),
        BinaryOperator::UnsignedShiftRight => {
            Value::Number(f64::from((to_int32(left) as u32).wrapping_shr(to_int32(right) as u32 & 31)))
        }

        BinaryOperator::In => {
            let key = left.to_js_string();
            Value::Bool(right.entries().iter().any(|(existing, _)| *existing == key))
        }
        BinaryOperator::Instanceof => Value::Bool(false),
    })
}

fn array_method(items: &Rc<RefCell<Vec<Value>>>, name: &str) -> Option<Value> {
    let items = Rc::clone(items);

    // Callback methods take a snapshot so the callback may touch the array
    let snapshot = {
        let items = Rc::clone(&items);
        move || items.borrow().clone()
    };

    Some(match name {
        "push" => Value::native(move |_, arguments| {
            let mut items = items.borrow_mut();
            items.extend(arguments);
            Ok(Value::Number(items.len() as f64))
        }),
        "pop" => Value::native(move |_, _| Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined))),
        "map" => Value::native(move |interpreter, arguments| {
            let callback = argument(&arguments, 0);
            let mut mapped = Vec::new();
            for (index, item) in snapshot().into_iter().enumerate() {
                mapped.push(interpreter.call(&callback, vec![item, Value::Number(index as f64)])?);
            }
            Ok(Value::array(mapped))
        }),
        "filter" => Value::native(move |interpreter, arguments| {
            let callback = argument(&arguments, 0);
            let mut kept = Vec::new();
            for (index, item) in snapshot().into_iter().enumerate() {
                if interpreter.call(&callback, vec![item.clone(), Value::Number(index as f64)])?.truthy() {
                    kept.push(item);
                }
            }
            Ok(Value::array(kept))
        }),
        "forEach" => Value::native(move |interpreter, arguments| {
            let callback = argument(&arguments, 0);
            for (index, item) in snapshot().into_iter().enumerate() {
                interpreter.call(&callback, vec![item, Value::Number(index as f64)])?;
            }
            Ok(Value::Undefined)
        }),
        "find" | "findIndex" | "some" | "every" => {
            let method = name.to_owned();
            Value::native(move |interpreter, arguments| {
                let callback = argument(&arguments, 0);
                for (index, item) in snapshot().into_iter().enumerate() {
                    let matched = interpreter.call(&callback, vec![item.clone(), Value::Number(index as f64)])?.truthy();
                    match method.as_str() {
                        "find" if matched => return Ok(item),
                        "findIndex" if matched => return Ok(Value::Number(index as f64)),
                        "some" if matched => return Ok(Value::Bool(true)),
                        "every" if !matched => return Ok(Value::Bool(false)),
                        _ => {}
                    }
                }
                Ok(match method.as_str() {
                    "find" => Value::Undefined,
                    "findIndex" => Value::Number(-1.0),
                    "some" => Value::Bool(false),
                    _ => Value::Bool(true),
                })
            })
        }
        "reduce" => Value::native(move |interpreter, arguments| {
            let callback = argument(&arguments, 0);
            let mut values = snapshot().into_iter().enumerate();
            let mut accumulator = match arguments.get(1) {
                Some(initial) => initial.clone(),
                None => match values.next() {
                    Some((_, first)) => first,
                    None => return throw("Reduce of empty array with no initial value"),
                },
            };
            for (index, item) in values {
                accumulator = interpreter.call(&callback, vec![accumulator, item, Value::Number(index as f64)])?;
            }
            Ok(accumulator)
        }),
        "includes" | "indexOf" => {
            let method = name.to_owned();
            Value::native(move |_, arguments| {
                let needle = argument(&arguments, 0);
                let position = items.borrow().iter().position(|item| strict_equals(item, &needle));
                Ok(match (method.as_str(), position) {
                    ("includes", found) => Value::Bool(found.is_some()),
                    (_, Some(index)) => Value::Number(index as f64),
                    (_, None) => Value::Number(-1.0),
                })
            })
        }
        "join" => Value::native(move |_, arguments| {
            let separator = match argument(&arguments, 0) {
                Value::Undefined => String::from(","),
                other => other.to_js_string(),
            };
            let joined = items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                .collect::<Vec<_>>()
                .join(&separator);
            Ok(Value::string(joined))
        }),
        "slice" => Value::native(move |_, arguments| {
            let items = items.borrow();
            let (start, end) = slice_bounds(items.len(), &arguments);
            Ok(Value::array(items[start..end].to_vec()))
        }),
        "concat" => Value::native(move |_, arguments| {
            let mut joined = items.borrow().clone();
            for extra in arguments {
                match extra {
                    Value::Array(more) => joined.extend(more.borrow().iter().cloned()),
                    other => joined.push(other),
                }
            }
            Ok(Value::array(joined))
        }),
        "reverse" => Value::native(move |_, _| {
            items.borrow_mut().reverse();
            Ok(Value::Array(Rc::clone(&items)))
        }),
        _ => return None,
    })
}

fn slice_bounds(length: usize, arguments: &[Value]) -> (usize, usize) {
    let resolve = |value: Value, default: usize| -> usize {
        if matches!(value, Value::Undefined) {
            return default;
        }
        let index = value.to_number();
        if index.is_nan() {
            0
        } else if index < 0.0 {
            length.saturating_sub((-index) as usize)
        } else {
            (index as usize).min(length)
        }
    };

    let start = resolve(argument(arguments, 0), 0);
    let end = resolve(argument(arguments, 1), length);
    (start, end.max(start))
}

fn string_method(text: &Rc<str>, name: &str) -> Option<Value> {
    let text = Rc::clone(text);

    Some(match name {
        "toUpperCase" => Value::native(move |_, _| Ok(Value::string(text.to_uppercase()))),
        "toLowerCase" => Value::native(move |_, _| Ok(Value::string(text.to_lowercase()))),
        "trim" => Value::native(move |_, _| Ok(Value::string(text.trim()))),
        "includes" => Value::native(move |_, arguments| {
            Ok(Value::Bool(text.contains(argument(&arguments, 0).to_js_string().as_str())))
        }),
        "startsWith" => Value::native(move |_, arguments| {
            Ok(Value::Bool(text.starts_with(argument(&arguments, 0).to_js_string().as_str())))
        }),
        "slice" => Value::native(move |_, arguments| {
            let chars: Vec<char> = text.chars().collect();
            let (start, end) = slice_bounds(chars.len(), &arguments);
            Ok(Value::string(chars[start..end].iter().collect::<String>()))
        }),
        "split" => Value::native(move |_, arguments| {
            let separator = argument(&arguments, 0).to_js_string();
            let parts = if separator.is_empty() {
                text.chars().map(|c| Value::string(c.to_string())).collect()
            } else {
                text.split(separator.as_str()).map(Value::string).collect()
            };
            Ok(Value::array(parts))
        }),
        "repeat" => Value::native(move |_, arguments| {
            let count = argument(&arguments, 0).to_number();
            Ok(Value::string(text.repeat(if count > 0.0 { count as usize } else { 0 })))
        }),
        _ => return None,
    })
}

fn install_globals(globals: &Rc<Scope>) {
    globals.declare("NaN", Value::Number(f64::NAN));
    globals.declare("Infinity", Value::Number(f64::INFINITY));

    globals.declare(
        "String",
        Value::native(|_, arguments| Ok(Value::string(argument(&arguments, 0).to_js_string()))),
    );
    globals.declare(
        "Number",
        Value::native(|_, arguments| Ok(Value::Number(argument(&arguments, 0).to_number()))),
    );
    globals.declare(
        "Boolean",
        Value::native(|_, arguments| Ok(Value::Bool(argument(&arguments, 0).truthy()))),
    );

    let math = |operation: fn(f64) -> f64| {
        Value::native(move |_, arguments| Ok(Value::Number(operation(argument(&arguments, 0).to_number()))))
    };
    globals.declare(
        "Math",
        Value::object(vec![
            ("floor", math(f64::floor)),
            ("ceil", math(f64::ceil)),
            ("round", math(|value| (value + 0.5).floor())),
            ("abs", math(f64::abs)),
            (
                "max",
                Value::native(|_, arguments| {
                    Ok(Value::Number(
                        arguments.iter().map(Value::to_number).fold(f64::NEG_INFINITY, f64::max),
                    ))
                }),
            ),
            (
                "min",
                Value::native(|_, arguments| {
                    Ok(Value::Number(arguments.iter().map(Value::to_number).fold(f64::INFINITY, f64::min)))
                }),
            ),
        ]),
    );

    globals.declare(
        "Array",
        Value::object(vec![(
            "isArray",
            Value::native(|_, arguments| Ok(Value::Bool(matches!(argument(&arguments, 0), Value::Array(_))))),
        )]),
    );

    globals.declare(
        "Object",
        Value::object(vec![
            (
                "keys",
                Value::native(|_, arguments| {
                    let keys = argument(&arguments, 0).entries().into_iter().map(|(key, _)| Value::string(key));
                    Ok(Value::array(keys.collect()))
                }),
            ),
            (
                "values",
                Value::native(|_, arguments| {
                    let values = argument(&arguments, 0).entries().into_iter().map(|(_, value)| value);
                    Ok(Value::array(values.collect()))
                }),
            ),
            (
                "assign",
                Value::native(|interpreter, arguments| {
                    let target = argument(&arguments, 0);
                    for source in arguments.iter().skip(1) {
                        for (key, value) in source.entries() {
                            interpreter.set_property(&target, &key, value)?;
                        }
                    }
                    Ok(target)
                }),
            ),
        ]),
    );

    globals.declare(
        "console",
        Value::object(vec![(
            "log",
            Value::native(|interpreter, arguments| {
                let line: Vec<String> = arguments.iter().map(Value::to_js_string).collect();
                interpreter.logs.push(line.join(" "));
                Ok(Value::Undefined)
            }),
        )]),
    );
}

/// A readable message for a control signal that escaped to the top.
pub(crate) fn describe(control: &Control) -> String {
    match control {
        Control::Throw(value) => format!("Uncaught {}", value.to_js_string()),
        Control::Return(_) => String::from("Illegal return statement"),
        Control::Break(_) | Control::Continue(_) => String::from("Illegal break or continue"),
    }
}

#[cfg(test)]
#[path = "tests/js_eval_tests.rs"]
mod tests;
