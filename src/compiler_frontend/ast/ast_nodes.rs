use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use serde::Serialize;

/// Index of a statement in the `Ast` statement arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StmtId(pub u32);

/// Index of a function in the `Ast` function arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: TextLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expr),
    VarDecl(VarDecl),
    FunctionDecl(FunctionId),
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: StmtId,
        alternate: Option<StmtId>,
    },
    Block(Vec<StmtId>),
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: StmtId,
    },
    ForIn {
        left: ForHead,
        right: Expr,
        body: StmtId,
    },
    ForOf {
        left: ForHead,
        right: Expr,
        body: StmtId,
        is_await: bool,
    },
    While {
        test: Expr,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        test: Expr,
    },
    Try {
        block: StmtId,
        handler: Option<CatchClause>,
        finalizer: Option<StmtId>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: String,
        body: StmtId,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expr),
    Import(ImportDecl),
    Export(ExportDecl),
    Debugger,
    Empty,

    // Left behind when a statement is replaced by finer grained statements
    Removed,
}

impl StmtKind {
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            StmtKind::If { .. }
                | StmtKind::For { .. }
                | StmtKind::ForIn { .. }
                | StmtKind::ForOf { .. }
                | StmtKind::While { .. }
                | StmtKind::DoWhile { .. }
                | StmtKind::Try { .. }
                | StmtKind::Switch { .. }
                | StmtKind::Labeled { .. }
        )
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            StmtKind::For { .. }
                | StmtKind::ForIn { .. }
                | StmtKind::ForOf { .. }
                | StmtKind::While { .. }
                | StmtKind::DoWhile { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub target: Pattern,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
    VarDecl { kind: DeclKind, target: Pattern },
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: StmtId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub consequent: Vec<StmtId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    Default(String),
    Namespace(String),
    Named { imported: String, local: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    // export function X() {} / export const X = ...
    Declaration(StmtId),
    // export default function X() {}
    DefaultFunction(FunctionId),
    // export default <expr>
    DefaultExpression(Expr),
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
    },
    All {
        alias: Option<String>,
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    pub is_async: bool,
    pub is_generator: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(StmtId),
    Expression(Box<Expr>),
}

/// Binding and assignment targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Identifier(String),
    Array(Vec<Option<Pattern>>),
    Object(Vec<ObjectPatternProp>),
    Default {
        target: Box<Pattern>,
        value: Box<Expr>,
    },
    Rest(Box<Pattern>),

    // Only valid as an assignment target: a.b = ..., [a.b] = ...
    Expression(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPatternProp {
    KeyValue {
        key: PropKey,
        value: Pattern,
        shorthand: bool,
    },
    Rest(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Identifier(String),
    String(String),
    Number(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(String),
    This,
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Template {
        quasis: Vec<String>,
        expressions: Vec<Expr>,
    },
    TaggedTemplate {
        tag: Box<Expr>,
        quasis: Vec<String>,
        expressions: Vec<Expr>,
    },
    Regex {
        pattern: String,
        flags: String,
    },
    Array(Vec<Option<Expr>>),
    Object(Vec<ObjectProp>),
    Function(FunctionId),
    Unary {
        operator: UnaryOperator,
        argument: Box<Expr>,
    },
    Update {
        operator: UpdateOperator,
        prefix: bool,
        argument: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        operator: LogicalOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        operator: AssignOperator,
        target: Box<Pattern>,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProp,
        optional: bool,
    },
    Sequence(Vec<Expr>),
    Spread(Box<Expr>),
    Await(Box<Expr>),
    Yield {
        argument: Option<Box<Expr>>,
        delegate: bool,
    },
    JsxElement(Box<JsxElement>),
    JsxFragment(Vec<JsxChild>),

    // A block comment printed right before the expression
    Annotated {
        comment: String,
        expression: Box<Expr>,
    },
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Expr {
        Expr::Identifier(name.into())
    }

    pub fn number(value: usize) -> Expr {
        Expr::Number(value.to_string())
    }

    pub fn member(object: Expr, property: &str) -> Expr {
        Expr::Member {
            object: Box::new(object),
            property: MemberProp::Identifier(property.to_owned()),
            optional: false,
        }
    }

    pub fn computed_member(object: Expr, property: Expr) -> Expr {
        Expr::Member {
            object: Box::new(object),
            property: MemberProp::Computed(Box::new(property)),
            optional: false,
        }
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(callee),
            arguments,
            optional: false,
        }
    }

    pub fn binary(operator: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn logical(operator: LogicalOperator, left: Expr, right: Expr) -> Expr {
        Expr::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: Pattern, value: Expr) -> Expr {
        Expr::Assign {
            operator: AssignOperator::Assign,
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn undefined() -> Expr {
        Expr::Identifier(String::from("undefined"))
    }

    pub fn is_jsx(&self) -> bool {
        matches!(self, Expr::JsxElement(_) | Expr::JsxFragment(_))
    }

    /// Literals and plain identifiers never need their own cache slot.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            Expr::Identifier(_)
                | Expr::This
                | Expr::Null
                | Expr::Bool(_)
                | Expr::Number(_)
                | Expr::String(_)
                | Expr::Regex { .. }
        ) || matches!(self, Expr::Template { expressions, .. } if expressions.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Identifier(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProp {
    KeyValue { key: PropKey, value: Expr },
    Shorthand(String),
    Method {
        key: PropKey,
        kind: MethodKind,
        function: FunctionId,
    },
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Typeof => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Exponent,
    BitOr,
    BitXor,
    BitAnd,
    In,
    Instanceof,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::UnsignedShiftRight => ">>>",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::In => "in",
            BinaryOperator::Instanceof => "instanceof",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::BitOr => 7,
            BinaryOperator::BitXor => 8,
            BinaryOperator::BitAnd => 9,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::StrictEqual
            | BinaryOperator::StrictNotEqual => 10,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual
            | BinaryOperator::In
            | BinaryOperator::Instanceof => 11,
            BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight
            | BinaryOperator::UnsignedShiftRight => 12,
            BinaryOperator::Add | BinaryOperator::Subtract => 13,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Remainder => 14,
            BinaryOperator::Exponent => 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Nullish,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
            LogicalOperator::Nullish => "??",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            LogicalOperator::Nullish => 4,
            LogicalOperator::Or => 5,
            LogicalOperator::And => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Exponent,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Nullish,
}

impl AssignOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOperator::Assign => "=",
            AssignOperator::Add => "+=",
            AssignOperator::Subtract => "-=",
            AssignOperator::Multiply => "*=",
            AssignOperator::Divide => "/=",
            AssignOperator::Remainder => "%=",
            AssignOperator::Exponent => "**=",
            AssignOperator::ShiftLeft => "<<=",
            AssignOperator::ShiftRight => ">>=",
            AssignOperator::UnsignedShiftRight => ">>>=",
            AssignOperator::BitAnd => "&=",
            AssignOperator::BitOr => "|=",
            AssignOperator::BitXor => "^=",
            AssignOperator::And => "&&=",
            AssignOperator::Or => "||=",
            AssignOperator::Nullish => "??=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub name: JsxName,
    pub attributes: Vec<JsxAttribute>,
    pub children: Vec<JsxChild>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxName {
    Identifier(String),
    Member(Vec<String>),
    Namespaced(String, String),
}

impl JsxName {
    /// Lowercase names are host elements, everything else refers to a binding.
    pub fn is_intrinsic(&self) -> bool {
        match self {
            JsxName::Identifier(name) => name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_lowercase())
                || name.contains('-'),
            JsxName::Namespaced(..) => true,
            JsxName::Member(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttribute {
    Attribute {
        name: String,
        value: Option<JsxAttributeValue>,
    },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttributeValue {
    // Raw text including quotes
    String(String),
    Expression(Expr),
    Element(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Text(String),
    Expression(Expr),
    // {} or {/* comment */}
    EmptyExpression,
    Spread(Expr),
    Element(Expr),
}
