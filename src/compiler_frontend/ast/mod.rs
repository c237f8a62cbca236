pub mod ast;
pub mod ast_nodes;
pub mod build_ast;
pub mod visit;
pub(crate) mod expressions {
    pub(crate) mod jsx;
    pub(crate) mod parse_expression;
}
pub(crate) mod statements {
    pub(crate) mod branching;
    pub(crate) mod declarations;
    pub(crate) mod functions;
    pub(crate) mod loops;
    pub(crate) mod modules;
    pub(crate) mod parse_statement;
}
