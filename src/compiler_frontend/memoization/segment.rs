//! Segments are the units of dependency tracking and conditional recomputation.
//!
//! Every statement the analysis reaches inside a component gets exactly one segment,
//! and so do the function body and each parameter. Segments live in the component's
//! arena and refer to each other by `SegmentId`.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{StmtId, StmtKind};
use crate::compiler_frontend::analysis::scope::is_opaque_statement;
use crate::compiler_frontend::memoization::access_chain::AccessChain;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SegmentId(pub u32);

/// Where a segment sits in the function. Looking a segment up by its site is the
/// only way segments get created, so each site maps to one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentSite {
    Root,
    Param(usize),
    Statement(StmtId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentKind {
    // The function body
    Root,
    Param,
    Block,

    // If and try statements, their child blocks are segments of their own
    ControlFlow,

    // Loops, switch and labeled statements, analysed as one unit
    Opaque,

    Statement,
    Return,
}

impl SegmentKind {
    pub fn of_statement(kind: &StmtKind) -> SegmentKind {
        match kind {
            StmtKind::Block(_) => SegmentKind::Block,
            StmtKind::If { .. } | StmtKind::Try { .. } => SegmentKind::ControlFlow,
            StmtKind::Return(_) => SegmentKind::Return,
            other if is_opaque_statement(other) => SegmentKind::Opaque,
            _ => SegmentKind::Statement,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SegmentFlags {
    // Owns a cache slot because something depends on its value
    pub component_variable: bool,

    // Produced by pattern unwrapping
    pub unwrapped: bool,

    // JSX inside this block has been hoisted into named temporaries
    pub jsx_unwrapped: bool,

    // Contains a return statement
    pub return_network: bool,

    pub argument: bool,

    // Holds the lifted initial value of a for loop binding
    pub for_init: bool,

    pub hook_call: bool,

    // Reads a binding that can not own a slot (catch parameters, loop bindings)
    pub untrackable_read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    NotStarted,
    InProgress,
    Done,
}

/// An edge to a tracked segment, with the chain that was read from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDependency {
    pub target: SegmentId,
    pub chain: AccessChain,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub site: SegmentSite,
    pub kind: SegmentKind,
    pub parent: Option<SegmentId>,
    pub children: Vec<SegmentId>,
    pub dependencies: Vec<SegmentDependency>,

    // Statements that change this segment's variable after it is declared
    pub mutated_by: Vec<SegmentId>,

    pub slot: Option<usize>,
    pub tracked_name: Option<String>,
    pub flags: SegmentFlags,
    pub status: AnalysisStatus,

    // Replaced by finer grained segments
    pub destroyed: bool,
}

impl Segment {
    pub fn new(id: SegmentId, site: SegmentSite, kind: SegmentKind) -> Segment {
        Segment {
            id,
            site,
            kind,
            parent: None,
            children: Vec::new(),
            dependencies: Vec::new(),
            mutated_by: Vec::new(),
            slot: None,
            tracked_name: None,
            flags: SegmentFlags::default(),
            status: AnalysisStatus::NotStarted,
            destroyed: false,
        }
    }

    pub fn statement(&self) -> Option<StmtId> {
        match self.site {
            SegmentSite::Statement(id) => Some(id),
            SegmentSite::Root | SegmentSite::Param(_) => None,
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.slot.is_some()
    }

    /// Two edges to the same target reading the same chain are one edge.
    pub fn has_dependency(&self, target: SegmentId, chain: &AccessChain) -> bool {
        self.dependencies
            .iter()
            .any(|dependency| dependency.target == target && dependency.chain == *chain)
    }

    pub fn declares_binding(&self, ast: &Ast, name: &str) -> bool {
        match self.site {
            SegmentSite::Statement(id) => ast.declared_names(id).iter().any(|declared| declared == name),
            SegmentSite::Param(_) => self.tracked_name.as_deref() == Some(name),
            SegmentSite::Root => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/segment_tests.rs"]
mod tests;
