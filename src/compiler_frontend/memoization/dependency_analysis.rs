//! Dependency discovery.
//!
//! Analysis walks the segment tree top-down. Every read of a local binding is resolved
//! to the segment that declares it, that segment is promoted to a tracked variable
//! (unwrapping its pattern first when needed), analysed eagerly, and an edge carrying
//! the access chain is recorded. A target that is still being analysed means the
//! graph has a cycle, which is a hard error.

use crate::compiler_frontend::analysis::references::{Reference, statement_references, subtree_references};
use crate::compiler_frontend::analysis::scope::{BindingSite, Resolution, resolve_name};
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{StmtId, StmtKind};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::access_chain::AccessChain;
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::jsx_hoisting::hoist_block_jsx;
use crate::compiler_frontend::memoization::segment::{
    AnalysisStatus, SegmentDependency, SegmentId, SegmentKind,
};
use crate::compiler_frontend::memoization::unwrap_patterns::lift_for_initializers;
use crate::{return_compiler_error, segment_log};

impl Component {
    pub fn analyze(&mut self, ast: &mut Ast) -> Result<(), CompilerError> {
        let root = self.root;
        self.analyze_segment(ast, root)
    }

    pub(crate) fn analyze_segment(&mut self, ast: &mut Ast, id: SegmentId) -> Result<(), CompilerError> {
        if self.segment(id).status != AnalysisStatus::NotStarted {
            return Ok(());
        }
        self.segment_mut(id).status = AnalysisStatus::InProgress;

        let kind = self.segment(id).kind;
        let statement = self.segment(id).statement();

        match (kind, statement) {
            (SegmentKind::Root, _) => {
                let body = self.body;
                self.analyze_block(ast, body, id)?;
            }
            (SegmentKind::Param, _) => {}
            (SegmentKind::Block, Some(block)) => self.analyze_block(ast, block, id)?,
            (SegmentKind::ControlFlow, Some(statement)) => {
                self.analyze_header(ast, id, statement)?;
                for child in ast.child_statements(statement) {
                    let child = self.segment_for(ast, child)?;
                    self.analyze_segment(ast, child)?;
                }
            }
            (SegmentKind::Opaque, Some(statement)) => {
                if self.hooks.subtree_calls_hook(ast, statement) {
                    self.segment_mut(id).flags.hook_call = true;
                }
                for reference in subtree_references(ast, statement) {
                    self.handle_reference(ast, id, &reference)?;
                }
            }
            (SegmentKind::Statement | SegmentKind::Return, Some(statement)) => {
                self.analyze_header(ast, id, statement)?;
            }
            (_, None) => return_compiler_error!("Segment {} has no statement to analyse", id.0),
        }

        if let Some(statement) = self.segment(id).statement()
            && contains_return(ast, statement)
        {
            self.segment_mut(id).flags.return_network = true;
        }

        self.segment_mut(id).status = AnalysisStatus::Done;
        Ok(())
    }

    /// Normalises the block once, then analyses its statements until every one is done.
    /// Unwrapping can splice new statements into the block while this runs.
    fn analyze_block(&mut self, ast: &mut Ast, block: StmtId, id: SegmentId) -> Result<(), CompilerError> {
        self.prepare_block(ast, block, id)?;

        loop {
            let pending = ast.block_statements(block).iter().copied().find(|statement| {
                self.statement_segment(*statement)
                    .is_none_or(|segment| self.segment(segment).status == AnalysisStatus::NotStarted)
            });

            let Some(statement) = pending else {
                break;
            };

            let segment = self.segment_for(ast, statement)?;
            self.analyze_segment(ast, segment)?;
        }

        Ok(())
    }

    /// Wraps bare `if` branches into blocks, lifts for loop initialisers and hoists JSX.
    fn prepare_block(&mut self, ast: &mut Ast, block: StmtId, id: SegmentId) -> Result<(), CompilerError> {
        if self.segment(id).flags.jsx_unwrapped {
            return Ok(());
        }

        for statement in ast.block_statements(block).to_vec() {
            if let StmtKind::If {
                consequent,
                alternate,
                ..
            } = ast.kind(statement)
            {
                let branches: Vec<StmtId> = std::iter::once(*consequent).chain(*alternate).collect();
                for branch in branches {
                    if !matches!(ast.kind(branch), StmtKind::Block(_)) {
                        ast.wrap_in_block(branch);
                    }
                }
            }
        }

        let lifted = lift_for_initializers(ast, block);
        self.for_init_statements.extend(lifted);

        let hoisted = hoist_block_jsx(ast, block);
        segment_log!("Prepared block ", #block, " hoisted ", #hoisted, " JSX values");

        self.segment_mut(id).flags.jsx_unwrapped = true;
        self.refresh_index(ast)
    }

    fn analyze_header(&mut self, ast: &mut Ast, id: SegmentId, statement: StmtId) -> Result<(), CompilerError> {
        if self.hooks.statement_calls_hook(ast, statement) {
            self.segment_mut(id).flags.hook_call = true;
        }

        for reference in statement_references(ast, statement) {
            self.handle_reference(ast, id, &reference)?;
        }

        Ok(())
    }

    fn handle_reference(&mut self, ast: &mut Ast, id: SegmentId, reference: &Reference) -> Result<(), CompilerError> {
        let Resolution::Local(site) = resolve_name(ast, &self.index, reference.statement, &reference.name)
        else {
            return Ok(());
        };

        // Self references and bindings internal to an opaque unit
        if let (Some(own), Some(declared_at)) = (self.segment(id).statement(), site.statement())
            && ast.contains_statement(own, declared_at)
        {
            return Ok(());
        }

        if !self.is_trackable_site(ast, site) {
            self.segment_mut(id).flags.untrackable_read = true;
            return Ok(());
        }

        let target = self.ensure_component_variable(ast, id, site, &reference.name)?;
        self.add_dependency(ast, id, target, reference.chain.trackable_prefix())
    }

    /// Declarations inside loops, switches and blocks that were never prepared can not own a slot.
    fn is_trackable_site(&self, ast: &Ast, site: BindingSite) -> bool {
        if !site.is_trackable() {
            return false;
        }
        let BindingSite::Declaration(statement) = site else {
            return true;
        };

        if self.index.opaque_ancestor(ast, statement).is_some() {
            return false;
        }
        let Some(parent) = self.index.parent(statement) else {
            return false;
        };
        self.statement_segment(parent)
            .is_some_and(|block| self.segment(block).flags.jsx_unwrapped)
    }

    /// Promotes the segment declaring `name` to a tracked variable and returns it.
    /// A destructuring or multi-declarator declaration is unwrapped first.
    pub(crate) fn ensure_component_variable(
        &mut self,
        ast: &mut Ast,
        from: SegmentId,
        site: BindingSite,
        name: &str,
    ) -> Result<SegmentId, CompilerError> {
        match site {
            BindingSite::Param(position) => {
                let Some(&param) = self.params.get(position) else {
                    return Err(CompilerError::binding_not_found(name, self.location_of(ast, from)));
                };
                self.allocate_cache_space(param, name);
                Ok(param)
            }

            BindingSite::Declaration(statement) => {
                let declaration = self.segment_for(ast, statement)?;

                if declaration != from && self.segment(declaration).status == AnalysisStatus::InProgress {
                    return Err(CompilerError::circular_dependency(
                        &self.code_of(ast, from),
                        &self.code_of(ast, declaration),
                        self.location_of(ast, from),
                    ));
                }

                let code = self.code_of(ast, declaration);
                let location = self.location_of(ast, declaration);
                let unwrapped = self.unwrap_segment(ast, declaration)?;

                let Some(target) = unwrapped
                    .into_iter()
                    .find(|segment| self.segment(*segment).declares_binding(ast, name))
                else {
                    return Err(CompilerError::component_variable_not_ensured(&code, location));
                };

                self.allocate_cache_space(target, name);
                Ok(target)
            }

            BindingSite::ForInit(_) | BindingSite::ForHead(_) | BindingSite::Catch(_) => {
                Err(CompilerError::binding_not_found(name, self.location_of(ast, from)))
            }
        }
    }

    /// Records an edge, analysing the target first so its own edges exist before anything
    /// that depends on it is transformed.
    pub(crate) fn add_dependency(
        &mut self,
        ast: &mut Ast,
        from: SegmentId,
        target: SegmentId,
        chain: AccessChain,
    ) -> Result<(), CompilerError> {
        if from == target || self.segment(from).has_dependency(target, &chain) {
            return Ok(());
        }

        match self.segment(target).status {
            AnalysisStatus::InProgress => {
                return Err(CompilerError::circular_dependency(
                    &self.code_of(ast, from),
                    &self.code_of(ast, target),
                    self.location_of(ast, from),
                ));
            }
            AnalysisStatus::NotStarted => self.analyze_segment(ast, target)?,
            AnalysisStatus::Done => {}
        }

        segment_log!("Edge ", #from.0, " -> ", #target.0, " reading ", chain.stringify());

        self.segment_mut(from)
            .dependencies
            .push(SegmentDependency { target, chain });

        Ok(())
    }
}

/// Whether a return sits anywhere in the statement, outside nested functions.
pub fn contains_return(ast: &Ast, statement: StmtId) -> bool {
    let mut stack = vec![statement];
    while let Some(current) = stack.pop() {
        if matches!(ast.kind(current), StmtKind::Return(_)) {
            return true;
        }
        stack.extend(ast.child_statements(current));
    }
    false
}

#[cfg(test)]
#[path = "tests/dependency_analysis_tests.rs"]
mod tests;
