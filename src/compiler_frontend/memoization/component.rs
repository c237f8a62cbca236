//! One component or hook being memoized.
//!
//! The component owns the segment arena for its function, hands out cache slots and
//! holds the three generated names the rewritten body uses to talk to the runtime.

use crate::compiler_frontend::analysis::hook_calls::HookPredicate;
use crate::compiler_frontend::analysis::scope::TreeIndex;
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, DeclKind, Expr, FunctionId, Pattern, StmtId,
};
use crate::compiler_frontend::codegen::js::{print_pattern, print_statement};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::recompute_groups::BlockPlan;
use crate::compiler_frontend::memoization::segment::{
    AnalysisStatus, Segment, SegmentId, SegmentKind, SegmentSite,
};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::projects::settings::{CACHE_NAME, COMMIT_NAME, NULL_NAME, PROPS_TEMP};
use crate::{return_compiler_error, segment_log};
use rustc_hash::{FxHashMap, FxHashSet};

pub struct Component {
    pub name: String,
    pub function: FunctionId,

    // The function body block, after an expression bodied arrow has been expanded
    pub body: StmtId,

    pub cache_name: String,
    pub commit_name: String,
    pub null_name: String,

    pub(crate) segments: Vec<Segment>,
    sites: FxHashMap<SegmentSite, SegmentId>,
    pub(crate) root: SegmentId,
    pub(crate) params: Vec<SegmentId>,

    // Slot index to the segment that owns it
    pub(crate) slots: Vec<SegmentId>,

    pub(crate) index: TreeIndex,
    pub(crate) hooks: HookPredicate,

    // `let _unwrapped = init` statements lifted out of for loop heads
    pub(crate) for_init_statements: FxHashSet<StmtId>,

    // Set when the analysis saw any local binding being mutated
    pub(crate) mutates_locals: bool,

    pub(crate) plans: FxHashMap<StmtId, BlockPlan>,
}

impl Component {
    /// Prepares the function for analysis: expands an expression bodied arrow,
    /// replaces destructured or defaulted parameters with `_props` temporaries
    /// and creates the root and parameter segments.
    pub fn new(
        ast: &mut Ast,
        name: &str,
        function: FunctionId,
        hooks: HookPredicate,
    ) -> Result<Component, CompilerError> {
        let body = ast.expand_arrow_body(function);
        let prologue = normalize_parameters(ast, function, body);
        if !prologue.is_empty() {
            ast.prepend_to_block(body, prologue);
        }

        let Some(index) = TreeIndex::build(ast, function) else {
            return_compiler_error!("Function '{}' has no block body after expansion", name);
        };

        let cache_name = ast.generate_unique_name(CACHE_NAME);
        let commit_name = ast.generate_unique_name(COMMIT_NAME);
        let null_name = ast.generate_unique_name(NULL_NAME);

        let mut component = Component {
            name: name.to_owned(),
            function,
            body,
            cache_name,
            commit_name,
            null_name,
            segments: Vec::new(),
            sites: FxHashMap::default(),
            root: SegmentId(0),
            params: Vec::new(),
            slots: Vec::new(),
            index,
            hooks,
            for_init_statements: FxHashSet::default(),
            mutates_locals: false,
            plans: FxHashMap::default(),
        };

        component.root = component.push_segment(SegmentSite::Root, SegmentKind::Root, None);

        let param_names: Vec<Option<String>> = ast
            .function(function)
            .params
            .iter()
            .map(|param| match param {
                Pattern::Identifier(name) => Some(name.clone()),
                Pattern::Rest(inner) => match inner.as_ref() {
                    Pattern::Identifier(name) => Some(name.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        for (position, param_name) in param_names.into_iter().enumerate() {
            let root = component.root;
            let id = component.push_segment(SegmentSite::Param(position), SegmentKind::Param, Some(root));
            let segment = component.segment_mut(id);
            segment.flags.argument = true;
            segment.tracked_name = param_name;
            segment.status = AnalysisStatus::Done;
            component.params.push(id);
        }

        Ok(component)
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0 as usize]
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id.0 as usize]
    }

    /// Every segment that has not been replaced by unwrapping, in creation order.
    pub fn live_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|segment| !segment.destroyed)
    }

    pub fn root(&self) -> SegmentId {
        self.root
    }

    pub fn slots(&self) -> &[SegmentId] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn mutates_locals(&self) -> bool {
        self.mutates_locals
    }

    pub fn site_segment(&self, site: SegmentSite) -> Option<SegmentId> {
        self.sites.get(&site).copied()
    }

    pub fn statement_segment(&self, statement: StmtId) -> Option<SegmentId> {
        if statement == self.body {
            return Some(self.root);
        }
        self.site_segment(SegmentSite::Statement(statement))
    }

    pub(crate) fn refresh_index(&mut self, ast: &Ast) -> Result<(), CompilerError> {
        match TreeIndex::build(ast, self.function) {
            Some(index) => {
                self.index = index;
                Ok(())
            }
            None => return_compiler_error!("Lost the block body of '{}'", self.name),
        }
    }

    fn push_segment(
        &mut self,
        site: SegmentSite,
        kind: SegmentKind,
        parent: Option<SegmentId>,
    ) -> SegmentId {
        let id = SegmentId(self.segments.len() as u32);
        let mut segment = Segment::new(id, site, kind);
        segment.parent = parent;
        self.segments.push(segment);
        self.sites.insert(site, id);

        if let Some(parent) = parent {
            self.segment_mut(parent).children.push(id);
        }

        segment_log!("Created segment ", #id.0, " for ", #site);
        id
    }

    /// Looks the statement's segment up, creating it and any missing ancestor
    /// segments on the way.
    pub(crate) fn segment_for(&mut self, ast: &Ast, statement: StmtId) -> Result<SegmentId, CompilerError> {
        if let Some(existing) = self.statement_segment(statement) {
            return Ok(existing);
        }

        let Some(parent_statement) = self.index.parent(statement) else {
            return_compiler_error!(
                "Statement '{}' is not part of component '{}'",
                print_statement(ast, statement),
                self.name
            );
        };

        let parent = self.segment_for(ast, parent_statement)?;
        let kind = SegmentKind::of_statement(ast.kind(statement));
        let id = self.push_segment(SegmentSite::Statement(statement), kind, Some(parent));

        if self.for_init_statements.contains(&statement) {
            self.segment_mut(id).flags.for_init = true;
        }

        Ok(id)
    }

    /// Creates the segment for a statement produced by unwrapping, under the given parent.
    pub(crate) fn adopt_statement(&mut self, ast: &Ast, statement: StmtId, parent: SegmentId) -> SegmentId {
        let kind = SegmentKind::of_statement(ast.kind(statement));
        let id = self.push_segment(SegmentSite::Statement(statement), kind, Some(parent));
        self.segment_mut(id).flags.unwrapped = true;
        id
    }

    /// Detaches a segment from its parent and the site map. Its arena entry stays so ids remain valid.
    pub(crate) fn destroy_segment(&mut self, id: SegmentId) {
        let (site, parent) = {
            let segment = self.segment_mut(id);
            segment.destroyed = true;
            (segment.site, segment.parent.take())
        };

        self.sites.remove(&site);
        if let Some(parent) = parent {
            self.segment_mut(parent).children.retain(|child| *child != id);
        }

        segment_log!("Destroyed segment ", #id.0);
    }

    /// Hands out the next slot. Called once per segment, when it is first promoted.
    pub(crate) fn allocate_cache_space(&mut self, id: SegmentId, name: &str) -> usize {
        if let Some(slot) = self.segment(id).slot {
            return slot;
        }

        let slot = self.slots.len();
        self.slots.push(id);

        let segment = self.segment_mut(id);
        segment.slot = Some(slot);
        segment.tracked_name = Some(name.to_owned());
        segment.flags.component_variable = true;

        segment_log!(Green "Slot ", #slot, " => ", name);
        slot
    }

    /// The segment and every live segment below it.
    pub fn subtree_segments(&self, id: SegmentId) -> Vec<SegmentId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.segment(current).children.iter().rev().copied());
        }
        found
    }

    /// Source text of a segment, for diagnostics and graphs.
    pub fn code_of(&self, ast: &Ast, id: SegmentId) -> String {
        let segment = self.segment(id);
        match segment.site {
            SegmentSite::Root => format!("function {}", self.name),
            SegmentSite::Param(position) => ast
                .function(self.function)
                .params
                .get(position)
                .map(|param| print_pattern(ast, param))
                .unwrap_or_default(),
            SegmentSite::Statement(statement) => print_statement(ast, statement),
        }
    }

    pub fn location_of(&self, ast: &Ast, id: SegmentId) -> TextLocation {
        match self.segment(id).statement() {
            Some(statement) => ast.location(statement),
            None => ast.location(self.body),
        }
    }

    /// The name a slot was allocated for.
    pub fn slot_name(&self, slot: usize) -> &str {
        self.slots
            .get(slot)
            .and_then(|id| self.segment(*id).tracked_name.as_deref())
            .unwrap_or_default()
    }
}

/// Rewrites `function F({ a, b = 1 }, [c] = [])` into
/// `function F(_props, _props2) { let { a, b = 1 } = _props; let [c] = _props2 === undefined ? [] : _props2; ... }`
/// and returns the new prologue statements.
fn normalize_parameters(ast: &mut Ast, function: FunctionId, body: StmtId) -> Vec<StmtId> {
    let location = ast.location(body);
    let params = std::mem::take(&mut ast.function_mut(function).params);
    let mut normalized = Vec::with_capacity(params.len());
    let mut prologue = Vec::new();

    for param in params {
        let (target, rest) = match param {
            Pattern::Identifier(_) => {
                normalized.push(param);
                continue;
            }
            Pattern::Rest(inner) if matches!(inner.as_ref(), Pattern::Identifier(_)) => {
                normalized.push(Pattern::Rest(inner));
                continue;
            }
            Pattern::Rest(inner) => (*inner, true),
            other => (other, false),
        };

        let temp = ast.generate_unique_name(PROPS_TEMP);
        let (target, init) = match target {
            Pattern::Default { target, value } => (
                *target,
                Expr::Conditional {
                    test: Box::new(Expr::binary(
                        BinaryOperator::StrictEqual,
                        Expr::identifier(&temp),
                        Expr::undefined(),
                    )),
                    consequent: value,
                    alternate: Box::new(Expr::identifier(&temp)),
                },
            ),
            other => (other, Expr::identifier(&temp)),
        };

        let temp_pattern = Pattern::Identifier(temp);
        normalized.push(if rest {
            Pattern::Rest(Box::new(temp_pattern))
        } else {
            temp_pattern
        });

        prologue.push(ast.variable_declaration(DeclKind::Let, target, Some(init), location));
    }

    ast.function_mut(function).params = normalized;
    prologue
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;
