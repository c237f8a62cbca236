//! Recomputation groups.
//!
//! Caching one variable is only sound when everything that can change its value is
//! recomputed with it. Inside each plannable block, a declaration, the statements that
//! mutate it and the statements in between that touch it are merged into one group.
//! A group is either gated as a whole, recomputed only when a dependency changed, or
//! pinned and left to run on every render.
//!
//! Plannable blocks are the function body and the blocks under `if`, `try` and bare
//! block statements. Loop, switch and labeled bodies are never planned.

use crate::compiler_frontend::analysis::mutations::{AliasGraph, subtree_mutations};
use crate::compiler_frontend::analysis::references::subtree_references;
use crate::compiler_frontend::analysis::scope::{BindingSite, Resolution, resolve_name};
use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{DeclKind, ForHead, ForInit, StmtId, StmtKind};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::access_chain::AccessChain;
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::dependency_analysis::contains_return;
use crate::compiler_frontend::memoization::segment::{SegmentId, SegmentSite};
use crate::compiler_frontend::memoization::topology::order_units;
use crate::compiler_frontend::memoization::unwrap_patterns::is_atomic;
use crate::segment_log;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Why a group runs on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PinReason {
    Return,
    HookCall,
    UntrackableRead,
    OuterMutation,
    VarDeclaration,
    Destructuring,
    NothingTracked,
    // Reads a variable that something outside its own gate can change
    VolatileDependency,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecomputeGroup {
    // In source order
    pub members: Vec<StmtId>,
    pub gated: bool,
    pub pinned_by: Option<PinReason>,
}

/// One thing emitted into a rewritten block: a whole gated group or a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Group(usize),
    Statement(StmtId),
}

#[derive(Debug, Clone)]
pub struct BlockPlan {
    pub block: StmtId,

    // The block's statements before the rewrite, in source order
    pub statements: Vec<StmtId>,
    pub groups: Vec<RecomputeGroup>,
    pub(crate) group_of: FxHashMap<StmtId, usize>,

    // Emission order, filled in by the topological sort
    pub units: Vec<Unit>,
}

impl BlockPlan {
    pub fn group(&self, statement: StmtId) -> Option<&RecomputeGroup> {
        self.group_of.get(&statement).map(|index| &self.groups[*index])
    }

    /// The unit a statement of this block is emitted in.
    pub fn unit_of(&self, statement: StmtId) -> Unit {
        match self.group_of.get(&statement) {
            Some(&index) if self.groups[index].gated => Unit::Group(index),
            _ => Unit::Statement(statement),
        }
    }
}

#[derive(Debug, Default)]
struct StatementFacts {
    reads: FxHashSet<BindingSite>,
    mutates: FxHashSet<BindingSite>,
    mutates_global: bool,
    has_return: bool,
    hook_call: bool,
    untrackable_read: bool,
    declares_var: bool,
    non_atomic: bool,
}

impl Component {
    /// Splits every reachable block into groups, decides which groups are gated,
    /// hands out the remaining slots and orders each block for emission.
    pub fn plan_recomputation(&mut self, ast: &Ast) -> Result<(), CompilerError> {
        let aliases = AliasGraph::build(ast, &self.index);
        let blocks = self.plannable_blocks(ast);

        let mut facts: FxHashMap<StmtId, StatementFacts> = FxHashMap::default();
        for &block in &blocks {
            for &statement in ast.block_statements(block) {
                let statement_facts = self.statement_facts(ast, statement, &aliases);
                facts.insert(statement, statement_facts);
            }
        }

        propagate_closure_mutations(ast, &mut facts);

        self.mutates_locals = facts.values().any(|statement_facts| {
            statement_facts
                .mutates
                .iter()
                .any(|site| matches!(site, BindingSite::Declaration(_) | BindingSite::Param(_)))
        });

        let mut plans: FxHashMap<StmtId, BlockPlan> = FxHashMap::default();
        for &block in &blocks {
            let plan = self.plan_block(ast, block, &facts);
            plans.insert(block, plan);
        }

        self.ungate_volatile_groups(ast, &mut plans, &facts);

        // Only blocks that are emitted statement by statement keep a plan
        let mut reachable = FxHashMap::default();
        let mut stack = vec![self.body];
        while let Some(block) = stack.pop() {
            let Some(plan) = plans.remove(&block) else {
                continue;
            };

            for group in &plan.groups {
                if group.gated {
                    self.track_group(ast, group);
                } else {
                    for &member in &group.members {
                        stack.extend(nested_blocks(ast, member));
                    }
                }
            }

            reachable.insert(block, plan);
        }

        for plan in reachable.values_mut() {
            plan.units = order_units(self, ast, plan)?;
        }

        segment_log!(Blue "Planned ", #reachable.len(), " blocks for ", self.name);
        self.plans = reachable;
        Ok(())
    }

    /// The body and every block nested under `if`, `try` and block statements.
    fn plannable_blocks(&self, ast: &Ast) -> Vec<StmtId> {
        let mut blocks = Vec::new();
        let mut stack = vec![self.body];
        while let Some(block) = stack.pop() {
            blocks.push(block);
            for &statement in ast.block_statements(block) {
                stack.extend(nested_blocks(ast, statement));
            }
        }
        blocks
    }

    fn statement_facts(&self, ast: &Ast, statement: StmtId, aliases: &AliasGraph) -> StatementFacts {
        let mut facts = StatementFacts::default();

        for reference in subtree_references(ast, statement) {
            if let Resolution::Local(site) = resolve_name(ast, &self.index, reference.statement, &reference.name) {
                facts.reads.insert(site);
            }
        }

        for mutation in subtree_mutations(ast, statement) {
            match resolve_name(ast, &self.index, mutation.statement, &mutation.name) {
                Resolution::Local(site) => facts.mutates.extend(aliases.expand(site)),
                Resolution::Outer => facts.mutates_global = true,
            }
        }

        facts.has_return = contains_return(ast, statement);
        facts.hook_call = self.hooks.subtree_calls_hook(ast, statement);
        facts.untrackable_read = self.statement_segment(statement).is_some_and(|segment| {
            self.subtree_segments(segment)
                .iter()
                .any(|id| self.segment(*id).flags.untrackable_read)
        });
        facts.declares_var = declares_var(ast, statement);
        facts.non_atomic = matches!(
            ast.kind(statement),
            StmtKind::VarDecl(declaration) if !is_atomic(&declaration.declarators)
        );

        facts
    }

    fn plan_block(&mut self, ast: &Ast, block: StmtId, facts: &FxHashMap<StmtId, StatementFacts>) -> BlockPlan {
        let statements = ast.block_statements(block).to_vec();
        let position: FxHashMap<StmtId, usize> = statements
            .iter()
            .enumerate()
            .map(|(index, statement)| (*statement, index))
            .collect();

        let empty = StatementFacts::default();
        let facts_of = |index: usize| facts.get(&statements[index]).unwrap_or(&empty);

        let mut sets = UnionFind::new(statements.len());
        let mut outer_mutation = vec![false; statements.len()];

        for (index, &statement) in statements.iter().enumerate() {
            let statement_facts = facts_of(index);
            if statement_facts.mutates_global {
                outer_mutation[index] = true;
            }

            for site in &statement_facts.mutates {
                let own = match site {
                    BindingSite::Declaration(declaration) => position.get(declaration).copied(),
                    _ => None,
                };

                match own {
                    Some(declaration) => {
                        if declaration != index {
                            sets.union(index, declaration);
                            self.record_mutation(statements[declaration], statement);
                        }
                    }
                    // Bindings local to the statement itself
                    None if site
                        .statement()
                        .is_some_and(|declared_at| ast.contains_statement(statement, declared_at)) => {}
                    None => outer_mutation[index] = true,
                }
            }
        }

        // Statements inside a group's span that touch its variables join it
        loop {
            let mut changed = false;

            for members in sets.groups() {
                let declared: FxHashSet<BindingSite> = members
                    .iter()
                    .filter(|member| !ast.declared_names(statements[**member]).is_empty())
                    .map(|member| BindingSite::Declaration(statements[*member]))
                    .collect();

                if declared.is_empty() {
                    continue;
                }

                let first = members[0];
                let last = members[members.len() - 1];
                for candidate in first..=last {
                    if sets.find(candidate) == sets.find(first) {
                        continue;
                    }
                    let candidate_facts = facts_of(candidate);
                    let touches = candidate_facts
                        .reads
                        .iter()
                        .chain(&candidate_facts.mutates)
                        .any(|site| declared.contains(site));
                    if touches {
                        sets.union(candidate, first);
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        let mut groups = Vec::new();
        let mut group_of = FxHashMap::default();

        for members in sets.groups() {
            let pinned_by = self.pin_reason(&members, &statements, &facts_of, &outer_mutation);
            let members: Vec<StmtId> = members.iter().map(|member| statements[*member]).collect();

            for &member in &members {
                group_of.insert(member, groups.len());
            }

            groups.push(RecomputeGroup {
                members,
                gated: pinned_by.is_none(),
                pinned_by,
            });
        }

        BlockPlan {
            block,
            statements,
            groups,
            group_of,
            units: Vec::new(),
        }
    }

    fn pin_reason<'f>(
        &self,
        members: &[usize],
        statements: &[StmtId],
        facts_of: &impl Fn(usize) -> &'f StatementFacts,
        outer_mutation: &[bool],
    ) -> Option<PinReason> {
        let any = |check: &dyn Fn(&StatementFacts) -> bool| members.iter().any(|member| check(facts_of(*member)));

        if any(&|facts| facts.has_return) {
            return Some(PinReason::Return);
        }
        if any(&|facts| facts.hook_call) {
            return Some(PinReason::HookCall);
        }
        if any(&|facts| facts.untrackable_read) {
            return Some(PinReason::UntrackableRead);
        }
        if members.iter().any(|member| outer_mutation[*member]) {
            return Some(PinReason::OuterMutation);
        }
        if any(&|facts| facts.declares_var) {
            return Some(PinReason::VarDeclaration);
        }
        if any(&|facts| facts.non_atomic) {
            return Some(PinReason::Destructuring);
        }

        let tracked = members.iter().any(|member| {
            self.statement_segment(statements[*member])
                .is_some_and(|segment| self.segment(segment).is_tracked())
        });
        if !tracked {
            return Some(PinReason::NothingTracked);
        }

        None
    }

    fn record_mutation(&mut self, declaration: StmtId, mutator: StmtId) {
        let (Some(target), Some(source)) = (self.statement_segment(declaration), self.statement_segment(mutator))
        else {
            return;
        };

        let mutated_by = &mut self.segment_mut(target).mutated_by;
        if !mutated_by.contains(&source) {
            mutated_by.push(source);
        }
    }

    /// A gated group must not read a variable that can change behind the back of the
    /// cached copy, so it is pinned instead. Pinning can make more variables volatile.
    fn ungate_volatile_groups(
        &self,
        ast: &Ast,
        plans: &mut FxHashMap<StmtId, BlockPlan>,
        facts: &FxHashMap<StmtId, StatementFacts>,
    ) {
        loop {
            let volatile = self.volatile_sites(ast, plans, facts);
            let mut changed = false;

            for plan in plans.values_mut() {
                for group in plan.groups.iter_mut().filter(|group| group.gated) {
                    let reads_volatile = self
                        .external_dependencies(ast, &group.members)
                        .iter()
                        .any(|(target, _)| self.binding_site(*target).is_some_and(|site| volatile.contains(&site)));

                    if reads_volatile {
                        group.gated = false;
                        group.pinned_by = Some(PinReason::VolatileDependency);
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }
    }

    /// Variables changed by something other than their own gated group.
    fn volatile_sites(
        &self,
        ast: &Ast,
        plans: &FxHashMap<StmtId, BlockPlan>,
        facts: &FxHashMap<StmtId, StatementFacts>,
    ) -> FxHashSet<BindingSite> {
        let mut mutators: FxHashMap<BindingSite, Vec<StmtId>> = FxHashMap::default();
        for (statement, statement_facts) in facts {
            for site in &statement_facts.mutates {
                if site.statement() != Some(*statement) {
                    mutators.entry(*site).or_default().push(*statement);
                }
            }
        }

        let mut volatile = FxHashSet::default();
        for (site, statements) in mutators {
            let contained = match site {
                BindingSite::Declaration(declaration) => self
                    .index
                    .parent(declaration)
                    .and_then(|block| plans.get(&block))
                    .and_then(|plan| plan.group(declaration))
                    .filter(|group| group.gated)
                    .is_some_and(|group| {
                        statements.iter().all(|mutator| {
                            group
                                .members
                                .iter()
                                .any(|member| ast.contains_statement(*member, *mutator))
                        })
                    }),
                _ => false,
            };

            if !contained {
                volatile.insert(site);
            }
        }

        volatile
    }

    /// Dependencies of the members' segments on segments outside the members.
    pub(crate) fn external_dependencies(&self, ast: &Ast, members: &[StmtId]) -> Vec<(SegmentId, AccessChain)> {
        let mut dependencies = Vec::new();

        for &member in members {
            let Some(segment) = self.statement_segment(member) else {
                continue;
            };

            for id in self.subtree_segments(segment) {
                for dependency in &self.segment(id).dependencies {
                    let internal = self.segment(dependency.target).statement().is_some_and(|target| {
                        members
                            .iter()
                            .any(|member| ast.contains_statement(*member, target))
                    });

                    let pair = (dependency.target, dependency.chain.clone());
                    if !internal && !dependencies.contains(&pair) {
                        dependencies.push(pair);
                    }
                }
            }
        }

        dependencies
    }

    fn binding_site(&self, id: SegmentId) -> Option<BindingSite> {
        match self.segment(id).site {
            SegmentSite::Param(position) => Some(BindingSite::Param(position)),
            SegmentSite::Statement(statement) => Some(BindingSite::Declaration(statement)),
            SegmentSite::Root => None,
        }
    }

    /// Every variable a gated group declares is cached, read or not.
    fn track_group(&mut self, ast: &Ast, group: &RecomputeGroup) {
        for &member in &group.members {
            let Some(segment) = self.statement_segment(member) else {
                continue;
            };
            if let [name] = ast.declared_names(member).as_slice() {
                self.allocate_cache_space(segment, name);
            }
        }
    }
}

/// Statement dependencies through closures: calling a function that mutates
/// something mutates it too.
fn propagate_closure_mutations(ast: &Ast, facts: &mut FxHashMap<StmtId, StatementFacts>) {
    let mut statements: Vec<StmtId> = facts.keys().copied().collect();
    statements.sort();

    loop {
        let mut changed = false;

        for &statement in &statements {
            let mut inherited = Vec::new();
            let mut global = false;

            for site in &facts[&statement].reads {
                let BindingSite::Declaration(declaration) = site else {
                    continue;
                };
                if ast.contains_statement(statement, *declaration) {
                    continue;
                }
                if let Some(declaration_facts) = facts.get(declaration) {
                    inherited.extend(declaration_facts.mutates.iter().copied());
                    global |= declaration_facts.mutates_global;
                }
            }

            let Some(statement_facts) = facts.get_mut(&statement) else {
                continue;
            };
            for site in inherited {
                changed |= statement_facts.mutates.insert(site);
            }
            if global && !statement_facts.mutates_global {
                statement_facts.mutates_global = true;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

/// Child blocks that get a plan of their own.
fn nested_blocks(ast: &Ast, statement: StmtId) -> Vec<StmtId> {
    match ast.kind(statement) {
        StmtKind::If { .. } | StmtKind::Try { .. } => ast
            .child_statements(statement)
            .into_iter()
            .filter(|child| matches!(ast.kind(*child), StmtKind::Block(_)))
            .collect(),
        StmtKind::Block(_) => vec![statement],
        _ => Vec::new(),
    }
}

fn declares_var(ast: &Ast, statement: StmtId) -> bool {
    let mut stack = vec![statement];
    while let Some(current) = stack.pop() {
        let is_var = match ast.kind(current) {
            StmtKind::VarDecl(declaration) => declaration.kind == DeclKind::Var,
            StmtKind::For {
                init: Some(ForInit::VarDecl(declaration)),
                ..
            } => declaration.kind == DeclKind::Var,
            StmtKind::ForIn {
                left: ForHead::VarDecl { kind, .. },
                ..
            }
            | StmtKind::ForOf {
                left: ForHead::VarDecl { kind, .. },
                ..
            } => *kind == DeclKind::Var,
            _ => false,
        };
        if is_var {
            return true;
        }
        stack.extend(ast.child_statements(current));
    }
    false
}

struct UnionFind {
    parents: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parents: (0..size).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parents[index] != index {
            self.parents[index] = self.parents[self.parents[index]];
            index = self.parents[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            // The smaller index stays the representative
            self.parents[a.max(b)] = a.min(b);
        }
    }

    /// Sets with their members ascending, ordered by first member.
    fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for index in 0..self.parents.len() {
            let root = self.find(index);
            by_root.entry(root).or_default().push(index);
        }

        let mut groups: Vec<Vec<usize>> = by_root.into_values().collect();
        groups.sort_by_key(|members| members[0]);
        groups
    }
}

#[cfg(test)]
#[path = "tests/recompute_groups_tests.rs"]
mod tests;
