//! Emission order for one planned block.
//!
//! Units are visited in source order and each one pulls the units it depends on in
//! front of itself, depth first. A unit met again while it is still being visited
//! closes a cycle.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::recompute_groups::{BlockPlan, Unit};
use crate::compiler_frontend::ast::ast_nodes::StmtId;
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Done,
}

pub(crate) fn order_units(component: &Component, ast: &Ast, plan: &BlockPlan) -> Result<Vec<Unit>, CompilerError> {
    let mut topology = Topology {
        component,
        ast,
        plan,
        state: FxHashMap::default(),
        order: Vec::with_capacity(plan.statements.len()),
    };

    for &statement in &plan.statements {
        let unit = plan.unit_of(statement);

        // A gated group is placed where its last member was
        if let Unit::Group(index) = unit
            && plan.groups[index].members.last() != Some(&statement)
        {
            continue;
        }

        topology.visit(unit, None)?;
    }

    Ok(topology.order)
}

struct Topology<'a> {
    component: &'a Component,
    ast: &'a Ast,
    plan: &'a BlockPlan,
    state: FxHashMap<Unit, VisitState>,
    order: Vec<Unit>,
}

impl Topology<'_> {
    fn visit(&mut self, unit: Unit, from: Option<Unit>) -> Result<(), CompilerError> {
        match self.state.get(&unit) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::Visiting) => {
                let from = from.unwrap_or(unit);
                return Err(CompilerError::circular_dependency(
                    &self.code_of(from),
                    &self.code_of(unit),
                    self.ast.location(self.first_statement(from)),
                ));
            }
            None => {}
        }

        self.state.insert(unit, VisitState::Visiting);
        for dependency in self.dependencies(unit) {
            self.visit(dependency, Some(unit))?;
        }
        self.state.insert(unit, VisitState::Done);
        self.order.push(unit);

        Ok(())
    }

    fn members(&self, unit: Unit) -> Vec<StmtId> {
        match unit {
            Unit::Group(index) => self.plan.groups[index].members.clone(),
            Unit::Statement(statement) => vec![statement],
        }
    }

    fn first_statement(&self, unit: Unit) -> StmtId {
        match unit {
            Unit::Group(index) => self.plan.groups[index].members[0],
            Unit::Statement(statement) => statement,
        }
    }

    fn code_of(&self, unit: Unit) -> String {
        self.component
            .statement_segment(self.first_statement(unit))
            .map(|segment| self.component.code_of(self.ast, segment))
            .unwrap_or_default()
    }

    /// Units of this block that the unit's segments, or any segment nested in them, depend on.
    fn dependencies(&self, unit: Unit) -> Vec<Unit> {
        let mut found = Vec::new();

        for member in self.members(unit) {
            let Some(segment) = self.component.statement_segment(member) else {
                continue;
            };

            for id in self.component.subtree_segments(segment) {
                for dependency in &self.component.segment(id).dependencies {
                    let Some(target) = self.component.segment(dependency.target).statement() else {
                        continue;
                    };

                    let owner = if self.plan.group_of.contains_key(&target) {
                        Some(target)
                    } else {
                        self.component.index.child_of_block(self.plan.block, target)
                    };

                    let Some(owner) = owner else {
                        continue;
                    };

                    let owner_unit = self.plan.unit_of(owner);
                    if owner_unit != unit && !found.contains(&owner_unit) {
                        found.push(owner_unit);
                    }
                }
            }
        }

        found
    }
}
