//! Rewrites a planned component body.
//!
//! Gated groups become a callable behind a gate that compares the live value of every
//! dependency against its cached copy. Every other statement runs as before, in the
//! topological order of its block. Before each `return`, and where the body can fall
//! off its end, the values computed on that path are staged and committed:
//!
//! ```js
//! let doubled = $unforgetCache[1].v;
//! const _segment = () => { doubled = count * 2; };
//! if ($unforgetCache[1].n || count !== $unforgetCache[0].v) {
//!     _segment();
//!     $unforgetCache[1].e(doubled);
//! }
//! $unforgetCache[0].e(count);
//! $unforgetCommit();
//! return doubled;
//! ```

use crate::compiler_frontend::ast::ast::{Ast, pattern_binding_names};
use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, DeclKind, Expr, Function, FunctionBody, LogicalOperator, Pattern, StmtId, StmtKind,
};
use crate::compiler_frontend::analysis::scope::is_opaque_statement;
use crate::compiler_frontend::codegen::js::print_statement;
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::access_chain::AccessChain;
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::dependency_analysis::contains_return;
use crate::compiler_frontend::memoization::recompute_groups::{RecomputeGroup, Unit};
use crate::compiler_frontend::memoization::segment::SegmentId;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::projects::settings::{SEGMENT_CALLABLE, SLOT_ENQUEUE, SLOT_IS_UNSET, SLOT_VALUE};
use crate::{codegen_log, return_compiler_error};
use rustc_hash::FxHashSet;

impl Component {
    /// Rewrites the body in place. The tree must have been analysed and planned first.
    pub fn apply_transformation(&self, ast: &mut Ast, create_cache_export: &str) -> Result<(), CompilerError> {
        if !self.plans.contains_key(&self.body) {
            return_compiler_error!("Component '{}' was transformed before it was planned", self.name);
        }

        let gated = self.gated_segments();

        let mut computed: FxHashSet<SegmentId> = self
            .params
            .iter()
            .copied()
            .filter(|param| self.segment(*param).is_tracked())
            .collect();

        let mut emitter = BodyEmitter {
            component: self,
            gated,
        };

        emitter.emit_block(ast, self.body, &mut computed)?;

        // Falling off the end returns undefined, which still has to commit
        let falls_through = !matches!(
            ast.block_statements(self.body).last().map(|last| ast.kind(*last)),
            Some(StmtKind::Return(_) | StmtKind::Throw(_))
        );
        if falls_through {
            let location = ast.location(self.body);
            let protocol = emitter.commit_protocol(ast, &computed, location);
            let mut statements = ast.block_statements(self.body).to_vec();
            statements.extend(protocol);
            ast.set_block_statements(self.body, statements);
        }

        let header = self.cache_header(ast, create_cache_export);
        ast.prepend_to_block(self.body, vec![header]);

        codegen_log!(Green "Transformed ", self.name, " with ", #self.slot_count(), " slots");
        Ok(())
    }

    /// `const [$unforgetCache, $unforgetCommit, $unforgetNull] = useCreateCache$unforget(/* slots */ N);`
    fn cache_header(&self, ast: &mut Ast, create_cache_export: &str) -> StmtId {
        let mut comment = String::from("\n");
        for slot in 0..self.slot_count() {
            comment.push_str(&format!("{slot} => {}\n", self.slot_name(slot)));
        }

        let size = Expr::Annotated {
            comment,
            expression: Box::new(Expr::number(self.slot_count())),
        };

        let target = Pattern::Array(vec![
            Some(Pattern::Identifier(self.cache_name.clone())),
            Some(Pattern::Identifier(self.commit_name.clone())),
            Some(Pattern::Identifier(self.null_name.clone())),
        ]);

        let location = ast.location(self.body);
        ast.variable_declaration(
            DeclKind::Const,
            target,
            Some(Expr::call(Expr::identifier(create_cache_export), vec![size])),
            location,
        )
    }

    /// Segments declared by the members of gated groups in emitted blocks.
    fn gated_segments(&self) -> FxHashSet<SegmentId> {
        self.plans
            .values()
            .flat_map(|plan| plan.groups.iter().filter(|group| group.gated))
            .flat_map(|group| group.members.iter())
            .filter_map(|member| self.statement_segment(*member))
            .collect()
    }

    /// `$unforgetCache[slot]`
    pub(crate) fn slot_expression(&self, slot: usize) -> Expr {
        Expr::computed_member(Expr::identifier(&self.cache_name), Expr::number(slot))
    }
}

struct BodyEmitter<'a> {
    component: &'a Component,
    gated: FxHashSet<SegmentId>,
}

impl BodyEmitter<'_> {
    fn emit_block(&mut self, ast: &mut Ast, block: StmtId, computed: &mut FxHashSet<SegmentId>) -> Result<(), CompilerError> {
        let component = self.component;
        let Some(plan) = component.plans.get(&block) else {
            return_compiler_error!("Block {:?} of '{}' has no plan", block, component.name);
        };

        let mut output = Vec::with_capacity(plan.statements.len());

        for unit in &plan.units {
            match *unit {
                Unit::Group(index) => {
                    let group = &plan.groups[index];
                    output.extend(self.emit_gated_group(ast, group)?);
                    computed.extend(
                        group
                            .members
                            .iter()
                            .filter_map(|member| component.statement_segment(*member))
                            .filter(|segment| component.segment(*segment).is_tracked()),
                    );
                }

                Unit::Statement(statement) => {
                    let location = ast.location(statement);
                    match ast.kind(statement) {
                        StmtKind::Return(_) => {
                            output.extend(self.commit_protocol(ast, computed, location));
                            output.push(statement);
                        }

                        StmtKind::If { .. } | StmtKind::Try { .. } | StmtKind::Block(_) => {
                            for (child, scope_names) in planned_children(ast, statement) {
                                let mut inner = computed.clone();
                                let mut shadowed = block_declared_names(ast, child);
                                shadowed.extend(scope_names);
                                self.forget_names(&mut inner, &shadowed);
                                self.emit_block(ast, child, &mut inner)?;
                            }
                            output.push(statement);
                        }

                        kind if is_opaque_statement(kind) || contains_return(ast, statement) => {
                            self.instrument_returns(ast, statement, computed);
                            output.push(statement);
                        }

                        _ => {
                            output.push(statement);
                            if let Some(segment) = component.statement_segment(statement)
                                && component.segment(segment).is_tracked()
                            {
                                computed.insert(segment);
                            }
                        }
                    }
                }
            }
        }

        ast.set_block_statements(block, output);
        Ok(())
    }

    /// ```js
    /// let a = $c[0].v;
    /// const _segment = () => { a = ...; <mutators> };
    /// if ($c[0].n || <dependency gates>) { _segment(); $c[0].e(a); }
    /// ```
    fn emit_gated_group(&mut self, ast: &mut Ast, group: &RecomputeGroup) -> Result<Vec<StmtId>, CompilerError> {
        let component = self.component;
        let Some(&last) = group.members.last() else {
            return Ok(Vec::new());
        };
        let location = ast.location(last);

        let mut output = Vec::new();
        let mut tracked: Vec<(usize, String)> = Vec::new();

        for &member in &group.members {
            let segment = component
                .statement_segment(member)
                .map(|segment| component.segment(segment));

            if let Some(segment) = segment
                && let (Some(slot), Some(name)) = (segment.slot, &segment.tracked_name)
            {
                tracked.push((slot, name.clone()));
                output.push(ast.variable_declaration(
                    DeclKind::Let,
                    Pattern::Identifier(name.clone()),
                    Some(Expr::member(component.slot_expression(slot), SLOT_VALUE)),
                    location,
                ));
            }

            turn_declaration_into_assignment(ast, member);
        }

        if tracked.is_empty() {
            return_compiler_error!(
                "Gated group ending at '{}' in '{}' tracks no variable",
                print_statement(ast, last),
                component.name
            );
        }

        let callable_name = ast.generate_unique_name(SEGMENT_CALLABLE);
        let callable_body = ast.add_statement(StmtKind::Block(group.members.clone()), location);
        let callable = ast.add_function(Function {
            name: None,
            params: Vec::new(),
            body: FunctionBody::Block(callable_body),
            is_arrow: true,
            is_async: false,
            is_generator: false,
        });
        output.push(ast.variable_declaration(
            DeclKind::Const,
            Pattern::Identifier(callable_name.clone()),
            Some(Expr::Function(callable)),
            location,
        ));

        let mut then_statements = vec![ast.expression_statement(
            Expr::call(Expr::identifier(&callable_name), Vec::new()),
            location,
        )];
        for (slot, name) in &tracked {
            then_statements.push(self.enqueue(ast, *slot, Expr::identifier(name), location));
        }
        let consequent = ast.add_statement(StmtKind::Block(then_statements), location);

        let test = self.gate(ast, group, &tracked);
        output.push(ast.add_statement(
            StmtKind::If {
                test,
                consequent,
                alternate: None,
            },
            location,
        ));

        codegen_log!("Gated ", #group.members.len(), " statements behind ", callable_name);
        Ok(output)
    }

    /// `$c[own].n || $c[dep].n || dep?.a !== $c[dep].v?.a || ...`
    fn gate(&self, ast: &Ast, group: &RecomputeGroup, tracked: &[(usize, String)]) -> Expr {
        let component = self.component;
        let mut terms: Vec<Expr> = tracked
            .iter()
            .map(|(slot, _)| Expr::member(component.slot_expression(*slot), SLOT_IS_UNSET))
            .collect();

        let dependencies = component.external_dependencies(ast, &group.members);
        let mut targets: Vec<SegmentId> = Vec::new();
        for (target, _) in &dependencies {
            if !targets.contains(target) {
                targets.push(*target);
            }
        }

        for target in targets {
            let Some(slot) = component.segment(target).slot else {
                continue;
            };

            let chains: Vec<&AccessChain> = dependencies
                .iter()
                .filter(|(dependency, _)| *dependency == target)
                .map(|(_, chain)| chain)
                .collect();
            let representatives = shortest_representatives(&chains);

            // An invalidated slot holds the null sentinel, whose fields read as undefined
            if representatives.iter().all(|chain| !chain.is_root_only()) {
                terms.push(Expr::member(component.slot_expression(slot), SLOT_IS_UNSET));
            }

            for chain in representatives {
                let live = chain.read_against(Expr::identifier(chain.root()));
                let cached = chain.read_against(Expr::member(component.slot_expression(slot), SLOT_VALUE));
                terms.push(Expr::binary(BinaryOperator::StrictNotEqual, live, cached));
            }
        }

        terms
            .into_iter()
            .reduce(|left, right| Expr::logical(LogicalOperator::Or, left, right))
            .unwrap_or(Expr::Bool(true))
    }

    /// Stages every tracked variable for the return at hand and commits.
    /// Ungated variables computed on this path are enqueued, gated ones already were,
    /// everything else is invalidated.
    fn commit_protocol(&self, ast: &mut Ast, computed: &FxHashSet<SegmentId>, location: TextLocation) -> Vec<StmtId> {
        let component = self.component;
        let mut statements = Vec::with_capacity(component.slot_count() + 1);

        for (slot, &segment) in component.slots.iter().enumerate() {
            let value = if computed.contains(&segment) {
                if self.gated.contains(&segment) {
                    continue;
                }
                Expr::identifier(component.slot_name(slot))
            } else {
                Expr::identifier(&component.null_name)
            };
            statements.push(self.enqueue(ast, slot, value, location));
        }

        statements.push(ast.expression_statement(
            Expr::call(Expr::identifier(&component.commit_name), Vec::new()),
            location,
        ));

        statements
    }

    fn enqueue(&self, ast: &mut Ast, slot: usize, value: Expr, location: TextLocation) -> StmtId {
        let callee = Expr::member(self.component.slot_expression(slot), SLOT_ENQUEUE);
        ast.expression_statement(Expr::call(callee, vec![value]), location)
    }

    /// Puts the commit protocol in front of each return inside a statement that is
    /// emitted as one unit. Names declared anywhere inside it may shadow tracked ones,
    /// so those are invalidated instead of enqueued.
    fn instrument_returns(&self, ast: &mut Ast, statement: StmtId, computed: &FxHashSet<SegmentId>) {
        let mut inner = computed.clone();
        self.forget_names(&mut inner, &subtree_declared_names(ast, statement));

        for (target, parent) in returns_with_parents(ast, statement) {
            let location = ast.location(target);
            let protocol = self.commit_protocol(ast, &inner, location);

            if matches!(ast.kind(parent), StmtKind::Block(_)) {
                ast.insert_before(parent, target, protocol);
            } else if matches!(ast.kind(parent), StmtKind::Switch { .. }) {
                if let StmtKind::Switch { cases, .. } = &mut ast.statement_mut(parent).kind
                    && let Some((case, position)) = cases.iter_mut().find_map(|case| {
                        let position = case.consequent.iter().position(|id| *id == target)?;
                        Some((case, position))
                    })
                {
                    case.consequent.splice(position..position, protocol);
                }
            } else {
                let original = ast.wrap_in_block(target);
                let mut statements = protocol;
                statements.push(original);
                ast.set_block_statements(target, statements);
            }
        }
    }

    fn forget_names(&self, computed: &mut FxHashSet<SegmentId>, names: &[String]) {
        let component = self.component;
        computed.retain(|segment| {
            component
                .segment(*segment)
                .tracked_name
                .as_ref()
                .is_none_or(|name| !names.contains(name))
        });
    }
}

/// `const x = init` becomes `x = init` and `function f() {}` becomes `f = function f() {}`,
/// keeping the statement id.
fn turn_declaration_into_assignment(ast: &mut Ast, member: StmtId) {
    let assignment = match ast.kind(member) {
        StmtKind::VarDecl(declaration) => match declaration.declarators.as_slice() {
            [declarator] => Some(Expr::assign(
                declarator.target.clone(),
                declarator.init.clone().unwrap_or_else(Expr::undefined),
            )),
            _ => None,
        },
        StmtKind::FunctionDecl(function) => ast
            .function(*function)
            .name
            .clone()
            .map(|name| Expr::assign(Pattern::Identifier(name), Expr::Function(*function))),
        _ => None,
    };

    if let Some(assignment) = assignment {
        ast.replace_statement(member, StmtKind::Expression(assignment));
    }
}

/// Keeps the shortest chains: a chain is dropped when another kept chain is a prefix of it.
fn shortest_representatives<'c>(chains: &[&'c AccessChain]) -> Vec<&'c AccessChain> {
    let mut sorted = chains.to_vec();
    sorted.sort_by_key(|chain| chain.links().len());

    let mut kept: Vec<&AccessChain> = Vec::new();
    for chain in sorted {
        if !kept.iter().any(|shorter| shorter.is_prefix_of(chain)) {
            kept.push(chain);
        }
    }
    kept
}

/// Planned child blocks of a statement, each with the names its own scope adds
/// (the catch parameter for a handler body).
fn planned_children(ast: &Ast, statement: StmtId) -> Vec<(StmtId, Vec<String>)> {
    match ast.kind(statement) {
        StmtKind::Block(_) => vec![(statement, Vec::new())],
        StmtKind::Try { block, handler, finalizer } => {
            let mut children = vec![(*block, Vec::new())];
            if let Some(handler) = handler {
                let mut names = Vec::new();
                if let Some(param) = &handler.param {
                    pattern_binding_names(param, &mut names);
                }
                children.push((handler.body, names));
            }
            children.extend(finalizer.iter().map(|finalizer| (*finalizer, Vec::new())));
            children
        }
        _ => ast
            .child_statements(statement)
            .into_iter()
            .filter(|child| matches!(ast.kind(*child), StmtKind::Block(_)))
            .map(|child| (child, Vec::new()))
            .collect(),
    }
}

fn block_declared_names(ast: &Ast, block: StmtId) -> Vec<String> {
    ast.block_statements(block)
        .iter()
        .flat_map(|statement| ast.declared_names(*statement))
        .collect()
}

fn subtree_declared_names(ast: &Ast, statement: StmtId) -> Vec<String> {
    let mut names = Vec::new();
    let mut stack = vec![statement];
    while let Some(current) = stack.pop() {
        names.extend(ast.declared_names(current));
        names.extend(ast.for_head_names(current));
        if let StmtKind::Try {
            handler: Some(handler),
            ..
        } = ast.kind(current)
            && let Some(param) = &handler.param
        {
            pattern_binding_names(param, &mut names);
        }
        stack.extend(ast.child_statements(current));
    }
    names
}

fn returns_with_parents(ast: &Ast, statement: StmtId) -> Vec<(StmtId, StmtId)> {
    let mut found = Vec::new();
    let mut stack = vec![statement];
    while let Some(current) = stack.pop() {
        for child in ast.child_statements(current) {
            if matches!(ast.kind(child), StmtKind::Return(_)) {
                found.push((child, current));
            } else {
                stack.push(child);
            }
        }
    }
    found
}

#[cfg(test)]
#[path = "tests/transform_tests.rs"]
mod tests;
