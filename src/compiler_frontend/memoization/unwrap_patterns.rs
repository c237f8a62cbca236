//! Pattern unwrapping.
//!
//! A declaration that binds several names is exploded into one declaration per name,
//! so each binding can own its own cache slot and its own access chain:
//!
//! ```js
//! const { a, b: [c], ...rest } = compute();
//! // becomes
//! const _unwrapped = compute();
//! const a = _unwrapped.a;
//! const c = _unwrapped.b[0];
//! const { a: _unused, b: _unused2, ...rest } = _unwrapped;
//! ```
//!
//! Initialisers and defaults are evaluated exactly once. A shared temporary is only
//! introduced when the source would otherwise be evaluated more than once.

use crate::compiler_frontend::analysis::references::expression_reads;
use crate::compiler_frontend::ast::ast::{Ast, pattern_binding_names};
use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, DeclKind, Declarator, Expr, ForInit, MemberProp, ObjectPatternProp, Pattern,
    PropKey, StmtId, StmtKind,
};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::segment::SegmentId;
use crate::compiler_frontend::tokenizer::tokenizer::is_valid_identifier;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::projects::settings::{UNUSED_BINDING, UNWRAPPED_TEMP};
use crate::segment_log;

impl Component {
    /// Splits the segment's declaration into one segment per binding.
    /// Returns the segment itself when there is nothing to split, without touching the tree.
    pub(crate) fn unwrap_segment(&mut self, ast: &mut Ast, id: SegmentId) -> Result<Vec<SegmentId>, CompilerError> {
        let segment = self.segment(id);
        let Some(statement) = segment.statement() else {
            return Ok(vec![id]);
        };

        if segment.flags.unwrapped {
            return Ok(vec![id]);
        }

        let StmtKind::VarDecl(declaration) = ast.kind(statement) else {
            return Ok(vec![id]);
        };

        if is_atomic(&declaration.declarators) {
            return Ok(vec![id]);
        }

        let Some(block) = self
            .index
            .parent(statement)
            .filter(|parent| matches!(ast.kind(*parent), StmtKind::Block(_)))
        else {
            return Err(CompilerError::component_variable_not_ensured(
                &self.code_of(ast, id),
                ast.location(statement),
            ));
        };

        let kind = declaration.kind;
        let declarators = declaration.declarators.clone();
        let location = ast.location(statement);

        let mut unwrapper = PatternUnwrapper {
            ast: &mut *ast,
            kind,
            location,
            statements: Vec::new(),
        };
        for declarator in declarators {
            unwrapper.declarator(declarator);
        }
        let replacements = unwrapper.statements;

        ast.take_statement(statement);
        ast.splice_block(block, statement, replacements.clone());

        let parent = self.segment(id).parent.unwrap_or(self.root);
        self.destroy_segment(id);

        let unwrapped: Vec<SegmentId> = replacements
            .iter()
            .map(|replacement| self.adopt_statement(ast, *replacement, parent))
            .collect();

        segment_log!(Yellow "Unwrapped segment ", #id.0, " into ", #unwrapped.len(), " segments");

        self.refresh_index(ast)?;
        Ok(unwrapped)
    }
}

/// One declarator binding one plain identifier.
pub fn is_atomic(declarators: &[Declarator]) -> bool {
    matches!(declarators, [Declarator { target: Pattern::Identifier(_), .. }])
}

struct PatternUnwrapper<'a> {
    ast: &'a mut Ast,
    kind: DeclKind,
    location: TextLocation,
    statements: Vec<StmtId>,
}

impl PatternUnwrapper<'_> {
    fn declarator(&mut self, declarator: Declarator) {
        let Declarator { target, init } = declarator;
        let bindings = binding_count(&target);

        match target {
            Pattern::Identifier(_) => self.declare(target, init),

            _ if bindings == 0 => {
                if let Some(init) = init {
                    let statement = self.ast.expression_statement(init, self.location);
                    self.statements.push(statement);
                }
            }

            target => {
                let init = init.unwrap_or_else(Expr::undefined);
                let source = if matches!(init, Expr::Identifier(_)) || (bindings == 1 && !has_default(&target)) {
                    init
                } else {
                    self.temporary(init)
                };
                self.bind(target, source);
            }
        }
    }

    fn declare(&mut self, target: Pattern, init: Option<Expr>) {
        let statement = self
            .ast
            .variable_declaration(self.kind, target, init, self.location);
        self.statements.push(statement);
    }

    fn temporary(&mut self, value: Expr) -> Expr {
        let name = self.ast.generate_unique_name(UNWRAPPED_TEMP);
        let statement = self.ast.variable_declaration(
            DeclKind::Const,
            Pattern::Identifier(name.clone()),
            Some(value),
            self.location,
        );
        self.statements.push(statement);
        Expr::Identifier(name)
    }

    fn bind(&mut self, pattern: Pattern, source: Expr) {
        match pattern {
            Pattern::Identifier(_) => self.declare(pattern, Some(source)),

            Pattern::Default { target, value } => {
                let guarded = with_default(source, *value);
                self.bind_nested(*target, guarded);
            }

            Pattern::Object(props) => {
                let mut taken_keys = Vec::new();
                for prop in props {
                    match prop {
                        ObjectPatternProp::KeyValue { key, value, .. } => {
                            let read = read_key(&source, &key);
                            taken_keys.push(key);
                            self.bind_nested(value, read);
                        }
                        ObjectPatternProp::Rest(rest) => {
                            // The rest binding still needs the runtime to collect the remaining keys
                            let mut remaining = Vec::with_capacity(taken_keys.len() + 1);
                            for key in &taken_keys {
                                remaining.push(ObjectPatternProp::KeyValue {
                                    key: key.clone(),
                                    value: Pattern::Identifier(self.ast.generate_unique_name(UNUSED_BINDING)),
                                    shorthand: false,
                                });
                            }
                            remaining.push(ObjectPatternProp::Rest(rest));
                            self.declare(Pattern::Object(remaining), Some(source.clone()));
                        }
                    }
                }
            }

            Pattern::Array(elements) => {
                for (position, element) in elements.into_iter().enumerate() {
                    match element {
                        Some(Pattern::Rest(rest)) => {
                            let mut holes: Vec<Option<Pattern>> = vec![None; position];
                            holes.push(Some(Pattern::Rest(rest)));
                            self.declare(Pattern::Array(holes), Some(source.clone()));
                        }
                        Some(element) => {
                            let read = Expr::computed_member(source.clone(), Expr::number(position));
                            self.bind_nested(element, read);
                        }
                        None => {}
                    }
                }
            }

            Pattern::Rest(inner) => self.bind(*inner, source),

            // Member targets only appear in assignments
            Pattern::Expression(_) => {}
        }
    }

    /// Binds a sub-pattern, giving it its own temporary when it would read `read` more than once.
    fn bind_nested(&mut self, pattern: Pattern, read: Expr) {
        let bindings = binding_count(&pattern);
        if bindings == 0 {
            return;
        }

        if matches!(pattern, Pattern::Identifier(_)) || (bindings == 1 && !has_default(&pattern)) {
            self.bind(pattern, read);
        } else {
            let temporary = self.temporary(read);
            self.bind(pattern, temporary);
        }
    }
}

fn binding_count(pattern: &Pattern) -> usize {
    let mut names = Vec::new();
    pattern_binding_names(pattern, &mut names);
    names.len()
}

fn has_default(pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Default { .. } => true,
        Pattern::Array(elements) => elements.iter().flatten().any(has_default),
        Pattern::Object(props) => props.iter().any(|prop| match prop {
            ObjectPatternProp::KeyValue { value, .. } => has_default(value),
            ObjectPatternProp::Rest(rest) => has_default(rest),
        }),
        Pattern::Rest(inner) => has_default(inner),
        Pattern::Identifier(_) | Pattern::Expression(_) => false,
    }
}

/// `source === undefined ? value : source`
fn with_default(source: Expr, value: Expr) -> Expr {
    Expr::Conditional {
        test: Box::new(Expr::binary(
            BinaryOperator::StrictEqual,
            source.clone(),
            Expr::undefined(),
        )),
        consequent: Box::new(value),
        alternate: Box::new(source),
    }
}

fn read_key(source: &Expr, key: &PropKey) -> Expr {
    let property = match key {
        PropKey::Identifier(name) => MemberProp::Identifier(name.clone()),
        PropKey::String(name) if is_valid_identifier(name) => MemberProp::Identifier(name.clone()),
        PropKey::String(name) => MemberProp::Computed(Box::new(Expr::String(name.clone()))),
        PropKey::Number(raw) => MemberProp::Computed(Box::new(Expr::Number(raw.clone()))),
        PropKey::Computed(expression) => MemberProp::Computed(expression.clone()),
    };

    Expr::Member {
        object: Box::new(source.clone()),
        property,
        optional: false,
    }
}

/// Moves the initial values of `for (let i = init; ...)` into `let _unwrapped = init;`
/// statements right before the loop. The loop bindings stay loop scoped.
/// Initialisers reading another binding of the same head stay where they are.
pub fn lift_for_initializers(ast: &mut Ast, block: StmtId) -> Vec<StmtId> {
    let mut lifted_statements = Vec::new();

    for statement in ast.block_statements(block).to_vec() {
        let StmtKind::For {
            init: Some(ForInit::VarDecl(declaration)),
            ..
        } = ast.kind(statement)
        else {
            continue;
        };

        let mut declaration = declaration.clone();
        let head_names = ast.for_head_names(statement);
        let location = ast.location(statement);
        let mut lifted = Vec::new();

        for declarator in &mut declaration.declarators {
            let Some(init) = &declarator.init else {
                continue;
            };

            let reads_head = expression_reads(ast, init, statement)
                .iter()
                .any(|name| head_names.contains(name));
            if reads_head {
                continue;
            }

            let temp = ast.generate_unique_name(UNWRAPPED_TEMP);
            let init = declarator.init.replace(Expr::identifier(&temp));
            lifted.push(ast.variable_declaration(
                DeclKind::Let,
                Pattern::Identifier(temp),
                init,
                location,
            ));
        }

        if lifted.is_empty() {
            continue;
        }

        if let StmtKind::For { init, .. } = &mut ast.statement_mut(statement).kind {
            *init = Some(ForInit::VarDecl(declaration));
        }

        ast.insert_before(block, statement, lifted.clone());
        lifted_statements.extend(lifted);
    }

    lifted_statements
}

#[cfg(test)]
#[path = "tests/unwrap_patterns_tests.rs"]
mod tests;
