use crate::compiler_frontend::ast::ast_nodes::{
    DeclKind, Declarator, ExportDecl, Expr, ForHead, ForInit, Function, FunctionBody, FunctionId,
    ObjectPatternProp, Pattern, Stmt, StmtId, StmtKind, VarDecl,
};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use rustc_hash::FxHashSet;

/// One parsed source file.
///
/// Statements and functions live in arenas and are referred to by id,
/// so the memoization passes can key their own tables on stable positions
/// while freely splicing and replacing statements.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub statements: Vec<Stmt>,
    pub functions: Vec<Function>,

    // Top level statements in source order
    pub body: Vec<StmtId>,

    // Top level statements that must be printed rather than copied from the source
    pub changed: FxHashSet<StmtId>,

    // Every identifier that appears in the file, so generated names never collide
    names: FxHashSet<String>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn add_statement(&mut self, kind: StmtKind, location: TextLocation) -> StmtId {
        let id = StmtId(self.statements.len() as u32);
        self.statements.push(Stmt { kind, location });
        id
    }

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn statement(&self, id: StmtId) -> &Stmt {
        &self.statements[id.0 as usize]
    }

    pub fn statement_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.statements[id.0 as usize]
    }

    pub fn kind(&self, id: StmtId) -> &StmtKind {
        &self.statements[id.0 as usize].kind
    }

    pub fn location(&self, id: StmtId) -> TextLocation {
        self.statements[id.0 as usize].location
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0 as usize]
    }

    pub fn replace_statement(&mut self, id: StmtId, kind: StmtKind) {
        self.statements[id.0 as usize].kind = kind;
    }

    pub fn take_statement(&mut self, id: StmtId) -> StmtKind {
        std::mem::replace(&mut self.statements[id.0 as usize].kind, StmtKind::Removed)
    }

    pub fn block_statements(&self, id: StmtId) -> &[StmtId] {
        match self.kind(id) {
            StmtKind::Block(statements) => statements,
            _ => &[],
        }
    }

    pub fn set_block_statements(&mut self, id: StmtId, statements: Vec<StmtId>) {
        self.statements[id.0 as usize].kind = StmtKind::Block(statements);
    }

    /// Replaces `target` inside `block` with `replacements`, keeping the order.
    pub fn splice_block(&mut self, block: StmtId, target: StmtId, replacements: Vec<StmtId>) -> bool {
        let StmtKind::Block(statements) = &mut self.statements[block.0 as usize].kind else {
            return false;
        };

        let Some(index) = statements.iter().position(|id| *id == target) else {
            return false;
        };

        statements.splice(index..=index, replacements);
        true
    }

    pub fn insert_before(&mut self, block: StmtId, anchor: StmtId, new_statements: Vec<StmtId>) -> bool {
        let StmtKind::Block(statements) = &mut self.statements[block.0 as usize].kind else {
            return false;
        };

        let Some(index) = statements.iter().position(|id| *id == anchor) else {
            return false;
        };

        statements.splice(index..index, new_statements);
        true
    }

    pub fn prepend_to_block(&mut self, block: StmtId, new_statements: Vec<StmtId>) {
        if let StmtKind::Block(statements) = &mut self.statements[block.0 as usize].kind {
            statements.splice(0..0, new_statements);
        }
    }

    /// Turns the statement into a block holding the original statement.
    /// The id keeps its place in its parent, so nothing that points at it needs updating.
    pub fn wrap_in_block(&mut self, id: StmtId) -> StmtId {
        let location = self.location(id);
        let original = self.take_statement(id);
        let inner = self.add_statement(original, location);
        self.replace_statement(id, StmtKind::Block(vec![inner]));
        inner
    }

    pub fn expression_statement(&mut self, expression: Expr, location: TextLocation) -> StmtId {
        self.add_statement(StmtKind::Expression(expression), location)
    }

    pub fn variable_declaration(
        &mut self,
        kind: DeclKind,
        target: Pattern,
        init: Option<Expr>,
        location: TextLocation,
    ) -> StmtId {
        self.add_statement(
            StmtKind::VarDecl(VarDecl {
                kind,
                declarators: vec![Declarator { target, init }],
            }),
            location,
        )
    }

    pub fn register_name(&mut self, name: &str) {
        if !self.names.contains(name) {
            self.names.insert(name.to_owned());
        }
    }

    pub fn is_name_used(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// `base`, then `base2`, `base3`... whichever is free first.
    pub fn generate_unique_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_owned();
        let mut counter = 2;

        while self.names.contains(&candidate) {
            candidate = format!("{base}{counter}");
            counter += 1;
        }

        self.names.insert(candidate.clone());
        candidate
    }

    /// The statement body of a function, if it has one.
    pub fn function_block(&self, id: FunctionId) -> Option<StmtId> {
        match self.function(id).body {
            FunctionBody::Block(block) => Some(block),
            FunctionBody::Expression(_) => None,
        }
    }

    /// `(a) => expr` becomes `(a) => { return expr; }`
    pub fn expand_arrow_body(&mut self, id: FunctionId) -> StmtId {
        let body = std::mem::replace(
            &mut self.function_mut(id).body,
            FunctionBody::Block(StmtId(0)),
        );

        let block = match body {
            FunctionBody::Block(block) => block,
            FunctionBody::Expression(expression) => {
                let location = TextLocation::default();
                let return_statement = self.add_statement(StmtKind::Return(Some(*expression)), location);
                self.add_statement(StmtKind::Block(vec![return_statement]), location)
            }
        };

        self.function_mut(id).body = FunctionBody::Block(block);
        block
    }

    /// Direct child statements that share the enclosing function scope.
    pub fn child_statements(&self, id: StmtId) -> Vec<StmtId> {
        match self.kind(id) {
            StmtKind::Block(statements) => statements.clone(),
            StmtKind::If {
                consequent,
                alternate,
                ..
            } => {
                let mut children = vec![*consequent];
                children.extend(alternate.iter().copied());
                children
            }
            StmtKind::For { body, .. }
            | StmtKind::ForIn { body, .. }
            | StmtKind::ForOf { body, .. }
            | StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::Labeled { body, .. } => vec![*body],
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                let mut children = vec![*block];
                children.extend(handler.iter().map(|handler| handler.body));
                children.extend(finalizer.iter().copied());
                children
            }
            StmtKind::Switch { cases, .. } => cases
                .iter()
                .flat_map(|case| case.consequent.iter().copied())
                .collect(),
            StmtKind::Export(ExportDecl::Declaration(inner)) => vec![*inner],
            _ => Vec::new(),
        }
    }

    /// Whether `descendant` sits somewhere below `ancestor`, without crossing into nested functions.
    pub fn contains_statement(&self, ancestor: StmtId, descendant: StmtId) -> bool {
        if ancestor == descendant {
            return true;
        }

        let mut stack = self.child_statements(ancestor);
        while let Some(current) = stack.pop() {
            if current == descendant {
                return true;
            }
            stack.extend(self.child_statements(current));
        }

        false
    }

    /// Names a statement binds in its own scope.
    pub fn declared_names(&self, id: StmtId) -> Vec<String> {
        let mut names = Vec::new();
        match self.kind(id) {
            StmtKind::VarDecl(declaration) => {
                for declarator in &declaration.declarators {
                    pattern_binding_names(&declarator.target, &mut names);
                }
            }
            StmtKind::FunctionDecl(function) => {
                if let Some(name) = &self.function(*function).name {
                    names.push(name.clone());
                }
            }
            _ => {}
        }
        names
    }

    pub fn for_head_names(&self, id: StmtId) -> Vec<String> {
        let mut names = Vec::new();
        match self.kind(id) {
            StmtKind::For {
                init: Some(ForInit::VarDecl(declaration)),
                ..
            } => {
                for declarator in &declaration.declarators {
                    pattern_binding_names(&declarator.target, &mut names);
                }
            }
            StmtKind::ForIn {
                left: ForHead::VarDecl { target, .. },
                ..
            }
            | StmtKind::ForOf {
                left: ForHead::VarDecl { target, .. },
                ..
            } => pattern_binding_names(target, &mut names),
            _ => {}
        }
        names
    }
}

/// Every identifier a pattern binds, in source order.
pub fn pattern_binding_names(pattern: &Pattern, names: &mut Vec<String>) {
    match pattern {
        Pattern::Identifier(name) => names.push(name.clone()),
        Pattern::Array(elements) => {
            for element in elements.iter().flatten() {
                pattern_binding_names(element, names);
            }
        }
        Pattern::Object(props) => {
            for prop in props {
                match prop {
                    ObjectPatternProp::KeyValue { value, .. } => pattern_binding_names(value, names),
                    ObjectPatternProp::Rest(rest) => pattern_binding_names(rest, names),
                }
            }
        }
        Pattern::Default { target, .. } => pattern_binding_names(target, names),
        Pattern::Rest(inner) => pattern_binding_names(inner, names),
        Pattern::Expression(_) => {}
    }
}

pub fn pattern_binds(pattern: &Pattern, name: &str) -> bool {
    let mut names = Vec::new();
    pattern_binding_names(pattern, &mut names);
    names.iter().any(|bound| bound == name)
}
