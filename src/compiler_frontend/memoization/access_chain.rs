//! A static description of which nested field of a value a read site uses.
//!
//! `props.user["name"]` becomes the root `props` followed by the links `user` and `name`.
//! Chains are compared by their printed form, so two reads of the same path from
//! different places in the source are equal.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::ast_nodes::{Expr, MemberProp};
use crate::compiler_frontend::codegen::js::{print_expression, quote_js_string};
use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokenizer::is_valid_identifier;
use std::fmt;

#[derive(Debug, Clone)]
pub struct AccessChain {
    root: String,

    // False when the chain was built from something other than an identifier,
    // in which case `root` holds the printed expression
    root_is_identifier: bool,

    links: Vec<AccessLink>,
}

#[derive(Debug, Clone)]
pub struct AccessLink {
    pub key: LinkKey,

    // Read with `?.` in the source
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKey {
    // `.name` or `["name"]`
    Name(String),
    // `[0]`
    Index(String),
    // `[expression]`, holds the printed key expression
    Dynamic(String),
}

impl AccessChain {
    pub fn from_identifier(name: impl Into<String>) -> Self {
        AccessChain {
            root: name.into(),
            root_is_identifier: true,
            links: Vec::new(),
        }
    }

    /// Builds the chain for an identifier or member expression.
    /// Anything else collapses into a root holding its printed text.
    pub fn from_expression(ast: &Ast, expression: &Expr) -> Self {
        match expression {
            Expr::Identifier(name) => AccessChain::from_identifier(name.clone()),

            Expr::Member {
                object,
                property,
                optional,
            } => {
                let mut chain = AccessChain::from_expression(ast, object);
                let key = match property {
                    MemberProp::Identifier(name) => LinkKey::Name(name.clone()),
                    MemberProp::Computed(key) => match key.as_ref() {
                        Expr::String(name) => LinkKey::Name(name.clone()),
                        Expr::Number(raw) => LinkKey::Index(raw.clone()),
                        other => LinkKey::Dynamic(print_expression(ast, other)),
                    },
                };
                chain.links.push(AccessLink {
                    key,
                    optional: *optional,
                });
                chain
            }

            other => AccessChain {
                root: print_expression(ast, other),
                root_is_identifier: false,
                links: Vec::new(),
            },
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn links(&self) -> &[AccessLink] {
        &self.links
    }

    pub fn is_root_only(&self) -> bool {
        self.links.is_empty()
    }

    pub fn leftmost_id(&self) -> Result<&str, CompilerError> {
        if self.root_is_identifier {
            Ok(&self.root)
        } else {
            Err(CompilerError::leftmost_id_not_found(&self.stringify()))
        }
    }

    /// The name of the outermost hop, or the root for a plain identifier.
    pub fn rightmost_id(&self) -> Result<&str, CompilerError> {
        match self.links.last() {
            Some(AccessLink {
                key: LinkKey::Name(name) | LinkKey::Index(name),
                ..
            }) => Ok(name),
            Some(AccessLink {
                key: LinkKey::Dynamic(_),
                ..
            }) => Err(CompilerError::rightmost_id_not_found(&self.stringify())),
            None => self.leftmost_id(),
        }
    }

    /// Drops the outermost hop. Used for method calls, where `a.b.push()` reads `a.b`.
    pub fn without_last_link(mut self) -> Self {
        self.links.pop();
        self
    }

    /// The part of the chain that can be compared against a cached value:
    /// everything before the first dynamic key or the first hop that was
    /// already optional in the source.
    pub fn trackable_prefix(&self) -> AccessChain {
        let end = self
            .links
            .iter()
            .position(|link| link.optional || matches!(link.key, LinkKey::Dynamic(_)))
            .unwrap_or(self.links.len());

        AccessChain {
            root: self.root.clone(),
            root_is_identifier: self.root_is_identifier,
            links: self.links[..end].to_vec(),
        }
    }

    /// Whether every link of `self` starts `other`, with the same root.
    pub fn is_prefix_of(&self, other: &AccessChain) -> bool {
        self.root == other.root
            && self.links.len() <= other.links.len()
            && self
                .links
                .iter()
                .zip(&other.links)
                .all(|(left, right)| left.key == right.key)
    }

    pub fn stringify(&self) -> String {
        let mut text = self.root.clone();
        for link in &self.links {
            text.push_str(&link.key.to_string());
        }
        text
    }

    /// The same read performed against `base`, with every hop optional.
    /// Stops at the first dynamic key, which has to keep reading through the live value.
    pub fn read_against(&self, base: Expr) -> Expr {
        let mut expression = base;
        for link in &self.links {
            let property = match &link.key {
                LinkKey::Name(name) if is_valid_identifier(name) => {
                    MemberProp::Identifier(name.clone())
                }
                LinkKey::Name(name) => MemberProp::Computed(Box::new(Expr::String(name.clone()))),
                LinkKey::Index(raw) => MemberProp::Computed(Box::new(Expr::Number(raw.clone()))),
                LinkKey::Dynamic(_) => break,
            };

            expression = Expr::Member {
                object: Box::new(expression),
                property,
                optional: true,
            };
        }
        expression
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKey::Name(name) if is_valid_identifier(name) => write!(f, ".{name}"),
            LinkKey::Name(name) => write!(f, "[{}]", quote_js_string(name)),
            LinkKey::Index(raw) => write!(f, "[{raw}]"),
            LinkKey::Dynamic(text) => write!(f, "[{text}]"),
        }
    }
}

impl fmt::Display for AccessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

impl PartialEq for AccessChain {
    fn eq(&self, other: &Self) -> bool {
        self.stringify() == other.stringify()
    }
}

impl Eq for AccessChain {}

#[cfg(test)]
#[path = "tests/access_chain_tests.rs"]
mod tests;
