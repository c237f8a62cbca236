//! Scope analysis over one function: the statement tree index, name resolution,
//! free variables with their access chains, mutations, aliases and hook calls.

pub mod hook_calls;
pub mod mutations;
pub mod references;
pub mod scope;

#[cfg(test)]
#[path = "tests/test_support.rs"]
pub(crate) mod test_support;
