//! Memoization of components and hooks.
//!
//! A component goes through three passes. Analysis splits the body into segments and
//! records which tracked variable each segment reads. Planning merges segments into
//! recomputation groups and orders every block. The transformation then rewrites the
//! body so each gated group only runs when one of its dependencies changed.

pub mod access_chain;
pub mod component;
pub mod dependency_analysis;
pub mod driver;
pub mod find_components;
pub mod graph_display;
pub mod jsx_hoisting;
pub mod recompute_groups;
pub mod segment;
pub mod topology;
pub mod transform;
pub mod unwrap_patterns;

#[cfg(test)]
#[path = "tests/test_support.rs"]
pub(crate) mod test_support;
