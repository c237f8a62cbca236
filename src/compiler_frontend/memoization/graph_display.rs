//! Views of a component's segment graph for humans and tools.
//!
//! `mermaid_graph_from_component` draws the segment tree as nested clusters with the
//! dependency edges between them. `component_graph_snapshot` is the same information
//! as plain data, printed as JSON by the `graph` command.

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::memoization::component::Component;
use crate::compiler_frontend::memoization::recompute_groups::PinReason;
use crate::compiler_frontend::memoization::segment::{SegmentFlags, SegmentId, SegmentKind};
use serde::Serialize;
use std::fmt::Write;

const CLASS_DEFINITIONS: [(&str, &str); 4] = [
    ("blockSegment", "fill:#f4f4f4,stroke:#999,stroke-dasharray:4"),
    ("rootChild", "stroke:#333,stroke-width:2px"),
    ("returnNetwork", "fill:#ffe9e0,stroke:#d9480f"),
    ("componentVariable", "fill:#e7f5ff,stroke:#1c7ed6"),
];

pub fn mermaid_graph_from_component(ast: &Ast, component: &Component) -> String {
    let mut out = String::from("graph TD;\n");

    for (name, style) in CLASS_DEFINITIONS {
        let _ = writeln!(out, "classDef {name} {style};");
    }

    write_cluster(&mut out, ast, component, component.root(), 1);

    for segment in component.live_segments() {
        for dependency in &segment.dependencies {
            let _ = writeln!(
                out,
                "node{} -->|\"{}\"| node{}",
                segment.id.0,
                html_escape(&dependency.chain.stringify()),
                dependency.target.0
            );
        }
        for mutator in &segment.mutated_by {
            let _ = writeln!(out, "node{} -.-> node{}", segment.id.0, mutator.0);
        }
    }

    for segment in component.live_segments() {
        for class in node_classes(component, segment.id) {
            let _ = writeln!(out, "class node{} {class}", segment.id.0);
        }
    }

    out
}

fn write_cluster(out: &mut String, ast: &Ast, component: &Component, id: SegmentId, depth: usize) {
    let segment = component.segment(id);
    if segment.children.is_empty() {
        write_node(out, ast, component, id, depth);
        return;
    }

    let indent = "    ".repeat(depth);
    let _ = writeln!(out, "{indent}subgraph SG{} [\" \"]", id.0);
    write_node(out, ast, component, id, depth + 1);
    for &child in &segment.children {
        write_cluster(out, ast, component, child, depth + 1);
    }
    let _ = writeln!(out, "{indent}end");
}

fn write_node(out: &mut String, ast: &Ast, component: &Component, id: SegmentId, depth: usize) {
    let indent = "    ".repeat(depth);
    let code = html_escape(&component.code_of(ast, id));
    let _ = writeln!(out, "{indent}node{}[\"<pre align=\\\"left\\\">{code}</pre>\"]", id.0);
}

fn node_classes(component: &Component, id: SegmentId) -> Vec<&'static str> {
    let segment = component.segment(id);
    let mut classes = Vec::new();

    if matches!(segment.kind, SegmentKind::Root | SegmentKind::Block) {
        classes.push("blockSegment");
    }
    if segment.parent == Some(component.root()) {
        classes.push("rootChild");
    }
    if segment.flags.return_network {
        classes.push("returnNetwork");
    }
    if segment.flags.component_variable {
        classes.push("componentVariable");
    }

    classes
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[derive(Debug, Serialize)]
pub struct ComponentGraphSnapshot {
    pub name: String,
    pub slots: Vec<SlotSnapshot>,
    pub segments: Vec<SegmentSnapshot>,
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct SlotSnapshot {
    pub slot: usize,
    pub name: String,
    pub segment: SegmentId,
}

#[derive(Debug, Serialize)]
pub struct SegmentSnapshot {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub parent: Option<SegmentId>,
    pub code: String,
    pub slot: Option<usize>,
    pub flags: SegmentFlags,
    pub dependencies: Vec<EdgeSnapshot>,
    pub mutated_by: Vec<SegmentId>,
}

#[derive(Debug, Serialize)]
pub struct EdgeSnapshot {
    pub target: SegmentId,
    pub chain: String,
}

#[derive(Debug, Serialize)]
pub struct GroupSnapshot {
    pub members: Vec<SegmentId>,
    pub gated: bool,
    pub pinned_by: Option<PinReason>,
}

pub fn component_graph_snapshot(ast: &Ast, component: &Component) -> ComponentGraphSnapshot {
    let slots = component
        .slots()
        .iter()
        .enumerate()
        .map(|(slot, segment)| SlotSnapshot {
            slot,
            name: component.slot_name(slot).to_owned(),
            segment: *segment,
        })
        .collect();

    let segments = component
        .live_segments()
        .map(|segment| SegmentSnapshot {
            id: segment.id,
            kind: segment.kind,
            parent: segment.parent,
            code: component.code_of(ast, segment.id),
            slot: segment.slot,
            flags: segment.flags,
            dependencies: segment
                .dependencies
                .iter()
                .map(|dependency| EdgeSnapshot {
                    target: dependency.target,
                    chain: dependency.chain.stringify(),
                })
                .collect(),
            mutated_by: segment.mutated_by.clone(),
        })
        .collect();

    let mut blocks: Vec<_> = component.plans.keys().copied().collect();
    blocks.sort();

    let groups = blocks
        .iter()
        .filter_map(|block| component.plans.get(block))
        .flat_map(|plan| plan.groups.iter())
        .map(|group| GroupSnapshot {
            members: group
                .members
                .iter()
                .filter_map(|member| component.statement_segment(*member))
                .collect(),
            gated: group.gated,
            pinned_by: group.pinned_by,
        })
        .collect();

    ComponentGraphSnapshot {
        name: component.name.clone(),
        slots,
        segments,
        groups,
    }
}

#[cfg(test)]
#[path = "tests/graph_display_tests.rs"]
mod tests;
