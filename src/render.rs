//! Graphviz DOT rendering of a dataflow graph.
//!
//! Renders the reachable part of a propagated graph: plain nodes show
//! their computed credential, guards are red, placeholders gray, and the
//! web root is filled. Output is deterministic in arena order.

use std::fmt::Write;

use crate::graph::Graph;
use crate::node::NodeKind;

/// Render the reachable part of a graph as a DOT digraph.
#[must_use]
pub fn to_dot(graph: &Graph) -> String {
    let mut out = String::from("digraph {\n");
    let reachable = graph.flatten();
    for &idx in &reachable {
        let node = graph.node(idx);
        let label = escape(&node.name);
        match &node.kind {
            NodeKind::Root => {
                let _ = writeln!(
                    out,
                    "  {idx} [label=\"{label}\", fillcolor=gray, style=filled];"
                );
            }
            NodeKind::Guard { .. } => {
                let _ = writeln!(out, "  {idx} [label=\"{label}\", color=red];");
            }
            NodeKind::Empty => {
                let _ = writeln!(out, "  {idx} [label=\"{label}\", color=gray];");
            }
            NodeKind::Plain => {
                let security = escape(&node.security.to_string());
                let _ = writeln!(out, "  {idx} [label=\"{security}({label})\"];");
            }
        }
    }
    for &idx in &reachable {
        for &child in graph.children(idx) {
            let _ = writeln!(out, "  {idx} -> {child};");
        }
    }
    out.push_str("}\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
