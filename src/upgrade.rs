//! Transient upgrade graphs and dependency splitting.
//!
//! During a rolling deployment some resources already carry their target
//! configuration while others still carry their initial one. The
//! transient graph holds both forms of every changed resource under one
//! id; splitting along declared rollout dependencies then enumerates the
//! concrete mixtures that can actually occur.

use tracing::debug;

use crate::graph::{self, Found, Graph};
use crate::node::{Node, NodeIdx, Origin};
use crate::template::{self, AbstractNode, Template, TemplateError};

/// Compose the transient graph for an upgrade from `initial` to `target`.
///
/// Unchanged resources (same id, structurally equal configuration)
/// contribute only their initial form. Resources present on one side only
/// get an Empty placeholder tagged with the other side's origin, appended
/// before assembly so identifier-keyed relations wire them in.
pub fn transient_graph(initial: &Template, target: &Template) -> Result<Graph, TemplateError> {
    let mut merged: Vec<AbstractNode> = initial.nodes.clone();
    for t in &target.nodes {
        if initial
            .nodes
            .iter()
            .any(|i| i.id == t.id && i.config == t.config)
        {
            continue;
        }
        merged.push(t.clone());
    }

    let (mut nodes, relations) = template::extract(&merged)?;
    for i in &initial.nodes {
        if !target.nodes.iter().any(|t| t.id == i.id) {
            nodes.push(Node::empty(i.id.clone(), Origin::Target));
        }
    }
    for t in &target.nodes {
        if !initial.nodes.iter().any(|i| i.id == t.id) {
            nodes.push(Node::empty(t.id.clone(), Origin::Initial));
        }
    }
    Ok(graph::assemble(nodes, relations))
}

/// Split a transient graph along its rollout dependencies into the set of
/// concrete configurations that can occur.
///
/// Each dependency `f -> t` ("t is reconfigured before f") triples the
/// graph into the initial/initial, initial/target and target/target
/// mixtures; target-of-f with initial-of-t cannot occur because `f` only
/// upgrades after `t`. Splitting recurses until no dependency remains.
pub fn split_dependencies(graph: Graph) -> Vec<Graph> {
    let next = graph.live().find(|&n| !graph.dependencies(n).is_empty());
    let Some(from) = next else {
        return vec![graph];
    };
    let to = graph.dependencies(from)[0];

    let mut out = Vec::new();
    for sub in split_dependency(graph, from, to) {
        out.extend(split_dependencies(sub));
    }
    out
}

fn split_dependency(mut graph: Graph, from: NodeIdx, to: NodeIdx) -> Vec<Graph> {
    let from_id = graph.node(from).id.clone();
    let to_id = graph.node(to).id.clone();
    graph.remove_dependency(from, to);

    let base = graph.copy();
    let (Some(f), Some(t)) = (base.find_by_id(&from_id), base.find_by_id(&to_id)) else {
        return vec![base];
    };
    debug!(%from_id, %to_id, "splitting rollout dependency");

    // Copies share the arena layout, so the lookups above stay valid in
    // each of them.
    let second = base.copy();
    let third = base.copy();
    let mut out = Vec::new();

    if can_keep_initial(&base, f) && can_keep_initial(&base, t) {
        let mut g = base;
        keep_initial(&mut g, f);
        keep_initial(&mut g, t);
        out.push(g);
    }
    if can_keep_initial(&second, f) && can_keep_target(&second, t) {
        let mut g = second;
        keep_initial(&mut g, f);
        keep_target(&mut g, t);
        out.push(g);
    }
    if can_keep_target(&third, f) && can_keep_target(&third, t) {
        let mut g = third;
        keep_target(&mut g, f);
        keep_target(&mut g, t);
        out.push(g);
    }
    out
}

fn can_keep_initial(g: &Graph, found: Found) -> bool {
    match found {
        Found::Either { .. } => true,
        Found::One(n) => g.node(n).origin == Some(Origin::Initial),
    }
}

fn can_keep_target(g: &Graph, found: Found) -> bool {
    match found {
        Found::Either { .. } => true,
        Found::One(n) => g.node(n).origin == Some(Origin::Target),
    }
}

fn keep_initial(g: &mut Graph, found: Found) {
    if let Found::Either { target, .. } = found {
        remove_branch(g, target);
    }
}

fn keep_target(g: &mut Graph, found: Found) {
    if let Found::Either { initial, .. } = found {
        remove_branch(g, initial);
    }
}

/// Remove one alternate of a changed resource from a split.
///
/// When the surviving alternate is a guard, parent-to-child edges that
/// would bypass it are dropped too: the edges survived building only
/// because the now-removed instance did not cover them.
fn remove_branch(g: &mut Graph, branch: NodeIdx) {
    let id = g.node(branch).id.clone();
    let survivor = match g.find_by_id(&id) {
        Some(Found::Either { initial, target }) => {
            Some(if initial == branch { target } else { initial })
        }
        _ => None,
    };
    g.remove_node(branch);

    if let Some(survivor) = survivor {
        if g.node(survivor).is_guard() {
            let children: Vec<NodeIdx> = g.children(survivor).to_vec();
            for parent in g.parents_of(survivor) {
                for &child in &children {
                    g.remove_child(parent, child);
                }
            }
        }
    }
}
