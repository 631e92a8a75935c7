//! Graph assembly: from typed nodes and extracted relations to a wired
//! dataflow graph.
//!
//! Assembly happens in a fixed order, and the order is load-bearing:
//!
//! 1. externally reachable resources hang off the web root,
//! 2. direct edges are resolved (identifier endpoints expand to every
//!    node carrying that id),
//! 3. ordering dependencies are wired between target-side nodes,
//! 4. containment and protection relations are expanded onto concrete
//!    nodes,
//! 5. guards are grafted onto the edges they protect, directed relations
//!    first, then undirected ones one id-group at a time, each group
//!    followed by removal of the direct edges it fully covers,
//! 6. containers dissolve into their contents and end disconnected.

use rustc_hash::FxHashSet;
use tracing::debug;

use super::Graph;
use crate::node::{Node, NodeIdx, Origin};

/// An endpoint in an extracted relation: either a concrete node or a
/// resource identifier still to be expanded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeIdx),
    Id(String),
}

/// A directed pair used for both flow edges and rollout dependencies.
#[derive(Clone, Debug)]
pub struct Relation {
    pub from: NodeRef,
    pub to: NodeRef,
}

/// A protection relation. `to` endpoints are guarded on entrance; `from`
/// endpoints are guarded on exit. Relations sharing a guard merge before
/// grafting.
#[derive(Clone, Debug)]
pub struct GuardRelation {
    pub guard: NodeRef,
    pub from: Option<NodeRef>,
    pub to: Option<NodeRef>,
}

/// One resource living inside another.
#[derive(Clone, Debug)]
pub struct Containment {
    pub container: NodeRef,
    pub content: NodeRef,
}

/// Everything the extraction pass mined from a node list.
#[derive(Clone, Debug, Default)]
pub struct Relations {
    pub edges: Vec<Relation>,
    pub deps: Vec<Relation>,
    pub guards: Vec<GuardRelation>,
    pub containment: Vec<Containment>,
}

/// A protection relation expanded onto a concrete guard node.
struct GuardGroup {
    guard: NodeIdx,
    from: Vec<NodeIdx>,
    to: Vec<NodeIdx>,
}

/// Assemble a dataflow graph from materialized nodes and their relations.
pub fn assemble(nodes: Vec<Node>, relations: Relations) -> Graph {
    let mut g = Graph::from_nodes(nodes);
    let root = g.root();

    let accessible: Vec<NodeIdx> = g.live().filter(|&n| g.node(n).is_accessible()).collect();
    for n in accessible {
        g.add_child(root, n);
    }

    for edge in &relations.edges {
        for from in resolve(&g, &edge.from) {
            for to in resolve(&g, &edge.to) {
                g.add_child(from, to);
            }
        }
    }

    // Ordering constraints only matter between two target-side nodes.
    for dep in &relations.deps {
        for from in resolve(&g, &dep.from) {
            for to in resolve(&g, &dep.to) {
                if g.node(from).origin == Some(Origin::Target)
                    && g.node(to).origin == Some(Origin::Target)
                {
                    g.add_dependency(from, to);
                }
            }
        }
    }

    let containers = expand_containment(&g, &relations.containment);
    let guards = expand_guards(&g, &relations.guards);
    debug!(
        guards = guards.len(),
        containers = containers.len(),
        "grafting protection relations"
    );
    graft_guards(&mut g, &guards, &containers);
    dissolve_containers(&mut g, &containers);
    g
}

fn resolve(g: &Graph, r: &NodeRef) -> Vec<NodeIdx> {
    match r {
        NodeRef::Node(idx) => vec![*idx],
        NodeRef::Id(id) => g.with_id(id).collect(),
    }
}

/// Group raw containment pairs by container endpoint, then expand both
/// sides onto concrete nodes. Encounter order is preserved throughout;
/// dissolution depends on it when containers nest.
fn expand_containment(g: &Graph, raw: &[Containment]) -> Vec<(NodeIdx, Vec<NodeIdx>)> {
    let mut grouped: Vec<(&NodeRef, Vec<&NodeRef>)> = Vec::new();
    for c in raw {
        match grouped.iter_mut().find(|(key, _)| **key == c.container) {
            Some((_, contents)) => contents.push(&c.content),
            None => grouped.push((&c.container, vec![&c.content])),
        }
    }

    let mut out: Vec<(NodeIdx, Vec<NodeIdx>)> = Vec::new();
    for (key, content_refs) in grouped {
        for container in resolve(g, key) {
            let i = match out.iter().position(|(c, _)| *c == container) {
                Some(i) => i,
                None => {
                    out.push((container, Vec::new()));
                    out.len() - 1
                }
            };
            for content in &content_refs {
                let contents = resolve(g, content);
                out[i].1.extend(contents);
            }
        }
    }
    out
}

/// Group raw protection relations by guard endpoint, then expand onto
/// concrete guard nodes, merging `from`/`to` sets per node.
fn expand_guards(g: &Graph, raw: &[GuardRelation]) -> Vec<GuardGroup> {
    let mut grouped: Vec<(&NodeRef, Vec<&NodeRef>, Vec<&NodeRef>)> = Vec::new();
    for rel in raw {
        let i = match grouped.iter().position(|(key, _, _)| **key == rel.guard) {
            Some(i) => i,
            None => {
                grouped.push((&rel.guard, Vec::new(), Vec::new()));
                grouped.len() - 1
            }
        };
        if let Some(from) = &rel.from {
            grouped[i].1.push(from);
        }
        if let Some(to) = &rel.to {
            grouped[i].2.push(to);
        }
    }

    let mut groups: Vec<GuardGroup> = Vec::new();
    for (key, from_refs, to_refs) in grouped {
        for guard in resolve(g, key) {
            let i = match groups.iter().position(|grp| grp.guard == guard) {
                Some(i) => i,
                None => {
                    groups.push(GuardGroup {
                        guard,
                        from: Vec::new(),
                        to: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            for r in &from_refs {
                let nodes = resolve(g, r);
                groups[i].from.extend(nodes);
            }
            for r in &to_refs {
                let nodes = resolve(g, r);
                groups[i].to.extend(nodes);
            }
        }
    }
    groups
}

fn graft_guards(g: &mut Graph, groups: &[GuardGroup], containers: &[(NodeIdx, Vec<NodeIdx>)]) {
    let (directed, undirected): (Vec<&GuardGroup>, Vec<&GuardGroup>) =
        groups.iter().partition(|grp| !grp.from.is_empty());

    graft_pass(g, &directed, containers);

    // Undirected relations go one guard id at a time: every group whose
    // guard carries the id (including directed ones) grafts together, and
    // the edges the whole id-group covers are removed right after.
    let mut done: Vec<String> = Vec::new();
    for grp in &undirected {
        let id = g.node(grp.guard).id.clone();
        if done.contains(&id) {
            continue;
        }
        done.push(id.clone());
        let pass: Vec<&GuardGroup> = groups
            .iter()
            .filter(|other| g.node(other.guard).id == id)
            .collect();
        graft_pass(g, &pass, containers);
    }
}

/// Insert each guard between the endpoints of every edge its relation
/// matches, then drop the direct edges that are now fully covered.
fn graft_pass(g: &mut Graph, groups: &[&GuardGroup], containers: &[(NodeIdx, Vec<NodeIdx>)]) {
    let mut obsolete: Vec<(NodeIdx, NodeIdx, NodeIdx)> = Vec::new();
    for grp in groups {
        let mut from_nodes = grp.from.clone();
        let mut to_nodes = grp.to.clone();
        expand_with_contents(g, containers, &mut from_nodes);
        expand_with_contents(g, containers, &mut to_nodes);

        let mut edges: Vec<(NodeIdx, NodeIdx)> = Vec::new();
        if from_nodes.is_empty() {
            // No explicit requester set: guard every edge into the
            // protected nodes, except those from the protected set itself
            // or from another instance of the guard's id.
            let guard_id = g.node(grp.guard).id.clone();
            for &to in &to_nodes {
                let parents: Vec<NodeIdx> = g.live().collect();
                for x in parents {
                    if !g.has_child(x, to) || to_nodes.contains(&x) {
                        continue;
                    }
                    if g.node(x).id == guard_id {
                        continue;
                    }
                    edges.push((x, to));
                }
            }
        } else {
            for &from in &from_nodes {
                for &to in &to_nodes {
                    if g.has_child(from, to) {
                        edges.push((from, to));
                    }
                }
            }
        }

        for (from, to) in edges {
            g.add_child(from, grp.guard);
            g.add_child(grp.guard, to);
            obsolete.push((from, to, grp.guard));
        }
    }
    for (from, to, via) in obsolete {
        conditional_remove_edge(g, from, to, via);
    }
}

/// Drop the direct edge `from -> to` only when every node carrying the
/// guard's id sits between `from` and `to`. The instance count is over
/// all live nodes, so a placeholder instance that never grafted keeps the
/// direct edge alive.
fn conditional_remove_edge(g: &mut Graph, from: NodeIdx, to: NodeIdx, via: NodeIdx) {
    let via_id = g.node(via).id.clone();
    let covering: Vec<NodeIdx> = g
        .children(from)
        .iter()
        .copied()
        .filter(|&c| g.node(c).id == via_id)
        .collect();
    if covering.len() != g.with_id(&via_id).count() {
        return;
    }
    if covering.iter().any(|&c| !g.has_child(c, to)) {
        return;
    }
    g.remove_child(from, to);
}

/// A container mentioned in a guard's endpoint set stands for itself plus
/// its contents, transitively. A container reached twice is not expanded
/// again.
fn expand_with_contents(
    g: &Graph,
    containers: &[(NodeIdx, Vec<NodeIdx>)],
    set: &mut Vec<NodeIdx>,
) {
    let mut expanded = FxHashSet::default();
    let mut i = 0;
    while i < set.len() {
        let n = set[i];
        i += 1;
        if !g.node(n).is_container() || !expanded.insert(n) {
            continue;
        }
        if let Some((_, contents)) = containers.iter().find(|(c, _)| *c == n) {
            set.extend_from_slice(contents);
        }
    }
}

/// Replace each container by its contents: contents inherit the
/// container's parents and children, then the container is disconnected
/// on both sides.
fn dissolve_containers(g: &mut Graph, containers: &[(NodeIdx, Vec<NodeIdx>)]) {
    for (container, contents) in containers {
        let container = *container;
        let parents: Vec<NodeIdx> = g
            .live()
            .filter(|&p| p != container && g.has_child(p, container))
            .collect();
        let children: Vec<NodeIdx> = g
            .children(container)
            .iter()
            .copied()
            .filter(|&c| c != container)
            .collect();
        for &content in contents {
            if content == container {
                continue;
            }
            for &child in &children {
                g.add_child(content, child);
            }
            for &parent in &parents {
                g.add_child(parent, content);
            }
        }
        for &parent in &parents {
            g.remove_child(parent, container);
        }
    }

    // Containers end fully disconnected, both sides.
    let all: Vec<NodeIdx> = g.live().filter(|&n| g.node(n).is_container()).collect();
    for container in all {
        g.node_mut(container).children.clear();
        for parent in g.parents_of(container) {
            g.remove_child(parent, container);
        }
    }
}
