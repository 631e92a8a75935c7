//! Dataflow graph over an arena of nodes.
//!
//! The graph owns its nodes; edges and dependencies reference nodes by
//! stable [`NodeIdx`]. The edge relation may contain cycles; everything
//! that walks it either tracks visited nodes or relies on the monotone
//! termination of security propagation. Node removal tombstones the arena
//! slot so indices held elsewhere stay valid.

mod builder;
mod propagation;

pub use builder::{Containment, GuardRelation, NodeRef, Relation, Relations, assemble};

use rustc_hash::FxHashSet;

use crate::node::{Node, NodeIdx, NodeKind, Origin};
use crate::security::Security;

/// Result of looking a resource id up in a graph.
///
/// A transient upgrade graph holds both forms of a changed resource under
/// one id; the lookup then yields the pair, initial form first, standing
/// for the rollout-time choice between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Found {
    One(NodeIdx),
    Either { initial: NodeIdx, target: NodeIdx },
}

/// A dataflow graph: node arena plus the single web root.
#[derive(Clone, Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    root: NodeIdx,
}

impl Graph {
    /// Build a graph over the given nodes, appending the synthetic root.
    #[must_use]
    pub fn from_nodes(mut nodes: Vec<Node>) -> Self {
        let root = NodeIdx(nodes.len());
        nodes.push(Node::root());
        Graph { nodes, root }
    }

    #[must_use]
    pub fn root(&self) -> NodeIdx {
        self.root
    }

    #[must_use]
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.0]
    }

    /// Iterate over all live (non-removed) nodes in arena order.
    pub fn live(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.removed)
            .map(|(i, _)| NodeIdx(i))
    }

    /// All live nodes carrying the given resource id.
    pub fn with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = NodeIdx> + 'a {
        self.live().filter(move |&n| self.node(n).id == id)
    }

    /// Look up a resource id. Two live nodes under one id form an
    /// initial/target pair regardless of discovery order.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<Found> {
        let mut matches = self.with_id(id);
        let first = matches.next()?;
        match matches.next() {
            None => Some(Found::One(first)),
            Some(second) => {
                if self.node(first).origin == Some(Origin::Initial) {
                    Some(Found::Either {
                        initial: first,
                        target: second,
                    })
                } else {
                    Some(Found::Either {
                        initial: second,
                        target: first,
                    })
                }
            }
        }
    }

    // ========================================================================
    // Edge and dependency operations
    // ========================================================================

    /// Add an out-edge. Duplicates and self-loops are no-ops.
    pub fn add_child(&mut self, parent: NodeIdx, child: NodeIdx) {
        if parent == child {
            return;
        }
        let node = self.node_mut(parent);
        if !node.children.contains(&child) {
            node.children.push(child);
        }
    }

    pub fn remove_child(&mut self, parent: NodeIdx, child: NodeIdx) {
        self.node_mut(parent).children.retain(|c| *c != child);
    }

    #[must_use]
    pub fn has_child(&self, parent: NodeIdx, child: NodeIdx) -> bool {
        self.node(parent).children.contains(&child)
    }

    /// Substitute `new` for `old` in place; if `new` is already a child,
    /// `old` is dropped instead so the set stays duplicate-free.
    pub fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        let node = self.node_mut(parent);
        if node.children.contains(&new) {
            node.children.retain(|c| *c != old);
        } else {
            for c in &mut node.children {
                if *c == old {
                    *c = new;
                }
            }
        }
    }

    #[must_use]
    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.node(idx).children
    }

    /// Parents are never stored; they are recomputed by scanning.
    #[must_use]
    pub fn parents_of(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        self.live().filter(|&p| self.has_child(p, idx)).collect()
    }

    pub fn add_dependency(&mut self, from: NodeIdx, to: NodeIdx) {
        let node = self.node_mut(from);
        if !node.dependencies.contains(&to) {
            node.dependencies.push(to);
        }
    }

    pub fn remove_dependency(&mut self, from: NodeIdx, to: NodeIdx) {
        self.node_mut(from).dependencies.retain(|d| *d != to);
    }

    #[must_use]
    pub fn has_dependency(&self, from: NodeIdx, to: NodeIdx) -> bool {
        self.node(from).dependencies.contains(&to)
    }

    #[must_use]
    pub fn dependencies(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.node(idx).dependencies
    }

    /// Strip every edge and dependency reference to `idx` from the live
    /// graph, then tombstone the slot.
    pub fn remove_node(&mut self, idx: NodeIdx) {
        for i in 0..self.nodes.len() {
            if self.nodes[i].removed {
                continue;
            }
            self.nodes[i].children.retain(|c| *c != idx);
            self.nodes[i].dependencies.retain(|d| *d != idx);
        }
        self.nodes[idx.0].removed = true;
    }

    // ========================================================================
    // Security bookkeeping
    // ========================================================================

    pub fn set_security(&mut self, idx: NodeIdx, security: Security) {
        self.node_mut(idx).security = security;
    }

    /// Weaken a node's credential with a newly discovered path. Guards
    /// stack their own credential back on top, which is what propagates
    /// it to everything downstream.
    pub fn update_security(&mut self, idx: NodeIdx, incoming: &Security) {
        let node = self.node_mut(idx);
        node.security = Security::join(node.security.clone(), incoming.clone());
        if let NodeKind::Guard { own } = &node.kind {
            node.security = Security::meet(node.security.clone(), own.clone());
        }
    }

    // ========================================================================
    // Traversal and copying
    // ========================================================================

    /// Reachable closure from the root, in preorder; each node once.
    #[must_use]
    pub fn flatten(&self) -> Vec<NodeIdx> {
        self.flatten_from(self.root)
    }

    /// Reachable closure from `start` including `start` itself.
    #[must_use]
    pub fn flatten_from(&self, start: NodeIdx) -> Vec<NodeIdx> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        self.flatten_into(start, &mut seen, &mut order);
        order
    }

    fn flatten_into(&self, idx: NodeIdx, seen: &mut FxHashSet<NodeIdx>, order: &mut Vec<NodeIdx>) {
        if !seen.insert(idx) {
            return;
        }
        order.push(idx);
        for i in 0..self.node(idx).children.len() {
            let child = self.node(idx).children[i];
            self.flatten_into(child, seen, order);
        }
    }

    /// Detached copy. The arena layout is preserved, so edge indices stay
    /// valid without a rewriting pass; computed credentials reset to
    /// [`Security::Inaccessible`] because a copy starts unpropagated.
    #[must_use]
    pub fn copy(&self) -> Graph {
        let mut copy = self.clone();
        for node in &mut copy.nodes {
            node.security = Security::Inaccessible;
        }
        copy
    }
}
