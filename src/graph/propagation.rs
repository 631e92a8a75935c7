//! Monotone security propagation.
//!
//! Starting from `None` at the root, each node's credential only ever gets
//! weaker as new paths to it are discovered. The edge relation may contain
//! cycles; termination comes from the lattice having finite height for the
//! modules present in a graph, not from the graph being acyclic.

use super::Graph;
use crate::node::NodeIdx;
use crate::security::Security;

impl Graph {
    /// Seed the root with [`Security::None`] and run the fixed point.
    ///
    /// Idempotent: running it again on a propagated graph changes nothing.
    pub fn propagate_security(&mut self) {
        self.set_security(self.root(), Security::None);
        self.propagate_from(self.root());
    }

    /// Push this node's credential into its children, recursing wherever a
    /// child's credential became strictly weaker.
    pub fn propagate_from(&mut self, idx: NodeIdx) {
        let incoming = self.node(idx).security.clone();
        let children: Vec<NodeIdx> = self.node(idx).children.clone();
        for child in children {
            let before = self.node(child).security.clone();
            self.update_security(child, &incoming);
            let after = &self.node(child).security;
            if after.weaker_than(&before) && !before.weaker_than(after) {
                self.propagate_from(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::node::Node;

    #[test]
    fn plain_chain_carries_the_root_credential() {
        let mut g = Graph::from_nodes(vec![Node::plain("a"), Node::plain("b")]);
        let (a, b, root) = (NodeIdx(0), NodeIdx(1), g.root());
        g.add_child(root, a);
        g.add_child(a, b);
        g.propagate_security();
        assert_eq!(g.node(root).security, Security::None);
        assert_eq!(g.node(a).security, Security::None);
        assert_eq!(g.node(b).security, Security::None);
    }

    #[test]
    fn guard_stacks_its_credential_downstream() {
        let mut g = Graph::from_nodes(vec![Node::guard("r"), Node::plain("f")]);
        let (r, f, root) = (NodeIdx(0), NodeIdx(1), g.root());
        g.add_child(root, r);
        g.add_child(r, f);
        g.propagate_security();
        assert_eq!(g.node(r).security, Security::module("r"));
        assert_eq!(g.node(f).security, Security::module("r"));
    }

    #[test]
    fn weaker_path_wins_over_guarded_path() {
        let mut g = Graph::from_nodes(vec![Node::guard("r"), Node::plain("f")]);
        let (r, f, root) = (NodeIdx(0), NodeIdx(1), g.root());
        g.add_child(root, r);
        g.add_child(r, f);
        g.add_child(root, f);
        g.propagate_security();
        assert_eq!(g.node(f).security, Security::None);
    }

    #[test]
    fn cycles_terminate() {
        let mut g = Graph::from_nodes(vec![Node::plain("a"), Node::plain("b")]);
        let (a, b, root) = (NodeIdx(0), NodeIdx(1), g.root());
        g.add_child(root, a);
        g.add_child(a, b);
        g.add_child(b, a);
        g.propagate_security();
        assert_eq!(g.node(a).security, Security::None);
        assert_eq!(g.node(b).security, Security::None);
    }

    #[test]
    fn propagation_is_idempotent() {
        let mut g = Graph::from_nodes(vec![Node::guard("r"), Node::plain("f")]);
        let (r, f, root) = (NodeIdx(0), NodeIdx(1), g.root());
        g.add_child(root, r);
        g.add_child(r, f);
        g.propagate_security();
        let snapshot: Vec<Security> = g.live().map(|n| g.node(n).security.clone()).collect();
        g.propagate_security();
        let again: Vec<Security> = g.live().map(|n| g.node(n).security.clone()).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn unreachable_nodes_stay_inaccessible() {
        let mut g = Graph::from_nodes(vec![Node::plain("a"), Node::plain("lone")]);
        let (a, root) = (NodeIdx(0), g.root());
        g.add_child(root, a);
        g.propagate_security();
        assert_eq!(g.node(NodeIdx(1)).security, Security::Inaccessible);
    }
}
