//! Node model for dataflow graphs.
//!
//! Nodes live in an arena owned by [`crate::graph::Graph`] and reference
//! each other by [`NodeIdx`]. The kind of a node is a closed tagged
//! variant: ordinary resources, guards (security filters), placeholders
//! for resources absent from one end state, and the single synthetic web
//! root.

use serde_json::Value;
use std::fmt;

use crate::catalog::Capability;
use crate::security::Security;

/// Stable index of a node within its graph's arena.
///
/// Copies of a graph keep the arena layout, so an index obtained from one
/// copy addresses the same resource in every other copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub(crate) usize);

impl NodeIdx {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Which end state a node was loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    Initial,
    Target,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Initial => write!(f, "initial"),
            Origin::Target => write!(f, "target"),
        }
    }
}

/// The closed set of node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// An ordinary resource that traffic flows through.
    Plain,
    /// A security filter. Traversing it stacks `own` onto the requirement
    /// of everything downstream.
    Guard { own: Security },
    /// Placeholder for a resource that does not exist in one end state.
    Empty,
    /// The synthetic source of all external traffic. Exactly one per graph.
    Root,
}

/// A graph vertex.
///
/// Out-edges (`children`) and rollout-ordering `dependencies` are
/// insertion-ordered sets; duplicates are rejected on insert. The
/// `security` field is the weakest credential currently known to reach the
/// node and starts at [`Security::Inaccessible`].
#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub origin: Option<Origin>,
    pub security: Security,
    pub(crate) children: Vec<NodeIdx>,
    pub(crate) dependencies: Vec<NodeIdx>,
    pub(crate) caps: Option<&'static Capability>,
    pub(crate) config: Option<Value>,
    pub(crate) removed: bool,
}

impl Node {
    fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        Node {
            name: id.clone(),
            id,
            kind,
            origin: None,
            security: Security::Inaccessible,
            children: Vec::new(),
            dependencies: Vec::new(),
            caps: None,
            config: None,
            removed: false,
        }
    }

    /// An ordinary resource node.
    pub fn plain(id: impl Into<String>) -> Self {
        Node::new(id, NodeKind::Plain)
    }

    /// A guard node. The intrinsic credential defaults to a module named
    /// after the node.
    pub fn guard(id: impl Into<String>) -> Self {
        let id = id.into();
        let own = Security::module(id.clone());
        Node::new(id, NodeKind::Guard { own })
    }

    /// A placeholder for a resource absent from the given end state's
    /// counterpart side.
    pub fn empty(id: impl Into<String>, origin: Origin) -> Self {
        let mut node = Node::new(id, NodeKind::Empty);
        node.origin = Some(origin);
        node
    }

    /// The synthetic web root.
    pub(crate) fn root() -> Self {
        Node::new("Web", NodeKind::Root)
    }

    #[must_use]
    pub fn is_guard(&self) -> bool {
        matches!(self.kind, NodeKind::Guard { .. })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, NodeKind::Empty)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    /// Whether the node groups other resources (driven by its capability).
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.caps.is_some_and(|c| c.container)
    }

    /// Whether the node answers external traffic (driven by its
    /// capability; guards and synthetic nodes never do).
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.caps.is_some_and(|c| c.is_accessible())
    }

    /// The raw resource configuration this node was built from, if any.
    #[must_use]
    pub fn config(&self) -> Option<&Value> {
        self.config.as_ref()
    }
}
