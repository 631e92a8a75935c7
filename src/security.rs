//! Security credential lattice.
//!
//! Every node in a dataflow graph carries a credential describing what a
//! caller must hold to reach it. Credentials form a lattice: [`Security::None`]
//! is the bottom (anyone passes), [`Security::Inaccessible`] the top (nobody
//! passes), named modules sit in between and are comparable only to
//! themselves, and `And`/`Or` combine them.
//!
//! The partial order is exposed as [`Security::weaker_than`]: `a` is weaker
//! than `b` when anyone holding `b` can pass a filter requiring `a`.
//! [`Security::join`] and [`Security::meet`] are smart constructors that
//! collapse to one operand whenever the operands are comparable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A credential in the security lattice.
///
/// # Examples
///
/// ```
/// use rampart::security::Security;
///
/// let role = Security::module("AppRole");
/// assert!(Security::None.weaker_than(&role));
/// assert!(role.weaker_than(&Security::Inaccessible));
///
/// // Two distinct modules are incomparable; join keeps both as alternatives.
/// let either = Security::join(Security::module("A"), Security::module("B"));
/// assert!(either.weaker_than(&Security::module("A")));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Security {
    /// Bottom of the lattice: no credential required.
    None,
    /// Top of the lattice: no credential suffices.
    Inaccessible,
    /// A named atomic credential, comparable only to itself.
    Module(String),
    /// Both operands are required.
    And(Box<Security>, Box<Security>),
    /// Either operand suffices.
    Or(Box<Security>, Box<Security>),
}

impl Security {
    /// Convenience constructor for [`Security::Module`].
    pub fn module(name: impl Into<String>) -> Self {
        Security::Module(name.into())
    }

    /// Whether `self` admits at least everyone `other` admits.
    ///
    /// Composite operands on the left decide before composites on the
    /// right, so `And(a, b) <= x` decomposes into `a <= x && b <= x` even
    /// when `x` is itself composite. Structurally equal credentials always
    /// compare weaker-or-equal, which keeps the order reflexive.
    #[must_use]
    pub fn weaker_than(&self, other: &Security) -> bool {
        use Security::*;
        if self == other {
            return true;
        }
        match (self, other) {
            (None, _) => true,
            (_, Inaccessible) => true,
            (Inaccessible, _) => false,
            (And(a, b), _) => a.weaker_than(other) && b.weaker_than(other),
            (Or(a, b), _) => a.weaker_than(other) || b.weaker_than(other),
            (_, And(a, b)) => self.weaker_than(a) || self.weaker_than(b),
            (_, Or(a, b)) => self.weaker_than(a) && self.weaker_than(b),
            (Module(m), Module(n)) => m == n,
            (Module(_), None) => false,
        }
    }

    /// The weaker of two credentials when they are comparable, otherwise
    /// their disjunction. Used when a second path reaches an
    /// already-reachable node.
    #[must_use]
    pub fn join(a: Security, b: Security) -> Security {
        if a.weaker_than(&b) {
            a
        } else if b.weaker_than(&a) {
            b
        } else {
            Security::Or(Box::new(a), Box::new(b))
        }
    }

    /// The stronger of two credentials when they are comparable, otherwise
    /// their conjunction. Used when a guard stacks its own credential onto
    /// an existing requirement.
    #[must_use]
    pub fn meet(a: Security, b: Security) -> Security {
        if a.weaker_than(&b) {
            b
        } else if b.weaker_than(&a) {
            a
        } else {
            Security::And(Box::new(a), Box::new(b))
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Security::None => write!(f, "None"),
            Security::Inaccessible => write!(f, "Inaccessible"),
            Security::Module(name) => write!(f, "{name}"),
            Security::And(a, b) => write!(f, "({a} and {b})"),
            Security::Or(a, b) => write!(f, "({a} or {b})"),
        }
    }
}
