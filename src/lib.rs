//! # Rampart: upgrade-plan security analysis for CloudFormation
//!
//! Rampart decides whether rolling out a template change can transiently
//! expose a resource behind weaker authentication than either end state
//! requires. During a rolling deployment some resources already carry
//! their target configuration while others still carry their initial one;
//! if any reachable mixture admits traffic a pure end state would reject,
//! the upgrade plan is unsafe.
//!
//! ## How it works
//!
//! - Templates load into abstract nodes via the capability
//!   [`catalog`](crate::catalog), which knows, per resource type, where
//!   requests flow, what guards what, and what contains what.
//! - The [`graph`](crate::graph) builder wires a typed dataflow graph:
//!   security filters are grafted onto the edges they protect, containers
//!   dissolve into their contents.
//! - Propagation computes, for every node, the weakest
//!   [`Security`](crate::security::Security) credential sufficient to
//!   reach it from the web.
//! - The [`upgrade`](crate::upgrade) composer builds the transient graph
//!   of the rollout and splits it along declared ordering dependencies
//!   into the concrete configurations that can occur.
//! - The [`check`](crate::check) pass compares every configuration
//!   against both end states and reports the resources that come up
//!   short.
//!
//! ## Example
//!
//! ```
//! use rampart::check;
//! use rampart::node::Origin;
//! use rampart::template::Template;
//! use serde_json::json;
//!
//! let doc = json!({
//!     "Resources": {
//!         "Fn": {
//!             "Type": "AWS::Lambda::Function",
//!             "Properties": { "Role": { "Ref": "Role" } },
//!         },
//!         "Role": { "Type": "AWS::IAM::Role", "Properties": {} },
//!     }
//! });
//!
//! // Nothing changes between the two states, so the rollout is safe.
//! let initial = Template::from_value(doc.clone(), Origin::Initial);
//! let target = Template::from_value(doc, Origin::Target);
//! let findings = check::analyze(&initial, &target).unwrap();
//! assert!(findings.is_empty());
//! ```

pub mod catalog;
pub mod check;
pub mod graph;
pub mod node;
pub mod render;
pub mod security;
pub mod template;
pub mod upgrade;
