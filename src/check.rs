//! Permission checking of rollout configurations against the end states.
//!
//! Every reachable node of a split transient graph is compared with its
//! counterpart in the end state it originates from: initial-side nodes
//! against the pure initial graph, target-side nodes against the pure
//! target graph. A node reached with a weaker credential than its end
//! state accepts is a weakening finding; an Empty placeholder that is
//! reachable at all is an existence finding.

use std::fmt;

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::graph::{Found, Graph};
use crate::node::{NodeIdx, Origin};
use crate::security::Security;
use crate::template::{Template, TemplateError};
use crate::upgrade;

/// The transient graph references a resource the end-state graph does not
/// know. This cannot come from user input; it indicates a composition
/// bug.
#[derive(Debug, Error, Diagnostic)]
#[error("internal inconsistency: {id} has no counterpart in the {side} state graph")]
#[diagnostic(code(rampart::check::missing_counterpart))]
pub struct MissingCounterpart {
    pub id: String,
    pub side: Origin,
}

/// Any failure of the end-to-end analysis pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum AnalysisError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Inconsistent(#[from] MissingCounterpart),
}

/// What a finding reports about a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    /// Reachable with a weaker credential than the end state accepts.
    Weakened { required: Security, actual: Security },
    /// Reachable at a point of the rollout where it does not exist.
    Vanished,
}

/// A warning against a single resource. Findings deduplicate by resource
/// id across all rollout configurations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub node: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FindingKind::Weakened { required, actual } => write!(
                f,
                "{} is not sufficiently protected during upgrade: it needs at least {} \
                 but is reachable with {}. Add DependsOn ordering so the protection \
                 applies first.",
                self.node, required, actual
            ),
            FindingKind::Vanished => {
                write!(f, "{} is reachable at a time it does not exist", self.node)
            }
        }
    }
}

/// Run the whole pipeline: build and propagate both end states, compose
/// the transient graph, split it along rollout dependencies, check every
/// split, and deduplicate the findings.
pub fn analyze(initial: &Template, target: &Template) -> Result<Vec<Finding>, AnalysisError> {
    let mut before = initial.graph()?;
    let mut after = target.graph()?;
    before.propagate_security();
    after.propagate_security();

    let transient = upgrade::transient_graph(initial, target)?;
    let splits = upgrade::split_dependencies(transient);
    debug!(splits = splits.len(), "checking rollout configurations");

    let mut findings = Vec::new();
    let mut reported: FxHashSet<String> = FxHashSet::default();
    for mut split in splits {
        split.propagate_security();
        for finding in check_split(&split, &before, &after)? {
            if reported.insert(finding.node.clone()) {
                findings.push(finding);
            }
        }
    }
    Ok(findings)
}

/// Check one concrete rollout configuration against both end states.
/// Only nodes reachable from the transient root are examined.
pub fn check_split(
    transient: &Graph,
    before: &Graph,
    after: &Graph,
) -> Result<Vec<Finding>, MissingCounterpart> {
    let mut out = Vec::new();
    for n in transient.flatten() {
        match transient.node(n).origin {
            Some(Origin::Initial) => check_node(transient, n, before, Origin::Initial, &mut out)?,
            Some(Origin::Target) => check_node(transient, n, after, Origin::Target, &mut out)?,
            None => {}
        }
    }
    Ok(out)
}

fn check_node(
    transient: &Graph,
    idx: NodeIdx,
    reference: &Graph,
    side: Origin,
    out: &mut Vec<Finding>,
) -> Result<(), MissingCounterpart> {
    let node = transient.node(idx);

    if node.is_empty() {
        if !Security::Inaccessible.weaker_than(&node.security) {
            out.push(Finding {
                node: node.id.clone(),
                kind: FindingKind::Vanished,
            });
        }
        return Ok(());
    }

    let counterpart = match reference.find_by_id(&node.id) {
        Some(Found::One(m)) => m,
        Some(Found::Either { initial, .. }) => initial,
        None => {
            return Err(MissingCounterpart {
                id: node.id.clone(),
                side,
            });
        }
    };
    let required = reference.node(counterpart);

    // Warnings about guards themselves are silenced; reaching a guard is
    // how everything behind it gets reached.
    if required.is_guard() {
        return Ok(());
    }
    if !required.security.weaker_than(&node.security) {
        out.push(Finding {
            node: node.id.clone(),
            kind: FindingKind::Weakened {
                required: required.security.clone(),
                actual: node.security.clone(),
            },
        });
    }
    Ok(())
}
