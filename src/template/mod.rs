//! Template front-end: loading, catalog dispatch, relation extraction.
//!
//! A [`Template`] is a list of abstract nodes lifted out of one
//! CloudFormation document. Loading is extension-dispatched (YAML goes
//! through tag normalization, everything else parses as JSON), resource
//! entries resolve against the capability catalog, and unknown or
//! untyped entries are reported and dropped rather than failing the run.
//! Malformed values inside a kept resource are fatal once the extraction
//! pass actually scans them.

mod refs;
mod yaml;

pub use refs::{find_deps, find_refs, references};

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::catalog::{self, Capability};
use crate::graph::{self, Containment, Graph, GuardRelation, NodeRef, Relation, Relations};
use crate::node::{Node, NodeIdx, Origin};

/// Errors that abort template processing.
#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    /// Template file could not be read.
    #[error("failed to read template {}", path.display())]
    #[diagnostic(code(rampart::template::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template is not valid YAML.
    #[error("failed to parse YAML template {}", path.display())]
    #[diagnostic(code(rampart::template::yaml))]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Template is not valid JSON.
    #[error("failed to parse JSON template {}", path.display())]
    #[diagnostic(code(rampart::template::json))]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A reference position held something other than a string.
    #[error("expected a string reference, found {value}")]
    #[diagnostic(code(rampart::template::expected_string))]
    ExpectedString { value: Value },

    /// `Fn::GetAtt` content that is neither `"<id>.Arn"` nor a non-empty
    /// list starting with an id.
    #[error("malformed Fn::GetAtt, expected \"<id>.Arn\" or a list: {value}")]
    #[diagnostic(code(rampart::template::get_att))]
    MalformedGetAtt { value: Value },

    /// `DependsOn` takes a string or a list of strings.
    #[error("malformed DependsOn entry: {value}")]
    #[diagnostic(code(rampart::template::depends_on))]
    MalformedDependsOn { value: Value },

    /// A null where the configuration scan expected a value.
    #[error("unexpected null in resource configuration")]
    #[diagnostic(code(rampart::template::null))]
    UnexpectedNull,

    /// YAML mapping key that is not a string.
    #[error("mapping keys must be strings, found {found}")]
    #[diagnostic(code(rampart::template::key))]
    NonStringKey { found: String },

    /// A YAML number with no JSON representation.
    #[error("number {found} cannot be represented")]
    #[diagnostic(code(rampart::template::number))]
    NonFiniteNumber { found: String },
}

/// A resource lifted out of a template: identifier, shared capability
/// descriptor, raw entry, and the end state it came from.
#[derive(Clone, Debug)]
pub struct AbstractNode {
    pub id: String,
    pub caps: &'static Capability,
    pub config: Value,
    pub origin: Origin,
}

/// One loaded template, tagged with the end state it describes.
#[derive(Clone, Debug)]
pub struct Template {
    pub origin: Origin,
    pub nodes: Vec<AbstractNode>,
}

impl Template {
    /// Load a template from disk. `.yml`/`.yaml` files go through YAML
    /// tag normalization; anything else parses as JSON.
    pub fn from_path(path: &Path, origin: Origin) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "yml" | "yaml"));
        let value = if is_yaml {
            let parsed: serde_yaml::Value =
                serde_yaml::from_str(&text).map_err(|source| TemplateError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?;
            yaml::normalize(parsed)?
        } else {
            serde_json::from_str(&text).map_err(|source| TemplateError::Json {
                path: path.to_path_buf(),
                source,
            })?
        };
        Ok(Self::from_value(value, origin))
    }

    /// Lift resources out of an already-parsed template value.
    ///
    /// The resource section is `Resources` or, failing that, lowercase
    /// `resources`. A missing section is a warning, not an error.
    #[must_use]
    pub fn from_value(value: Value, origin: Origin) -> Self {
        let section = value.get("Resources").or_else(|| value.get("resources"));
        let Some(Value::Object(resources)) = section else {
            warn!("could not find a resources section in the template");
            return Template {
                origin,
                nodes: Vec::new(),
            };
        };

        let mut nodes = Vec::new();
        for (id, entry) in resources {
            let Some(type_value) = entry.get("Type") else {
                warn!(resource = %id, "resource has no Type, dropping it");
                continue;
            };
            let Some(type_name) = type_value.as_str() else {
                warn!(resource = %id, "resource Type is not a string, dropping it");
                continue;
            };
            match catalog::lookup(type_name) {
                Some(caps) => nodes.push(AbstractNode {
                    id: id.clone(),
                    caps,
                    config: entry.clone(),
                    origin,
                }),
                None => {
                    if !catalog::is_ignored(type_name) {
                        warn!(resource = %id, resource_type = %type_name, "unsupported resource type, dropping it");
                    }
                }
            }
        }
        Template { origin, nodes }
    }

    /// Build and wire this template's dataflow graph.
    pub fn graph(&self) -> Result<Graph, TemplateError> {
        let (nodes, relations) = extract(&self.nodes)?;
        Ok(graph::assemble(nodes, relations))
    }
}

/// Materialize abstract nodes into arena nodes and mine their relations.
///
/// The arena order matches the input order; relation endpoints reference
/// the context node concretely and harvested references by identifier.
pub fn extract(abstract_nodes: &[AbstractNode]) -> Result<(Vec<Node>, Relations), TemplateError> {
    let mut nodes = Vec::with_capacity(abstract_nodes.len());
    for an in abstract_nodes {
        let mut node = if an.caps.security {
            Node::guard(an.id.clone())
        } else {
            Node::plain(an.id.clone())
        };
        node.origin = Some(an.origin);
        node.caps = Some(an.caps);
        node.config = Some(an.config.clone());
        nodes.push(node);
    }

    let mut relations = Relations::default();
    for (i, an) in abstract_nodes.iter().enumerate() {
        mine(NodeIdx(i), an, &mut relations)?;
    }
    Ok((nodes, relations))
}

/// Apply one node's capability descriptor to its configuration.
fn mine(ctx: NodeIdx, an: &AbstractNode, out: &mut Relations) -> Result<(), TemplateError> {
    let no_props = Value::Object(serde_json::Map::new());
    let props = an.config.get("Properties").unwrap_or(&no_props);
    let caps = an.caps;

    for path in caps.flow_to {
        for r in references(props, path)? {
            out.edges.push(Relation {
                from: NodeRef::Node(ctx),
                to: NodeRef::Id(r),
            });
        }
    }
    for path in caps.flow_from {
        for r in references(props, path)? {
            out.edges.push(Relation {
                from: NodeRef::Id(r),
                to: NodeRef::Node(ctx),
            });
        }
    }
    for (left, right) in caps.flow_pairs {
        let lhs = references(props, left)?;
        let rhs = references(props, right)?;
        for l in &lhs {
            for r in &rhs {
                out.edges.push(Relation {
                    from: NodeRef::Id(l.clone()),
                    to: NodeRef::Id(r.clone()),
                });
            }
        }
    }

    for path in caps.protects {
        for r in references(props, path)? {
            out.guards.push(GuardRelation {
                guard: NodeRef::Node(ctx),
                from: None,
                to: Some(NodeRef::Id(r)),
            });
        }
    }
    for path in caps.protected_by {
        for r in references(props, path)? {
            out.guards.push(GuardRelation {
                guard: NodeRef::Id(r),
                from: None,
                to: Some(NodeRef::Node(ctx)),
            });
        }
    }
    for (left, right) in caps.protect_pairs {
        let lhs = references(props, left)?;
        let rhs = references(props, right)?;
        for l in &lhs {
            for r in &rhs {
                out.guards.push(GuardRelation {
                    guard: NodeRef::Id(l.clone()),
                    from: None,
                    to: Some(NodeRef::Id(r.clone())),
                });
            }
        }
    }
    for path in caps.egress_protected_by {
        for r in references(props, path)? {
            out.guards.push(GuardRelation {
                guard: NodeRef::Id(r),
                from: Some(NodeRef::Node(ctx)),
                to: None,
            });
        }
    }
    for path in caps.protects_egress_of {
        for r in references(props, path)? {
            out.guards.push(GuardRelation {
                guard: NodeRef::Node(ctx),
                from: Some(NodeRef::Id(r)),
                to: None,
            });
        }
    }

    for path in caps.contains {
        for r in references(props, path)? {
            out.containment.push(Containment {
                container: NodeRef::Node(ctx),
                content: NodeRef::Id(r),
            });
        }
    }
    for path in caps.contained_in {
        for r in references(props, path)? {
            out.containment.push(Containment {
                container: NodeRef::Id(r),
                content: NodeRef::Node(ctx),
            });
        }
    }

    // Rollout ordering is mined from the whole entry, not the descriptor:
    // DependsOn and plain references both order the rollout, and only the
    // target side carries ordering constraints.
    if an.origin == Origin::Target {
        for d in find_deps(&an.config)? {
            out.deps.push(Relation {
                from: NodeRef::Node(ctx),
                to: NodeRef::Id(d),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_and_untyped_resources_are_dropped() {
        let template = Template::from_value(
            json!({
                "Resources": {
                    "Good": { "Type": "AWS::S3::Bucket", "Properties": {} },
                    "Ignored": { "Type": "AWS::SQS::Queue", "Properties": {} },
                    "Unknown": { "Type": "AWS::No::Such", "Properties": {} },
                    "Untyped": { "Properties": {} },
                }
            }),
            Origin::Initial,
        );
        assert_eq!(template.nodes.len(), 1);
        assert_eq!(template.nodes[0].id, "Good");
    }

    #[test]
    fn missing_resources_section_is_empty_not_fatal() {
        let template = Template::from_value(json!({ "Outputs": {} }), Origin::Initial);
        assert!(template.nodes.is_empty());
    }

    #[test]
    fn lowercase_wrapper_is_accepted() {
        let template = Template::from_value(
            json!({ "resources": { "B": { "Type": "AWS::S3::Bucket", "Properties": {} } } }),
            Origin::Target,
        );
        assert_eq!(template.nodes.len(), 1);
        assert_eq!(template.nodes[0].origin, Origin::Target);
    }

    #[test]
    fn extraction_mines_protection_and_dependencies() {
        let template = Template::from_value(
            json!({
                "Resources": {
                    "Fn": {
                        "Type": "AWS::Lambda::Function",
                        "DependsOn": "Role",
                        "Properties": { "Role": { "Ref": "Role" } },
                    },
                    "Role": { "Type": "AWS::IAM::Role", "Properties": {} },
                }
            }),
            Origin::Target,
        );
        let (nodes, relations) = extract(&template.nodes).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().any(|n| n.is_guard() && n.id == "Role"));
        assert_eq!(relations.guards.len(), 1);
        // DependsOn and the Ref each name Role; both are mined.
        assert_eq!(relations.deps.len(), 2);
    }

    #[test]
    fn initial_side_nodes_carry_no_ordering() {
        let template = Template::from_value(
            json!({
                "Resources": {
                    "Fn": {
                        "Type": "AWS::Lambda::Function",
                        "DependsOn": "Other",
                        "Properties": {},
                    },
                }
            }),
            Origin::Initial,
        );
        let (_, relations) = extract(&template.nodes).unwrap();
        assert!(relations.deps.is_empty());
    }
}
