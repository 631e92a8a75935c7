//! Reference and dependency harvesting from resource configurations.
//!
//! Configurations are `serde_json::Value` trees. A reference to another
//! resource takes one of the forms `{"Ref": id}`, `{"!Ref": id}`,
//! `{"Fn::GetAtt": "<id>.Arn"}` or `{"Fn::GetAtt": [id, ...]}`. Rollout
//! ordering comes from `Ref`/`!Ref` plus resource-level `DependsOn`
//! entries. Lists flatten uniformly at every level.

use serde_json::Value;

use super::TemplateError;

/// Follow a key path into a configuration fragment and collect the
/// resource references at the end of it.
///
/// Descending stops silently at a missing key; a list at any point
/// applies the rest of the path to each element. An exhausted path
/// harvests a string leaf as-is and scans anything else for embedded
/// reference forms.
pub fn references(value: &Value, path: &[&str]) -> Result<Vec<String>, TemplateError> {
    if path.is_empty() {
        return match value {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(references(item, path)?);
                }
                Ok(out)
            }
            other => find_refs(other),
        };
    }
    match value {
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(references(item, path)?);
            }
            Ok(out)
        }
        Value::Object(map) => match map.get(path[0]) {
            Some(inner) => references(inner, &path[1..]),
            None => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

/// Scan a configuration fragment for embedded references to other
/// resources.
pub fn find_refs(value: &Value) -> Result<Vec<String>, TemplateError> {
    match value {
        Value::Object(map) => {
            let mut refs = Vec::new();
            for (key, inner) in map {
                if key == "Ref" || key == "!Ref" {
                    let target = inner.as_str().ok_or_else(|| TemplateError::ExpectedString {
                        value: inner.clone(),
                    })?;
                    refs.push(target.to_string());
                } else if key == "Fn::GetAtt" {
                    refs.push(get_att_target(inner)?);
                } else {
                    refs.extend(find_refs(inner)?);
                }
            }
            Ok(refs)
        }
        Value::Array(items) => {
            let mut refs = Vec::new();
            for item in items {
                refs.extend(find_refs(item)?);
            }
            Ok(refs)
        }
        Value::String(_) | Value::Bool(_) | Value::Number(_) => Ok(Vec::new()),
        Value::Null => Err(TemplateError::UnexpectedNull),
    }
}

fn get_att_target(value: &Value) -> Result<String, TemplateError> {
    match value {
        Value::String(s) => {
            let parts: Vec<&str> = s.split('.').collect();
            if parts.len() != 2 || parts[1] != "Arn" {
                return Err(TemplateError::MalformedGetAtt {
                    value: value.clone(),
                });
            }
            Ok(parts[0].to_string())
        }
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(TemplateError::MalformedGetAtt {
                value: value.clone(),
            }),
        },
        _ => Err(TemplateError::MalformedGetAtt {
            value: value.clone(),
        }),
    }
}

/// Scan a whole resource entry for rollout-ordering targets: `DependsOn`
/// values plus every plain reference.
pub fn find_deps(value: &Value) -> Result<Vec<String>, TemplateError> {
    match value {
        Value::Object(map) => {
            let mut deps = Vec::new();
            for (key, inner) in map {
                if key == "Ref" || key == "!Ref" {
                    let target = inner.as_str().ok_or_else(|| TemplateError::ExpectedString {
                        value: inner.clone(),
                    })?;
                    deps.push(target.to_string());
                } else if key == "DependsOn" {
                    match inner {
                        Value::String(s) => deps.push(s.clone()),
                        Value::Array(items) => {
                            for item in items {
                                let s = item.as_str().ok_or_else(|| {
                                    TemplateError::MalformedDependsOn { value: item.clone() }
                                })?;
                                deps.push(s.to_string());
                            }
                        }
                        other => {
                            return Err(TemplateError::MalformedDependsOn {
                                value: other.clone(),
                            });
                        }
                    }
                } else {
                    deps.extend(find_deps(inner)?);
                }
            }
            Ok(deps)
        }
        Value::Array(items) => {
            let mut deps = Vec::new();
            for item in items {
                deps.extend(find_deps(item)?);
            }
            Ok(deps)
        }
        Value::String(_) | Value::Bool(_) | Value::Number(_) => Ok(Vec::new()),
        Value::Null => Err(TemplateError::UnexpectedNull),
    }
}
