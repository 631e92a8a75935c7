//! YAML template normalization.
//!
//! CloudFormation YAML uses short tag forms (`!Ref x`, `!GetAtt a.Arn`,
//! `!Sub "${...}"`, ...). Tagged values normalize into single-key
//! mappings `{"!Tag": content}` so the downstream reference scan sees one
//! shape regardless of input format. YAML nulls normalize to empty
//! arrays, which keeps absent bodies scannable as empty lists.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

use super::TemplateError;

/// Convert a parsed YAML document into the JSON value model.
pub fn normalize(value: Yaml) -> Result<Value, TemplateError> {
    match value {
        Yaml::Null => Ok(Value::Array(Vec::new())),
        Yaml::Bool(b) => Ok(Value::Bool(b)),
        Yaml::Number(n) => {
            let number = if let Some(i) = n.as_i64() {
                Number::from(i)
            } else if let Some(u) = n.as_u64() {
                Number::from(u)
            } else {
                Number::from_f64(n.as_f64().unwrap_or(f64::NAN)).ok_or_else(|| {
                    TemplateError::NonFiniteNumber {
                        found: n.to_string(),
                    }
                })?
            };
            Ok(Value::Number(number))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize(item)?);
            }
            Ok(Value::Array(out))
        }
        Yaml::Mapping(map) => {
            let mut out = Map::new();
            for (key, inner) in map {
                let key = match key {
                    Yaml::String(key) => key,
                    other => {
                        return Err(TemplateError::NonStringKey {
                            found: format!("{other:?}"),
                        });
                    }
                };
                out.insert(key, normalize(inner)?);
            }
            Ok(Value::Object(out))
        }
        Yaml::Tagged(tagged) => {
            let mut out = Map::new();
            out.insert(tagged.tag.to_string(), normalize(tagged.value)?);
            Ok(Value::Object(out))
        }
    }
}
