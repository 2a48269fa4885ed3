mod lenient;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod schema;
pub mod spec;

use serde_json::Value;

use crate::error::SyntaxError;

/// A YAML-capable decoder. YAML support is a pluggable collaborator so a
/// build (or a loader) can run without one.
pub trait YamlEngine: Send + Sync {
    fn parse(&self, input: &str) -> Result<Value, SyntaxError>;
}

/// YAML decoding through `serde_yaml_ng`.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeYamlEngine;

#[cfg(feature = "yaml")]
impl YamlEngine for SerdeYamlEngine {
    fn parse(&self, input: &str) -> Result<Value, SyntaxError> {
        let doc: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(input).map_err(|e| SyntaxError::Yaml(e.to_string()))?;
        Ok(yaml_to_json(doc))
    }
}

/// The engine compiled into this build, if any.
pub fn default_yaml_engine() -> Option<Box<dyn YamlEngine>> {
    #[cfg(feature = "yaml")]
    {
        Some(Box::new(SerdeYamlEngine))
    }
    #[cfg(not(feature = "yaml"))]
    {
        None
    }
}

/// Decode JSON text into a raw tree.
pub fn json_value(input: &str) -> Result<Value, SyntaxError> {
    Ok(serde_json::from_str(input)?)
}

/// Whether trimmed text starts and ends like a JSON object or array.
pub fn is_json_text(text: &str) -> bool {
    let t = text.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

/// Convert a YAML tree to the JSON data model. Non-string mapping keys
/// (`200:` response codes, `true:`) are stringified.
#[cfg(feature = "yaml")]
fn yaml_to_json(node: serde_yaml_ng::Value) -> Value {
    use serde_yaml_ng::Value as Yaml;

    match node {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(entries) => {
            let mut map = serde_json::Map::new();
            for (key, value) in entries {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

#[cfg(feature = "yaml")]
fn yaml_key(key: serde_yaml_ng::Value) -> String {
    match yaml_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
