//! Placeholder values for request bodies and parameters.
//!
//! Everything here is pure and deterministic: the same schema always yields
//! the same value, so two runs over one spec produce identical requests.

use serde_json::{Map, Value};

use crate::parse::parameter::Parameter;
use crate::parse::schema::{Schema, SchemaKind};

/// Deepest array/object nesting that is sampled; anything below becomes `null`.
pub const MAX_SAMPLE_DEPTH: usize = 32;

const SAMPLE_DATE_TIME: &str = "2025-01-01T00:00:00Z";
const SAMPLE_DATE: &str = "2025-01-01";
const SAMPLE_UUID: &str = "00000000-0000-0000-0000-000000000000";
const SAMPLE_STRING: &str = "string";

/// Build a representative value for a body schema.
pub fn sample_body(schema: &Schema) -> Value {
    sample_at(schema, 0)
}

fn sample_at(schema: &Schema, depth: usize) -> Value {
    if let Some(example) = &schema.example {
        return example.clone();
    }
    if let Some(default) = &schema.default_value {
        return default.clone();
    }
    match &schema.kind {
        SchemaKind::String { format } => Value::String(
            match format.as_deref() {
                Some("date-time") => SAMPLE_DATE_TIME,
                Some("date") => SAMPLE_DATE,
                Some("uuid") => SAMPLE_UUID,
                _ => SAMPLE_STRING,
            }
            .to_string(),
        ),
        SchemaKind::Integer | SchemaKind::Number => Value::from(0),
        SchemaKind::Boolean => Value::Bool(false),
        SchemaKind::Array { items } => {
            if depth >= MAX_SAMPLE_DEPTH {
                return Value::Null;
            }
            Value::Array(vec![sample_at(items, depth + 1)])
        }
        SchemaKind::Object {
            properties,
            required,
        } => {
            if depth >= MAX_SAMPLE_DEPTH {
                return Value::Null;
            }
            let mut obj = Map::new();
            for (name, sub) in properties {
                obj.insert(name.clone(), sample_at(sub, depth + 1));
            }
            for name in required {
                if !obj.contains_key(name) {
                    obj.insert(name.clone(), Value::String(SAMPLE_STRING.to_string()));
                }
            }
            Value::Object(obj)
        }
        SchemaKind::Other => Value::Null,
    }
}

/// Build a value for a path or query placeholder.
pub fn sample_param(param: &Parameter) -> Value {
    if let Some(example) = &param.example {
        return example.clone();
    }
    if let Some(default) = &param.default_value {
        return default.clone();
    }
    match param.declared_type() {
        Some("integer") | Some("number") => Value::from(123),
        Some("boolean") => Value::Bool(true),
        _ => Value::String(SAMPLE_STRING.to_string()),
    }
}

/// Render a sampled value as URL/header text: strings verbatim, everything
/// else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
