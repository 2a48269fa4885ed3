use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::lenient;

/// The shape a schema fragment declares through its `type` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// `type: string`, or no `type` at all.
    String { format: Option<String> },
    Integer,
    Number,
    Boolean,
    Array {
        items: Box<Schema>,
    },
    Object {
        properties: IndexMap<String, Schema>,
        required: Vec<String>,
    },
    /// Any other `type` value (including 3.1 type arrays), or a fragment
    /// that is not a mapping at all.
    Other,
}

impl Default for SchemaKind {
    fn default() -> Self {
        SchemaKind::String { format: None }
    }
}

/// A schema fragment, reduced to what sample generation needs.
///
/// Any node deserializes: mappings are read keyword by keyword, everything
/// else reads as [`SchemaKind::Other`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Value")]
pub struct Schema {
    pub kind: SchemaKind,

    /// Present whenever the fragment has an `example` key, even one set to `null`.
    pub example: Option<Value>,

    pub default_value: Option<Value>,
}

/// The keywords of a schema mapping that sampling looks at.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SchemaFragment {
    #[serde(rename = "type")]
    schema_type: Option<Value>,

    #[serde(deserialize_with = "lenient::string")]
    format: Option<String>,

    #[serde(deserialize_with = "lenient::truthy")]
    items: Option<Schema>,

    #[serde(deserialize_with = "lenient::map")]
    properties: IndexMap<String, Schema>,

    #[serde(deserialize_with = "lenient::strings")]
    required: Vec<String>,

    #[serde(deserialize_with = "lenient::present")]
    example: Option<Value>,

    #[serde(rename = "default", deserialize_with = "lenient::present")]
    default_value: Option<Value>,
}

impl TryFrom<Value> for Schema {
    type Error = serde_json::Error;

    fn try_from(node: Value) -> Result<Self, Self::Error> {
        if !node.is_object() {
            return Ok(Schema {
                kind: SchemaKind::Other,
                ..Schema::default()
            });
        }
        SchemaFragment::deserialize(node).map(Schema::from_fragment)
    }
}

impl Schema {
    fn from_fragment(fragment: SchemaFragment) -> Self {
        let kind = match fragment.schema_type {
            None | Some(Value::Null) => SchemaKind::String {
                format: fragment.format,
            },
            Some(Value::String(t)) => match t.as_str() {
                "string" => SchemaKind::String {
                    format: fragment.format,
                },
                "integer" => SchemaKind::Integer,
                "number" => SchemaKind::Number,
                "boolean" => SchemaKind::Boolean,
                "array" => SchemaKind::Array {
                    items: Box::new(fragment.items.unwrap_or_default()),
                },
                "object" => SchemaKind::Object {
                    properties: fragment.properties,
                    required: fragment.required,
                },
                _ => SchemaKind::Other,
            },
            Some(_) => SchemaKind::Other,
        };
        Schema {
            kind,
            example: fragment.example,
            default_value: fragment.default_value,
        }
    }

    /// The `type` word this schema declares, if it maps to one.
    pub fn type_name(&self) -> Option<&'static str> {
        match self.kind {
            SchemaKind::String { .. } => Some("string"),
            SchemaKind::Integer => Some("integer"),
            SchemaKind::Number => Some("number"),
            SchemaKind::Boolean => Some("boolean"),
            SchemaKind::Array { .. } => Some("array"),
            SchemaKind::Object { .. } => Some("object"),
            SchemaKind::Other => None,
        }
    }
}
