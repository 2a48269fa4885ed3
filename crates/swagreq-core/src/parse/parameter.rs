use serde::Deserialize;
use serde_json::Value;

use super::lenient;
use super::schema::Schema;

/// Parameter location (`in`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Swagger 2 request body.
    Body,
    /// Swagger 2 form field.
    FormData,
    Other(String),
}

impl From<String> for ParameterLocation {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            "body" => ParameterLocation::Body,
            "formData" => ParameterLocation::FormData,
            _ => ParameterLocation::Other(raw),
        }
    }
}

impl ParameterLocation {
    pub fn as_str(&self) -> &str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
            ParameterLocation::Other(raw) => raw,
        }
    }
}

/// An API parameter, from either spec generation. Entries without a string
/// `name` and `in` (including unresolved `$ref` entries) fail to read and are
/// dropped from their list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    /// Swagger 2 puts `type` on the parameter itself.
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub param_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::truthy")]
    pub schema: Option<Schema>,

    #[serde(default, deserialize_with = "lenient::present")]
    pub example: Option<Value>,

    #[serde(rename = "default", default, deserialize_with = "lenient::present")]
    pub default_value: Option<Value>,
}

impl Parameter {
    /// The declared type word: the parameter's own `type` when set, else the
    /// schema's.
    pub fn declared_type(&self) -> Option<&str> {
        match self.param_type.as_deref() {
            Some(t) if !t.is_empty() => Some(t),
            _ => self.schema.as_ref().and_then(Schema::type_name),
        }
    }

    /// The body schema of a Swagger 2 body parameter, `{}` when absent or empty.
    pub fn body_schema(&self) -> Schema {
        self.schema.clone().unwrap_or_default()
    }
}
