use serde_json::Value;

use crate::parse::operation::{Method, OperationObject};
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::schema::Schema;
use crate::parse::spec::SpecDocument;

/// Preferred media type when an OpenAPI 3 operation declares several.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Where an operation's request body comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BodySource {
    None,
    /// OpenAPI 3 `requestBody.content` entry.
    MediaType {
        media_type: String,
        /// Explicit example, else `examples.default.value`; null and `""`
        /// count as absent.
        example: Option<Value>,
        schema: Schema,
    },
    /// Swagger 2 `in: body` parameter.
    Parameter { schema: Schema },
}

impl BodySource {
    /// Content-Type this body is sent with, if there is a body.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            BodySource::None => None,
            BodySource::MediaType { media_type, .. } => Some(media_type),
            BodySource::Parameter { .. } => Some(JSON_MEDIA_TYPE),
        }
    }
}

/// A single (path, method) pair with its merged parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: Method,
    /// Path template as declared, placeholders intact.
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    /// Path-level parameters followed by the operation's own.
    pub parameters: Vec<Parameter>,
    pub body: BodySource,
}

impl Operation {
    /// First merged parameter with this name and location.
    pub fn find_parameter(&self, name: &str, location: &ParameterLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && &p.location == location)
    }

    /// Merged parameters at a location, in merge order.
    pub fn parameters_in<'a>(
        &'a self,
        location: &'a ParameterLocation,
    ) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameters.iter().filter(move |p| &p.location == location)
    }
}

/// Flatten a document into operations, in path then method document order.
pub fn extract_operations(spec: &SpecDocument) -> Vec<Operation> {
    let is_v3 = matches!(spec, SpecDocument::OpenApiV3(_));
    let mut operations = Vec::new();
    for (path, item) in spec.paths() {
        for (method, op) in &item.operations {
            let parameters: Vec<Parameter> = item
                .parameters
                .iter()
                .chain(&op.parameters)
                .cloned()
                .collect();
            let body = if is_v3 {
                media_type_body(op)
            } else {
                parameter_body(&parameters)
            };
            operations.push(Operation {
                method: *method,
                path: path.clone(),
                operation_id: op.operation_id.clone(),
                summary: op.summary.clone(),
                parameters,
                body,
            });
        }
    }
    log::debug!("extracted {} operation(s)", operations.len());
    operations
}

fn media_type_body(op: &OperationObject) -> BodySource {
    let chosen = op
        .request_body
        .content
        .get_key_value(JSON_MEDIA_TYPE)
        .or_else(|| op.request_body.content.first());
    let Some((media_type, entry)) = chosen else {
        return BodySource::None;
    };
    BodySource::MediaType {
        media_type: media_type.clone(),
        example: [&entry.example, &entry.default_example]
            .into_iter()
            .flatten()
            .find(|v| !is_empty_value(v))
            .cloned(),
        schema: entry.schema.clone().unwrap_or_default(),
    }
}

fn parameter_body(parameters: &[Parameter]) -> BodySource {
    parameters
        .iter()
        .find(|p| p.location == ParameterLocation::Body)
        .map_or(BodySource::None, |p| BodySource::Parameter {
            schema: p.body_schema(),
        })
}

fn is_empty_value(value: &Value) -> bool {
    matches!(value, Value::Null) || value.as_str() == Some("")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parse::schema::SchemaKind;

    fn extract(value: Value) -> Vec<Operation> {
        extract_operations(&SpecDocument::from_value(&value).unwrap())
    }

    #[test]
    fn test_document_order_and_shared_parameters_first() {
        let ops = extract(json!({
            "openapi": "3.0.0",
            "paths": {
                "/users/{id}": {
                    "parameters": [{"name": "id", "in": "path", "schema": {"type": "integer"}}],
                    "summary": "not an operation",
                    "delete": {"parameters": [{"name": "hard", "in": "query"}]},
                    "GET": {"operationId": "getUser"},
                    "trace": {}
                },
                "/broken": "nope",
                "/health": {"get": {}}
            }
        }));
        let keys: Vec<_> = ops.iter().map(|o| (o.method, o.path.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (Method::Delete, "/users/{id}"),
                (Method::Get, "/users/{id}"),
                (Method::Get, "/health"),
            ]
        );
        let names: Vec<_> = ops[0].parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "hard"]);
        assert_eq!(ops[1].operation_id.as_deref(), Some("getUser"));
        assert_eq!(ops[1].body, BodySource::None);
    }

    #[test]
    fn test_first_match_wins() {
        let ops = extract(json!({
            "openapi": "3.0.0",
            "paths": {"/a/{id}": {
                "parameters": [{"name": "id", "in": "path", "example": "shared"}],
                "get": {"parameters": [{"name": "id", "in": "path", "example": "own"}]}
            }}
        }));
        let found = ops[0].find_parameter("id", &ParameterLocation::Path).unwrap();
        assert_eq!(found.example, Some(json!("shared")));
        assert!(ops[0].find_parameter("id", &ParameterLocation::Query).is_none());
    }

    #[test]
    fn test_v3_prefers_json_media_type() {
        let ops = extract(json!({
            "openapi": "3.0.0",
            "paths": {"/pets": {"post": {"requestBody": {"content": {
                "application/xml": {"example": "<pet/>"},
                "application/json": {
                    "example": "",
                    "examples": {"default": {"value": {"name": "rex"}}},
                    "schema": {"type": "object"}
                }
            }}}}}
        }));
        match &ops[0].body {
            BodySource::MediaType {
                media_type,
                example,
                schema,
            } => {
                assert_eq!(media_type, "application/json");
                assert_eq!(example, &Some(json!({"name": "rex"})));
                assert!(matches!(schema.kind, SchemaKind::Object { .. }));
            }
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(ops[0].body.content_type(), Some("application/json"));
    }

    #[test]
    fn test_v3_falls_back_to_first_media_type() {
        let ops = extract(json!({
            "openapi": "3.0.0",
            "paths": {"/upload": {"put": {"requestBody": {"content": {
                "text/plain": {},
                "application/octet-stream": {}
            }}}}}
        }));
        assert_eq!(ops[0].body.content_type(), Some("text/plain"));
        match &ops[0].body {
            BodySource::MediaType { example, schema, .. } => {
                assert_eq!(example, &None);
                assert_eq!(schema, &Schema::default());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_v2_body_parameter() {
        let ops = extract(json!({
            "swagger": "2.0",
            "paths": {"/pets": {
                "parameters": [{"name": "pet", "in": "body", "schema": {"type": "array", "items": {"type": "string"}}}],
                "post": {"parameters": [{"name": "other", "in": "body"}]},
                "get": {"requestBody": {"content": {"application/json": {}}}}
            }}
        }));
        assert!(matches!(
            &ops[0].body,
            BodySource::Parameter { schema } if matches!(schema.kind, SchemaKind::Array { .. })
        ));
        assert_eq!(ops[0].body.content_type(), Some("application/json"));
        // Swagger 2 ignores requestBody; the shared body parameter still applies.
        assert!(matches!(&ops[1].body, BodySource::Parameter { .. }));
    }

    #[test]
    fn test_v2_without_body_parameter() {
        let ops = extract(json!({
            "swagger": "2.0",
            "paths": {"/pets": {"get": {"parameters": [{"name": "limit", "in": "query", "type": "integer"}]}}}
        }));
        assert_eq!(ops[0].body, BodySource::None);
        assert_eq!(ops[0].parameters_in(&ParameterLocation::Query).count(), 1);
    }
}
