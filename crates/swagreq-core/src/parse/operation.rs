use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::lenient;
use super::media_type::RequestBody;
use super::parameter::Parameter;

/// HTTP method of an operation. `trace` and extension keys are not operations
/// for request synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Match a path-item key, case-insensitively.
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "head" => Some(Method::Head),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "patch" => Some(Method::Patch),
            "delete" => Some(Method::Delete),
            "options" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation object under a path item.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OperationObject {
    #[serde(rename = "operationId", deserialize_with = "lenient::string")]
    pub operation_id: Option<String>,

    #[serde(deserialize_with = "lenient::string")]
    pub summary: Option<String>,

    #[serde(deserialize_with = "lenient::entries")]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody", deserialize_with = "lenient::object")]
    pub request_body: RequestBody,
}

/// A path item: shared parameters plus its operations in document order.
///
/// Keys that are not recognised methods (`summary`, `servers`, `x-*`) are
/// skipped, as are method keys whose value is not a mapping.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "PathItemFields")]
pub struct PathItem {
    pub parameters: Vec<Parameter>,

    pub operations: Vec<(Method, OperationObject)>,
}

#[derive(Deserialize)]
struct PathItemFields {
    #[serde(default, deserialize_with = "lenient::entries")]
    parameters: Vec<Parameter>,

    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

impl From<PathItemFields> for PathItem {
    fn from(fields: PathItemFields) -> Self {
        let mut operations = Vec::new();
        for (key, node) in fields.rest {
            let Some(method) = Method::parse(&key) else {
                continue;
            };
            match node.is_object().then(|| OperationObject::deserialize(node)) {
                Some(Ok(op)) => operations.push((method, op)),
                _ => log::debug!("ignoring non-mapping operation under key {key}"),
            }
        }
        PathItem {
            parameters: fields.parameters,
            operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_item(node: Value) -> PathItem {
        serde_json::from_value(node).unwrap()
    }

    #[test]
    fn test_method_keys_are_case_insensitive() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("trace"), None);
        assert_eq!(Method::parse("parameters"), None);
    }

    #[test]
    fn test_path_item_keeps_method_order() {
        let item = path_item(json!({
            "parameters": [{"name": "id", "in": "path"}],
            "delete": {},
            "Get": {"operationId": "getThing", "summary": 7},
            "put": "not an operation",
            "x-internal": {"get": {}}
        }));
        let methods: Vec<_> = item.operations.iter().map(|(m, _)| *m).collect();
        assert_eq!(methods, vec![Method::Delete, Method::Get]);
        assert_eq!(item.parameters.len(), 1);
        let get = &item.operations[1].1;
        assert_eq!(get.operation_id.as_deref(), Some("getThing"));
        assert_eq!(get.summary, None);
    }

    #[test]
    fn test_request_body_content_is_read() {
        let op: OperationObject = serde_json::from_value(json!({
            "requestBody": {"content": {"application/json": {"schema": {"type": "object"}}}}
        }))
        .unwrap();
        assert!(op.request_body.content.contains_key("application/json"));

        let op: OperationObject = serde_json::from_value(json!({"requestBody": "nope"})).unwrap();
        assert!(op.request_body.content.is_empty());
    }
}
