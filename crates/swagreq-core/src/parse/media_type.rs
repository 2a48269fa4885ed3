use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::lenient;
use super::schema::Schema;

/// A `requestBody.content` entry.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MediaType {
    #[serde(deserialize_with = "lenient::present")]
    pub example: Option<Value>,

    /// `examples.default.value`, the only named example that is consulted.
    #[serde(rename = "examples", deserialize_with = "default_example")]
    pub default_example: Option<Value>,

    #[serde(deserialize_with = "lenient::truthy")]
    pub schema: Option<Schema>,
}

/// An OpenAPI 3 request body. A `$ref` body has no `content` and reads as
/// empty.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    /// Media types in declaration order. Entries that are not mappings are
    /// dropped.
    #[serde(deserialize_with = "lenient::mappings")]
    pub content: IndexMap<String, MediaType>,
}

fn default_example<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    let examples = Value::deserialize(d)?;
    Ok(examples
        .get("default")
        .and_then(|d| d.get("value"))
        .cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(node: Value) -> RequestBody {
        serde_json::from_value(node).unwrap()
    }

    #[test]
    fn test_content_keeps_declaration_order() {
        let body = body(json!({
            "content": {
                "application/xml": {},
                "text/plain": "not a media type",
                "application/json": {"examples": {"default": {"value": {"id": 1}}}}
            }
        }));
        let keys: Vec<_> = body.content.keys().cloned().collect();
        assert_eq!(keys, vec!["application/xml", "application/json"]);
        assert_eq!(
            body.content["application/json"].default_example,
            Some(json!({"id": 1}))
        );
    }

    #[test]
    fn test_ref_request_body_has_no_content() {
        assert!(body(json!({"$ref": "#/components/requestBodies/Pet"})).content.is_empty());
    }

    #[test]
    fn test_named_examples_other_than_default_are_ignored() {
        let media: MediaType =
            serde_json::from_value(json!({"examples": {"cat": {"value": 1}}, "schema": {}})).unwrap();
        assert_eq!(media.default_example, None);
        assert_eq!(media.schema, None);
    }
}
