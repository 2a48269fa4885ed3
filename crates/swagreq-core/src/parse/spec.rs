use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::lenient;
use super::operation::PathItem;
use crate::error::{LoadError, SyntaxError};

/// A server variable for URL templates.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServerVariable {
    #[serde(rename = "default", deserialize_with = "lenient::present")]
    pub default_value: Option<Value>,

    #[serde(deserialize_with = "lenient::present")]
    pub example: Option<Value>,

    /// Allowed values; only consulted when server bases are expanded.
    #[serde(rename = "enum", deserialize_with = "values")]
    pub enum_values: Vec<Value>,
}

/// A server URL definition.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Server {
    #[serde(deserialize_with = "lenient::string")]
    pub url: Option<String>,

    #[serde(deserialize_with = "lenient::map")]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
struct Info {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
}

fn info_title<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let info: Info = lenient::object(d)?;
    Ok(info.title)
}

fn values<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// Top-level OpenAPI 3.x document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OpenApiV3Spec {
    #[serde(deserialize_with = "lenient::version")]
    pub openapi: Option<String>,

    #[serde(rename = "info", deserialize_with = "info_title")]
    pub title: Option<String>,

    #[serde(deserialize_with = "lenient::entries")]
    pub servers: Vec<Server>,

    #[serde(deserialize_with = "lenient::mappings")]
    pub paths: IndexMap<String, PathItem>,
}

/// Top-level Swagger 2.0 document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SwaggerV2Spec {
    #[serde(deserialize_with = "lenient::version")]
    pub swagger: Option<String>,

    #[serde(rename = "info", deserialize_with = "info_title")]
    pub title: Option<String>,

    #[serde(deserialize_with = "lenient::strings")]
    pub schemes: Vec<String>,

    #[serde(deserialize_with = "lenient::string")]
    pub host: Option<String>,

    #[serde(rename = "basePath", deserialize_with = "lenient::string")]
    pub base_path: Option<String>,

    #[serde(deserialize_with = "lenient::mappings")]
    pub paths: IndexMap<String, PathItem>,
}

/// A loaded API description, tagged by generation once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecDocument {
    OpenApiV3(OpenApiV3Spec),
    SwaggerV2(SwaggerV2Spec),
}

impl SpecDocument {
    /// Build a document from a decoded JSON/YAML tree. A root carrying a
    /// `swagger` key is Swagger 2; every other mapping is OpenAPI 3.
    pub fn from_value(root: &Value) -> Result<Self, LoadError> {
        let map = root.as_object().ok_or(LoadError::NotADocument)?;
        if map.contains_key("swagger") {
            let spec = SwaggerV2Spec::deserialize(root).map_err(SyntaxError::from)?;
            return Ok(SpecDocument::SwaggerV2(spec));
        }
        if !map.contains_key("openapi") {
            log::warn!("document has neither `openapi` nor `swagger`; reading it as OpenAPI 3");
        }
        let spec = OpenApiV3Spec::deserialize(root).map_err(SyntaxError::from)?;
        Ok(SpecDocument::OpenApiV3(spec))
    }

    pub fn paths(&self) -> &IndexMap<String, PathItem> {
        match self {
            SpecDocument::OpenApiV3(spec) => &spec.paths,
            SpecDocument::SwaggerV2(spec) => &spec.paths,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            SpecDocument::OpenApiV3(spec) => spec.title.as_deref(),
            SpecDocument::SwaggerV2(spec) => spec.title.as_deref(),
        }
    }

    /// Human-readable generation and version, e.g. `OpenAPI 3.0.3`.
    pub fn describe(&self) -> String {
        match self {
            SpecDocument::OpenApiV3(spec) => {
                format!("OpenAPI {}", spec.openapi.as_deref().unwrap_or("3.x"))
            }
            SpecDocument::SwaggerV2(spec) => {
                format!("Swagger {}", spec.swagger.as_deref().unwrap_or("2.0"))
            }
        }
    }
}
