//! Field deserializers for loosely written documents.
//!
//! Every helper reads whatever node is present and degrades to an empty value
//! instead of failing, so one malformed field never rejects a whole document.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A string, else `None`.
pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A version string. `swagger: 2.0` unquoted in YAML is a number.
pub(crate) fn version<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// The string entries of an array.
pub(crate) fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Any value, `Some` even when the key holds `null`. Use with
/// `#[serde(default)]` so only a missing key reads as `None`.
pub(crate) fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// `T` when the node is set in the loose sense of [`is_truthy`].
pub(crate) fn truthy<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let node = Value::deserialize(d)?;
    if !is_truthy(&node) {
        return Ok(None);
    }
    Ok(T::deserialize(node).ok())
}

/// `T` from a mapping, else `T::default()`.
pub(crate) fn object<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let node = Value::deserialize(d)?;
    if !node.is_object() {
        return Ok(T::default());
    }
    Ok(T::deserialize(node).unwrap_or_default())
}

/// The mapping entries of an array that read as `T`, in order.
pub(crate) fn entries<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(d)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let parsed = item
                .is_object()
                .then(|| T::deserialize(&item).ok())
                .flatten();
            if parsed.is_none() {
                log::debug!("ignoring list entry {item}");
            }
            parsed
        })
        .collect())
}

/// Every entry of a mapping that reads as `T`, in order.
pub(crate) fn map<'de, D, T>(d: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Object(entries) = Value::deserialize(d)? else {
        return Ok(IndexMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, node)| T::deserialize(node).ok().map(|v| (key, v)))
        .collect())
}

/// The entries of a mapping whose values are themselves mappings reading as
/// `T`, in order. Other entries are dropped.
pub(crate) fn mappings<'de, D, T>(d: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Object(entries) = Value::deserialize(d)? else {
        return Ok(IndexMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, node)| {
            let parsed = node.is_object().then(|| T::deserialize(&node).ok()).flatten();
            if parsed.is_none() {
                log::debug!("ignoring non-mapping entry {key}");
            }
            parsed.map(|v| (key, v))
        })
        .collect())
}

/// Whether a node counts as "set" in the loose sense spec authors rely on:
/// `null`, `false`, `0`, `""`, `[]` and `{}` all count as absent.
pub(crate) fn is_truthy(node: &Value) -> bool {
    match node {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
