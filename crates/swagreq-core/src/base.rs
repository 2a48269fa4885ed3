//! Base URL resolution from an override or spec metadata.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::assemble::target::{Target, has_http_scheme, join_url};
use crate::parse::spec::{OpenApiV3Spec, Server, ServerVariable, SpecDocument, SwaggerV2Spec};
use crate::sample::value_text;

/// `{name}` placeholders in server URLs and path templates.
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("valid regex"));

/// The base URL requests are joined onto: a non-empty override wins, else
/// (when `use_servers`) the spec's own metadata, else `None`.
pub fn resolve_base(
    spec: &SpecDocument,
    base_override: Option<&str>,
    use_servers: bool,
) -> Option<String> {
    if let Some(base) = base_override.map(str::trim).filter(|b| !b.is_empty()) {
        return Some(base.to_string());
    }
    if !use_servers {
        return None;
    }
    Some(match spec {
        SpecDocument::OpenApiV3(spec) => server_base(spec),
        SpecDocument::SwaggerV2(spec) => swagger_base(spec),
    })
}

/// Every base the document declares, in order and without duplicates: each
/// server expanded over its variables' `enum` values, or each Swagger 2
/// scheme. A non-empty override is the only base.
pub fn resolve_bases(
    spec: &SpecDocument,
    base_override: Option<&str>,
    use_servers: bool,
) -> Vec<String> {
    if let Some(base) = base_override.map(str::trim).filter(|b| !b.is_empty()) {
        return vec![base.to_string()];
    }
    if !use_servers {
        return Vec::new();
    }
    dedup(match spec {
        SpecDocument::OpenApiV3(spec) => server_bases(spec),
        SpecDocument::SwaggerV2(spec) => swagger_bases(spec),
    })
}

/// Drop repeated bases, keeping the first occurrence.
pub(crate) fn dedup(bases: Vec<String>) -> Vec<String> {
    bases
        .into_iter()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// `servers[0].url` with `{var}` placeholders filled from the server's
/// variables. A variable with neither default nor example stays literal.
pub fn server_base(spec: &OpenApiV3Spec) -> String {
    let Some(server) = spec.servers.first() else {
        return "/".to_string();
    };
    let url = server_url(server);
    PLACEHOLDER
        .replace_all(url, |caps: &Captures<'_>| {
            server
                .variables
                .get(&caps[1])
                .and_then(variable_value)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Every server, each variable taking every `enum` value in turn (else its
/// default or example). `/` when there are no servers.
pub fn server_bases(spec: &OpenApiV3Spec) -> Vec<String> {
    if spec.servers.is_empty() {
        return vec!["/".to_string()];
    }
    spec.servers.iter().flat_map(expand_server).collect()
}

fn expand_server(server: &Server) -> Vec<String> {
    let mut seeds = vec![server_url(server).to_string()];
    for (name, var) in &server.variables {
        let choices = variable_choices(var);
        if choices.is_empty() {
            continue;
        }
        let token = format!("{{{name}}}");
        seeds = seeds
            .iter()
            .flat_map(|seed| choices.iter().map(|choice| seed.replace(&token, choice)))
            .collect();
    }
    seeds
}

fn server_url(server: &Server) -> &str {
    server
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or("/")
}

fn variable_choices(var: &ServerVariable) -> Vec<String> {
    let listed: Vec<String> = var
        .enum_values
        .iter()
        .filter(|v| !is_blank(v))
        .map(value_text)
        .collect();
    if listed.is_empty() {
        variable_value(var).into_iter().collect()
    } else {
        listed
    }
}

fn variable_value(var: &ServerVariable) -> Option<String> {
    [&var.default_value, &var.example]
        .into_iter()
        .flatten()
        .find(|v| !is_blank(v))
        .map(value_text)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `scheme://host` + `basePath` for a Swagger 2 document.
pub fn swagger_base(spec: &SwaggerV2Spec) -> String {
    let scheme = spec
        .schemes
        .first()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("https");
    compose_swagger(scheme, spec)
}

/// One base per declared scheme, `https` when none is.
pub fn swagger_bases(spec: &SwaggerV2Spec) -> Vec<String> {
    let schemes: Vec<&str> = spec
        .schemes
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if schemes.is_empty() {
        return vec![compose_swagger("https", spec)];
    }
    schemes
        .into_iter()
        .map(|scheme| compose_swagger(scheme, spec))
        .collect()
}

fn compose_swagger(scheme: &str, spec: &SwaggerV2Spec) -> String {
    let host = spec.host.as_deref().unwrap_or("");
    let base_path = match spec.base_path.as_deref() {
        None | Some("") => "/".to_string(),
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) => format!("/{p}"),
    };
    format!("{scheme}://{host}{base_path}")
}

/// Join a relative base onto the origin of the URL the spec was fetched
/// from. A base with a scheme but no host (`https:///v2`, a Swagger 2
/// document without `host`) keeps its path and takes the source's origin.
/// Absolute bases, and sources that are not URLs, pass through.
pub fn anchor_to_origin(base: &str, source_url: &str) -> String {
    let Some(source) = Target::parse(source_url) else {
        return base.to_string();
    };
    if let Some(path) = hostless_path(base) {
        return join_url(&source.origin(), path);
    }
    if has_http_scheme(base) {
        return base.to_string();
    }
    join_url(&source.origin(), base)
}

fn hostless_path(base: &str) -> Option<&str> {
    base.strip_prefix("http://")
        .or_else(|| base.strip_prefix("https://"))
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
}
