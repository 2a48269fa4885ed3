//! Operation to raw HTTP request assembly.

pub mod request;
pub mod target;

use regex::Captures;
use serde_json::Value;

use crate::base::{PLACEHOLDER, anchor_to_origin, dedup, resolve_base, resolve_bases, server_base};
use crate::config::ImportConfig;
use crate::error::AssembleError;
use crate::extract::{BodySource, Operation};
use crate::headers::{parse_custom_headers, request_headers};
use crate::parse::parameter::ParameterLocation;
use crate::parse::spec::SpecDocument;
use crate::sample::{sample_body, sample_param, value_text};
use request::{PreparedRequest, RequestParts};
use target::{Target, default_port, join_url};

/// Substitute used for a path placeholder with no usable parameter.
const DEFAULT_PATH_VALUE: &str = "123";

/// Builds [`PreparedRequest`]s for the operations of one document.
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    fill_path: bool,
    include_query: bool,
    use_https: bool,
    anchor_relative: bool,
    token: Option<String>,
    custom_headers: Vec<(String, String)>,
    /// The override, when one was configured.
    base_override: Option<String>,
    /// One entry, or every declared base with `expand_servers`.
    bases: Vec<String>,
    /// OpenAPI 3 server base, consulted when `bases` is empty.
    server_fallback: Option<String>,
}

impl RequestAssembler {
    pub fn new(config: &ImportConfig, spec: &SpecDocument) -> Self {
        let base_override = config.base_override().map(str::to_string);
        let bases: Vec<String> = if config.expand_servers {
            resolve_bases(spec, base_override.as_deref(), config.use_spec_servers)
        } else {
            resolve_base(spec, base_override.as_deref(), config.use_spec_servers)
                .into_iter()
                .collect()
        };
        let server_fallback = match spec {
            SpecDocument::OpenApiV3(v3) if bases.is_empty() => Some(server_base(v3)),
            _ => None,
        };
        if bases.is_empty() {
            log::debug!("base URL: <none>");
        } else {
            log::debug!("base URL: {}", bases.join(", "));
        }
        Self {
            fill_path: config.fill_path_parameters,
            include_query: config.include_query_parameters,
            use_https: config.use_https,
            anchor_relative: config.anchor_relative_servers,
            token: config.token.clone(),
            custom_headers: parse_custom_headers(&config.headers),
            base_override,
            bases,
            server_fallback,
        }
    }

    /// Anchor spec-derived relative bases onto the origin of `source_url`
    /// when `anchor_relative_servers` is set. An override is never anchored.
    pub fn anchored_at(mut self, source_url: &str) -> Self {
        if !self.anchor_relative || self.base_override.is_some() {
            return self;
        }
        self.bases = dedup(
            self.bases
                .iter()
                .map(|b| anchor_to_origin(b, source_url))
                .collect(),
        );
        self.server_fallback = self
            .server_fallback
            .map(|b| anchor_to_origin(&b, source_url));
        self
    }

    /// The first resolved base URL, if any.
    pub fn base(&self) -> Option<&str> {
        self.bases.first().map(String::as_str)
    }

    /// Every resolved base URL, in order.
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// The request for `op` against the first base.
    pub fn assemble(&self, op: &Operation) -> Result<PreparedRequest, AssembleError> {
        self.assemble_at(op, self.base().or(self.server_fallback.as_deref()))
    }

    /// One request for `op` per resolved base, in base order.
    pub fn assemble_each(&self, op: &Operation) -> Vec<Result<PreparedRequest, AssembleError>> {
        if self.bases.is_empty() {
            return vec![self.assemble(op)];
        }
        self.bases
            .iter()
            .map(|base| self.assemble_at(op, Some(base)))
            .collect()
    }

    fn assemble_at(
        &self,
        op: &Operation,
        base: Option<&str>,
    ) -> Result<PreparedRequest, AssembleError> {
        let final_path = if self.fill_path {
            fill_path(op)
        } else {
            op.path.clone()
        };
        let query = if self.include_query {
            build_query(op)
        } else {
            String::new()
        };

        let body = match &op.body {
            BodySource::None => None,
            BodySource::MediaType {
                example: Some(example),
                ..
            } => Some(example.clone()),
            BodySource::MediaType { schema, .. } | BodySource::Parameter { schema } => {
                Some(sample_body(schema))
            }
        };
        let headers = request_headers(
            op.body.content_type(),
            self.token.as_deref(),
            &self.custom_headers,
        );

        let full_url = match base {
            Some(base) => join_url(base, &final_path),
            None => final_path.clone(),
        };
        let Some(target) = Target::parse(&full_url) else {
            return Err(match &self.base_override {
                Some(base) => AssembleError::RelativeOverride {
                    method: op.method,
                    path: final_path,
                    base: base.clone(),
                },
                None => AssembleError::UnresolvedHost {
                    method: op.method,
                    path: final_path,
                },
            });
        };

        let secure = self.use_https;
        let port = target.port.unwrap_or_else(|| default_port(secure));
        let merged_query = match (target.query.is_empty(), query.is_empty()) {
            (false, false) => format!("{}&{}", target.query, query),
            (false, true) => target.query.clone(),
            (true, _) => query,
        };
        let path_with_query = if merged_query.is_empty() {
            target.path.clone()
        } else {
            format!("{}?{}", target.path, merged_query)
        };

        Ok(PreparedRequest::build(RequestParts {
            method: op.method,
            path_with_query,
            headers,
            body,
            host: target.host,
            port,
            secure,
            final_path,
        }))
    }
}

/// Replace every `{name}` in the template with the sample of the first
/// matching path parameter.
fn fill_path(op: &Operation) -> String {
    PLACEHOLDER
        .replace_all(&op.path, |caps: &Captures<'_>| {
            op.find_parameter(&caps[1], &ParameterLocation::Path)
                .map(sample_param)
                .filter(|v| !v.is_null())
                .map_or_else(|| DEFAULT_PATH_VALUE.to_string(), |v| value_text(&v))
        })
        .into_owned()
}

/// `name=value` pairs for every query parameter, percent-encoded and joined
/// with `&`, without the leading `?`.
fn build_query(op: &Operation) -> String {
    op.parameters_in(&ParameterLocation::Query)
        .map(|p| {
            let value: Value = sample_param(p);
            format!(
                "{}={}",
                urlencoding::encode(&p.name),
                urlencoding::encode(&value_text(&value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
