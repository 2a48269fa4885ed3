use serde_json::Value;

use super::target::format_host_port;
use crate::parse::operation::Method;

/// A fully resolved, dispatch-ready request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    method: Method,
    path_with_query: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    host: String,
    port: u16,
    secure: bool,
    caption: String,
    label: String,
    raw: Vec<u8>,
}

/// Inputs for [`PreparedRequest::build`].
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path_with_query: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    /// Path after placeholder substitution, without base or query.
    pub final_path: String,
}

impl PreparedRequest {
    /// Freeze the parts into a request and serialize its raw bytes.
    pub fn build(parts: RequestParts) -> Self {
        let body = parts.body.as_ref().map(body_text).unwrap_or_default();
        let host_header = format_host_port(&parts.host, parts.port, parts.secure);
        let path_with_query = if parts.path_with_query.is_empty() {
            "/".to_string()
        } else {
            parts.path_with_query
        };

        let mut lines = Vec::with_capacity(parts.headers.len() + 2);
        lines.push(format!("{} {} HTTP/1.1", parts.method, path_with_query));
        lines.push(format!("Host: {host_header}"));
        for (name, value) in &parts.headers {
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            lines.push(format!("{name}: {value}"));
        }
        let mut raw = (lines.join("\r\n") + "\r\n\r\n").into_bytes();
        raw.extend_from_slice(body.as_bytes());

        let scheme = if parts.secure { "https" } else { "http" };
        Self {
            caption: format!("{} {}", parts.method, parts.final_path),
            label: format!(
                "{} {}  ->  {}://{}",
                parts.method, path_with_query, scheme, host_header
            ),
            method: parts.method,
            path_with_query,
            headers: parts
                .headers
                .into_iter()
                .filter(|(name, _)| !name.eq_ignore_ascii_case("host"))
                .collect(),
            body: body.into_bytes(),
            host: parts.host,
            port: parts.port,
            secure: parts.secure,
            raw,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path_with_query(&self) -> &str {
        &self.path_with_query
    }

    /// Generic headers in emission order; never contains `Host`.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Short title: method and substituted path.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// List entry: method, request target and destination.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The serialized request, ready for a transport.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn raw_text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Objects and arrays as compact JSON, strings verbatim, other scalars as
/// JSON text. `null` means no body.
fn body_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
