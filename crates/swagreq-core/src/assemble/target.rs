//! Absolute-URL splitting for request targets.
//!
//! Paths and queries are kept exactly as written so unsubstituted `{name}`
//! placeholders survive; only the host goes through `url` for validation.

/// An absolute `http://` or `https://` URL split into request parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: String,
    /// Lower-cased host; IPv6 literals keep their brackets.
    pub host: String,
    /// Port written in the URL, if any.
    pub port: Option<u16>,
    /// Path as written, `/` when empty.
    pub path: String,
    /// Query as written, without the `?`.
    pub query: String,
}

impl Target {
    /// Split an absolute URL. `None` when the scheme is not http(s) or there
    /// is no usable host.
    pub fn parse(raw: &str) -> Option<Self> {
        let (scheme, rest) = if let Some(rest) = raw.strip_prefix("http://") {
            ("http", rest)
        } else if let Some(rest) = raw.strip_prefix("https://") {
            ("https", rest)
        } else {
            return None;
        };

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
        let (host_raw, port) = split_port(host_port)?;
        if host_raw.is_empty() {
            return None;
        }
        let host = url::Host::parse(host_raw).ok()?.to_string();

        let tail = tail.split_once('#').map_or(tail, |(before, _)| before);
        let (path, query) = tail.split_once('?').unwrap_or((tail, ""));
        Some(Target {
            scheme: scheme.to_string(),
            host,
            port,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query: query.to_string(),
        })
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    /// The written port, else the default for the given security.
    pub fn port_or_default(&self, secure: bool) -> u16 {
        self.port.unwrap_or_else(|| default_port(secure))
    }

    /// `host` when the port is the default for `secure`, else `host:port`.
    pub fn host_header(&self, secure: bool) -> String {
        format_host_port(&self.host, self.port_or_default(secure), secure)
    }

    /// `scheme://host[:port]` as written.
    pub fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

pub fn default_port(secure: bool) -> u16 {
    if secure { 443 } else { 80 }
}

pub fn format_host_port(host: &str, port: u16, secure: bool) -> String {
    if port == default_port(secure) {
        host.to_string()
    } else {
        format!("{host}:{port}")
    }
}

/// Whether a URL string starts with an http(s) scheme.
pub fn has_http_scheme(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// Join a base URL and a path with exactly one slash at the seam. Empty
/// values count as `/`.
pub fn join_url(base: &str, path: &str) -> String {
    let base = if base.is_empty() { "/" } else { base };
    let path = if path.is_empty() { "/" } else { path };
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

fn split_port(host_port: &str) -> Option<(&str, Option<u16>)> {
    let port_sep = if host_port.starts_with('[') {
        let close = host_port.find(']')?;
        match &host_port[close + 1..] {
            "" => None,
            rest => Some(close + 1).filter(|_| rest.starts_with(':')),
        }
    } else {
        host_port.rfind(':')
    };
    match port_sep {
        None => Some((host_port, None)),
        Some(i) => {
            let digits = &host_port[i + 1..];
            if digits.is_empty() {
                Some((&host_port[..i], None))
            } else {
                Some((&host_port[..i], Some(digits.parse().ok()?)))
            }
        }
    }
}
