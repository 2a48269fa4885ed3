//! Blocking GET with header injection and bounded redirect following.

pub mod response;
pub mod transport;

use std::time::Duration;

use indexmap::IndexMap;

use crate::assemble::target::Target;
use crate::config::FetchConfig;
use crate::error::FetchError;
use response::{RawResponse, ResponseParser, default_parsers, parse_with};
use transport::{Endpoint, TcpTransport, Transport};

const SPEC_ACCEPT: &str = "application/json, application/yaml, text/yaml, application/x-yaml, */*";

/// Body text and content type of a fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    pub content_type: String,
}

/// Fetches spec documents over a [`Transport`].
pub struct HttpFetcher {
    transport: Box<dyn Transport>,
    parsers: Vec<Box<dyn ResponseParser>>,
    user_agent: String,
    max_redirects: u32,
}

impl HttpFetcher {
    /// A fetcher on the real TCP transport.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        let transport = TcpTransport::new(timeout)?;
        Ok(Self::with_transport(Box::new(transport), config))
    }

    pub fn with_transport(transport: Box<dyn Transport>, config: &FetchConfig) -> Self {
        Self {
            transport,
            parsers: default_parsers(),
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
        }
    }

    /// Replace the response parser chain.
    pub fn with_parsers(mut self, parsers: Vec<Box<dyn ResponseParser>>) -> Self {
        self.parsers = parsers;
        self
    }

    /// Fetch with the configured redirect budget.
    pub fn fetch(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
    ) -> Result<Fetched, FetchError> {
        self.fetch_with_redirects(url, headers, self.max_redirects)
    }

    /// Fetch, following at most `max_redirects` redirects. A redirect that
    /// exhausts the budget, or carries no (or a blank) `Location`, is
    /// returned as-is.
    pub fn fetch_with_redirects(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
        max_redirects: u32,
    ) -> Result<Fetched, FetchError> {
        let mut current = url.to_string();
        let mut remaining = max_redirects;
        loop {
            let target =
                Target::parse(&current).ok_or_else(|| FetchError::InvalidUrl(current.clone()))?;
            let response = self.get(&target, headers)?;
            log::info!("Fetch {} -> HTTP {}", current, response.status);

            if remaining > 0 && response.is_redirect() {
                if let Some(location) = response
                    .header("location")
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                {
                    current = resolve_location(&target, location)?;
                    remaining -= 1;
                    continue;
                }
            }

            return Ok(Fetched {
                body: response.body_text(),
                content_type: response.content_type().to_string(),
            });
        }
    }

    fn get(
        &self,
        target: &Target,
        headers: &IndexMap<String, String>,
    ) -> Result<RawResponse, FetchError> {
        let request = self.build_get(target, headers);
        let endpoint = Endpoint {
            host: target.host.clone(),
            port: target.port_or_default(target.is_https()),
            secure: target.is_https(),
        };
        let raw = self.transport.round_trip(&endpoint, request.as_bytes())?;
        if raw.is_empty() {
            return Err(FetchError::EmptyResponse(target.origin()));
        }
        let (parser, mut response) = parse_with(&self.parsers, &raw)
            .ok_or_else(|| FetchError::EmptyResponse(target.origin()))?;
        log::debug!("response parsed by {parser} parser");
        response.dechunk();
        Ok(response)
    }

    fn build_get(&self, target: &Target, headers: &IndexMap<String, String>) -> String {
        let mut lines = vec![
            format!("GET {} HTTP/1.1", target.path_and_query()),
            format!("Host: {}", target.host_header(target.is_https())),
            format!("User-Agent: {}", self.user_agent),
            format!("Accept: {SPEC_ACCEPT}"),
            "Connection: close".to_string(),
        ];
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            lines.push(format!("{name}: {value}"));
        }
        lines.join("\r\n") + "\r\n\r\n"
    }
}

/// Resolve a `Location` against the request it answered.
fn resolve_location(current: &Target, location: &str) -> Result<String, FetchError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return Ok(location.to_string());
    }
    let origin = current.origin();
    if location.starts_with('/') {
        return Ok(format!("{origin}{location}"));
    }
    let base = url::Url::parse(&format!("{origin}{}", current.path))
        .map_err(|e| FetchError::InvalidUrl(format!("{origin}{}: {e}", current.path)))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| FetchError::InvalidUrl(format!("{location}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses and records every request it was sent.
    struct Scripted {
        responses: Mutex<Vec<Vec<u8>>>,
        seen: Mutex<Vec<(Endpoint, String)>>,
    }

    impl Scripted {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|r| r.as_bytes().to_vec()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for &'static Scripted {
        fn round_trip(&self, endpoint: &Endpoint, request: &[u8]) -> Result<Vec<u8>, FetchError> {
            self.seen.lock().unwrap().push((
                endpoint.clone(),
                String::from_utf8_lossy(request).into_owned(),
            ));
            Ok(self.responses.lock().unwrap().pop().unwrap_or_default())
        }
    }

    fn fetcher(script: &'static Scripted) -> HttpFetcher {
        HttpFetcher::with_transport(Box::new(script), &FetchConfig::default())
    }

    fn leak(responses: &[&str]) -> &'static Scripted {
        Box::leak(Box::new(Scripted::new(responses)))
    }

    #[test]
    fn test_get_request_shape() {
        let script = leak(&["HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{}"]);
        let mut headers = IndexMap::new();
        headers.insert("Authorization".to_string(), "Bearer t".to_string());
        headers.insert("host".to_string(), "evil.test".to_string());
        let fetched = fetcher(script)
            .fetch("http://api.test:8080/spec.json?v=1#top", &headers)
            .unwrap();
        assert_eq!(fetched.body, "{}");
        assert_eq!(fetched.content_type, "application/json");

        let seen = script.seen.lock().unwrap();
        let (endpoint, request) = &seen[0];
        assert_eq!(endpoint.port, 8080);
        assert!(!endpoint.secure);
        let lines: Vec<&str> = request.split("\r\n").collect();
        assert_eq!(lines[0], "GET /spec.json?v=1 HTTP/1.1");
        assert_eq!(lines[1], "Host: api.test:8080");
        assert!(lines[2].starts_with("User-Agent: swagreq/"));
        assert_eq!(lines[3], format!("Accept: {SPEC_ACCEPT}"));
        assert_eq!(lines[5], "Authorization: Bearer t");
        assert!(!request.contains("evil.test"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_default_port_is_omitted_from_host() {
        let script = leak(&["HTTP/1.1 200 OK\r\n\r\n"]);
        fetcher(script)
            .fetch("https://api.test/openapi.yaml", &IndexMap::new())
            .unwrap();
        let seen = script.seen.lock().unwrap();
        assert_eq!(seen[0].0.port, 443);
        assert!(seen[0].0.secure);
        assert!(seen[0].1.contains("\r\nHost: api.test\r\n"));
        assert!(seen[0].1.starts_with("GET /openapi.yaml HTTP/1.1"));
    }

    #[test]
    fn test_relative_redirect_is_rooted_at_host() {
        let script = leak(&[
            "HTTP/1.1 302 Found\r\nLocation: /new\r\n\r\n",
            "HTTP/1.1 200 OK\r\n\r\nmoved here",
        ]);
        let fetched = fetcher(script)
            .fetch_with_redirects("https://api.test/old/spec", &IndexMap::new(), 3)
            .unwrap();
        assert_eq!(fetched.body, "moved here");
        let seen = script.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].1.starts_with("GET /new HTTP/1.1"));
    }

    #[test]
    fn test_path_relative_redirect() {
        let script = leak(&[
            "HTTP/1.1 301 Moved\r\nLocation: v2/spec.json\r\n\r\n",
            "HTTP/1.1 200 OK\r\n\r\n{}",
        ]);
        fetcher(script)
            .fetch("http://api.test/docs/spec.json", &IndexMap::new())
            .unwrap();
        let seen = script.seen.lock().unwrap();
        assert!(seen[1].1.starts_with("GET /docs/v2/spec.json HTTP/1.1"));
    }

    #[test]
    fn test_absolute_redirect_switches_host() {
        let script = leak(&[
            "HTTP/1.1 308 Permanent\r\nLocation: https://cdn.test/spec.json\r\n\r\n",
            "HTTP/1.1 200 OK\r\n\r\n{}",
        ]);
        fetcher(script)
            .fetch("http://api.test/spec.json", &IndexMap::new())
            .unwrap();
        let seen = script.seen.lock().unwrap();
        assert_eq!(seen[1].0.host, "cdn.test");
        assert!(seen[1].0.secure);
    }

    #[test]
    fn test_redirect_budget_is_bounded() {
        let hop = "HTTP/1.1 302 Found\r\nLocation: /next\r\nContent-Type: text/plain\r\n\r\nhop";
        let script = leak(&[hop, hop, hop, hop, hop, hop]);
        let fetched = fetcher(script)
            .fetch_with_redirects("http://api.test/", &IndexMap::new(), 3)
            .unwrap();
        assert_eq!(script.seen.lock().unwrap().len(), 4);
        assert_eq!(fetched.body, "hop");
        assert_eq!(fetched.content_type, "text/plain");
    }

    #[test]
    fn test_redirect_without_location_is_returned() {
        let script = leak(&["HTTP/1.1 302 Found\r\n\r\nno location"]);
        let fetched = fetcher(script)
            .fetch("http://api.test/", &IndexMap::new())
            .unwrap();
        assert_eq!(fetched.body, "no location");
    }

    #[test]
    fn test_blank_location_is_not_followed() {
        let script = leak(&[
            "HTTP/1.1 302 Found\r\nLocation: \r\nContent-Type: text/plain\r\n\r\nredirect-body",
            "HTTP/1.1 200 OK\r\n\r\nother",
        ]);
        let fetched = fetcher(script)
            .fetch("http://api.test/spec.json?v=1", &IndexMap::new())
            .unwrap();
        assert_eq!(fetched.body, "redirect-body");
        let seen = script.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1.starts_with("GET /spec.json?v=1 HTTP/1.1"));
    }

    #[test]
    fn test_invalid_url() {
        let script = leak(&[]);
        let result = fetcher(script).fetch("ftp://api.test/spec", &IndexMap::new());
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
        let result = fetcher(script).fetch("https:///spec", &IndexMap::new());
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let script = leak(&[""]);
        let result = fetcher(script).fetch("http://api.test/", &IndexMap::new());
        assert!(matches!(result, Err(FetchError::EmptyResponse(_))));
    }

    #[test]
    fn test_manual_parser_alone_follows_redirects() {
        let script = leak(&[
            "HTTP/1.1 307 Temporary\r\nLocation: /b\r\n\r\n",
            "HTTP/1.1 200 OK\r\n\r\nfinal",
        ]);
        let fetched = fetcher(script)
            .with_parsers(vec![Box::new(response::ManualParser)])
            .fetch("http://api.test/a", &IndexMap::new())
            .unwrap();
        assert_eq!(fetched.body, "final");
    }
}
