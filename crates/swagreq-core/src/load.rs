//! Turning a source string (pasted text or URL) into a [`SpecDocument`].

use indexmap::IndexMap;
use serde_json::Value;

use crate::assemble::target::has_http_scheme;
use crate::error::LoadError;
use crate::fetch::HttpFetcher;
use crate::parse::spec::SpecDocument;
use crate::parse::{YamlEngine, default_yaml_engine, is_json_text, json_value};

/// Loads spec documents, fetching URL sources through an [`HttpFetcher`].
pub struct SpecLoader<'a> {
    fetcher: &'a HttpFetcher,
    yaml: Option<Box<dyn YamlEngine>>,
}

impl<'a> SpecLoader<'a> {
    /// A loader using the YAML engine compiled into this build.
    pub fn new(fetcher: &'a HttpFetcher) -> Self {
        Self {
            fetcher,
            yaml: default_yaml_engine(),
        }
    }

    /// Drop YAML support; YAML-only sources then fail with
    /// [`LoadError::MissingYamlEngine`].
    pub fn without_yaml(mut self) -> Self {
        self.yaml = None;
        self
    }

    /// Load one source. `headers` are sent on every fetch this source needs.
    pub fn load(
        &self,
        source: &str,
        headers: &IndexMap<String, String>,
    ) -> Result<SpecDocument, LoadError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(LoadError::EmptySource);
        }
        let root = if is_json_text(source) {
            log::debug!("source is JSON-shaped, parsing directly");
            json_value(source)?
        } else if has_http_scheme(source) {
            self.load_url(source, headers)?
        } else {
            log::debug!("source is pasted text, parsing as YAML");
            self.parse_yaml(source)?
        };
        SpecDocument::from_value(&root)
    }

    fn load_url(&self, url: &str, headers: &IndexMap<String, String>) -> Result<Value, LoadError> {
        let fetched = self.fetcher.fetch(url, headers)?;
        let body = fetched.body.as_str();

        match json_value(body) {
            Ok(root) => return Ok(root),
            Err(err) => log::debug!("{url} is not JSON: {err}"),
        }

        let yaml_signalled = fetched.content_type.to_ascii_lowercase().contains("yaml")
            || url.ends_with(".yaml")
            || url.ends_with(".yml");
        if yaml_signalled {
            match self.parse_yaml(body) {
                Ok(root) => return Ok(root),
                Err(err) => log::debug!("{url} looked like YAML but did not parse: {err}"),
            }
        }

        if let Some(alt) = alt_json_url(url) {
            match self.fetcher.fetch(&alt, headers) {
                Ok(sibling) => match json_value(&sibling.body) {
                    Ok(root) => {
                        log::info!("Using JSON sibling {alt}");
                        return Ok(root);
                    }
                    Err(err) => log::debug!("JSON sibling {alt} did not parse: {err}"),
                },
                Err(err) => log::debug!("JSON sibling {alt} unavailable: {err}"),
            }
        }

        self.parse_yaml(body)
    }

    fn parse_yaml(&self, text: &str) -> Result<Value, LoadError> {
        let engine = self.yaml.as_ref().ok_or(LoadError::MissingYamlEngine)?;
        Ok(engine.parse(text)?)
    }
}

/// The `.json` sibling of a `.yaml`/`.yml` URL.
pub fn alt_json_url(url: &str) -> Option<String> {
    url.strip_suffix(".yaml")
        .or_else(|| url.strip_suffix(".yml"))
        .map(|stem| format!("{stem}.json"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::FetchConfig;
    use crate::error::{FetchError, SyntaxError};
    use crate::fetch::transport::{Endpoint, Transport};

    /// Serves bodies by request path; unknown paths get a 404.
    struct Routes {
        routes: Vec<(&'static str, &'static str, &'static str)>,
        hits: Mutex<Vec<String>>,
    }

    impl Transport for &'static Routes {
        fn round_trip(&self, _: &Endpoint, request: &[u8]) -> Result<Vec<u8>, FetchError> {
            let text = String::from_utf8_lossy(request);
            let path = text.split(' ').nth(1).unwrap_or("/").to_string();
            self.hits.lock().unwrap().push(path.clone());
            let response = match self.routes.iter().find(|(p, _, _)| *p == path) {
                Some((_, ctype, body)) => {
                    format!("HTTP/1.1 200 OK\r\nContent-Type: {ctype}\r\n\r\n{body}")
                }
                None => "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n\r\n<h1>nope</h1>"
                    .to_string(),
            };
            Ok(response.into_bytes())
        }
    }

    fn fetcher(routes: Vec<(&'static str, &'static str, &'static str)>) -> (HttpFetcher, &'static Routes) {
        let routes: &'static Routes = Box::leak(Box::new(Routes {
            routes,
            hits: Mutex::new(Vec::new()),
        }));
        (
            HttpFetcher::with_transport(Box::new(routes), &FetchConfig::default()),
            routes,
        )
    }

    const V3_JSON: &str = r#"{"openapi":"3.0.0","paths":{"/a":{"get":{}}}}"#;
    const V3_YAML: &str = "openapi: 3.0.0\npaths:\n  /a:\n    get: {}\n";

    #[test]
    fn test_empty_source() {
        let (fetcher, _) = fetcher(vec![]);
        let result = SpecLoader::new(&fetcher).load("  \n ", &IndexMap::new());
        assert!(matches!(result, Err(LoadError::EmptySource)));
    }

    #[test]
    fn test_json_text_skips_network() {
        let (fetcher, routes) = fetcher(vec![]);
        let doc = SpecLoader::new(&fetcher)
            .load(&format!("  {V3_JSON}\n"), &IndexMap::new())
            .unwrap();
        assert_eq!(doc.paths().len(), 1);
        assert!(routes.hits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_bad_json_text_is_unparseable() {
        let (fetcher, _) = fetcher(vec![]);
        let result = SpecLoader::new(&fetcher).load("{\"openapi\": }", &IndexMap::new());
        assert!(matches!(
            result,
            Err(LoadError::Unparseable {
                source: SyntaxError::Json(_)
            })
        ));
    }

    #[test]
    fn test_url_json_body() {
        let (fetcher, routes) = fetcher(vec![("/spec", "application/json", V3_JSON)]);
        let doc = SpecLoader::new(&fetcher)
            .load("http://api.test/spec", &IndexMap::new())
            .unwrap();
        assert!(matches!(doc, SpecDocument::OpenApiV3(_)));
        assert_eq!(*routes.hits.lock().unwrap(), vec!["/spec"]);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_url_yaml_by_content_type() {
        let (fetcher, routes) = fetcher(vec![("/spec", "Application/X-YAML", V3_YAML)]);
        let doc = SpecLoader::new(&fetcher)
            .load("http://api.test/spec", &IndexMap::new())
            .unwrap();
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(routes.hits.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_json_sibling_is_tried() {
        let (fetcher, routes) = fetcher(vec![
            ("/openapi.yaml", "text/plain", "::: not yaml :::\n\t- ["),
            ("/openapi.json", "application/json", V3_JSON),
        ]);
        let doc = SpecLoader::new(&fetcher)
            .without_yaml()
            .load("http://api.test/openapi.yaml", &IndexMap::new())
            .unwrap();
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(
            *routes.hits.lock().unwrap(),
            vec!["/openapi.yaml", "/openapi.json"]
        );
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_url_yaml_by_extension() {
        let (fetcher, routes) = fetcher(vec![("/openapi.yml", "text/plain", V3_YAML)]);
        let doc = SpecLoader::new(&fetcher)
            .load("http://api.test/openapi.yml", &IndexMap::new())
            .unwrap();
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(routes.hits.lock().unwrap().len(), 1);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_unsignalled_yaml_is_forced_last() {
        let (fetcher, _) = fetcher(vec![("/spec", "text/plain", V3_YAML)]);
        let doc = SpecLoader::new(&fetcher)
            .load("http://api.test/spec", &IndexMap::new())
            .unwrap();
        assert_eq!(doc.paths().len(), 1);
    }

    #[test]
    fn test_missing_engine_surfaces_on_url_chain() {
        let (fetcher, _) = fetcher(vec![("/spec.yaml", "application/yaml", V3_YAML)]);
        let result = SpecLoader::new(&fetcher)
            .without_yaml()
            .load("http://api.test/spec.yaml", &IndexMap::new());
        assert!(matches!(result, Err(LoadError::MissingYamlEngine)));
    }

    #[test]
    fn test_missing_engine_surfaces_on_pasted_text() {
        let (fetcher, _) = fetcher(vec![]);
        let result = SpecLoader::new(&fetcher)
            .without_yaml()
            .load(V3_YAML, &IndexMap::new());
        assert!(matches!(result, Err(LoadError::MissingYamlEngine)));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_pasted_scalar_is_not_a_document() {
        let (fetcher, _) = fetcher(vec![]);
        let result = SpecLoader::new(&fetcher).load("just some words", &IndexMap::new());
        assert!(matches!(result, Err(LoadError::NotADocument)));
    }

    #[test]
    fn test_headers_are_forwarded() {
        struct Capture(Mutex<String>);
        impl Transport for &'static Capture {
            fn round_trip(&self, _: &Endpoint, request: &[u8]) -> Result<Vec<u8>, FetchError> {
                *self.0.lock().unwrap() = String::from_utf8_lossy(request).into_owned();
                Ok(format!("HTTP/1.1 200 OK\r\n\r\n{V3_JSON}").into_bytes())
            }
        }
        let capture: &'static Capture = Box::leak(Box::new(Capture(Mutex::new(String::new()))));
        let fetcher = HttpFetcher::with_transport(Box::new(capture), &FetchConfig::default());
        let mut headers = IndexMap::new();
        headers.insert("Authorization".to_string(), "Bearer tok".to_string());
        SpecLoader::new(&fetcher)
            .load("https://api.test/spec", &headers)
            .unwrap();
        assert!(capture.0.lock().unwrap().contains("\r\nAuthorization: Bearer tok\r\n"));
    }

    #[test]
    fn test_alt_json_url() {
        assert_eq!(
            alt_json_url("https://x.test/openapi.yaml").as_deref(),
            Some("https://x.test/openapi.json")
        );
        assert_eq!(
            alt_json_url("https://x.test/openapi.yml").as_deref(),
            Some("https://x.test/openapi.json")
        );
        assert_eq!(alt_json_url("https://x.test/openapi"), None);
    }
}
