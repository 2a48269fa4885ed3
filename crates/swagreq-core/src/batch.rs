//! The import batch: split sources, load each, assemble every operation.
//!
//! Failures are isolated at two levels. A source that cannot be loaded is
//! logged and recorded, and the next source still runs; an operation that
//! cannot be assembled is logged and recorded, and the next operation still
//! runs. Nothing propagates out of a batch as an error.

use std::thread::{self, JoinHandle};

use crate::assemble::RequestAssembler;
use crate::assemble::request::PreparedRequest;
use crate::assemble::target::has_http_scheme;
use crate::config::{ImportConfig, InputMode};
use crate::error::FetchError;
use crate::extract::extract_operations;
use crate::fetch::HttpFetcher;
use crate::headers::{parse_custom_headers, spec_fetch_headers};
use crate::load::SpecLoader;
use crate::parse::is_json_text;

/// Something that went wrong for one source or one of its operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The URL, or a short description of pasted text.
    pub source: String,
    pub message: String,
}

/// Everything one import produced.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub requests: Vec<PreparedRequest>,
    pub failures: Vec<Failure>,
}

/// Split raw input into individual sources.
pub fn split_sources(text: &str, mode: InputMode) -> Vec<String> {
    let lines = || {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    match mode {
        InputMode::Auto if is_json_text(text) => vec![text.trim().to_string()],
        InputMode::Auto | InputMode::Urls => lines(),
        InputMode::RawJson if is_json_text(text) => vec![text.trim().to_string()],
        InputMode::RawJson => {
            log::warn!("Input is not JSON; nothing to import");
            Vec::new()
        }
    }
}

/// Runs import batches with one configuration and fetcher.
pub struct Importer {
    config: ImportConfig,
    fetcher: HttpFetcher,
    yaml: bool,
}

impl Importer {
    /// An importer fetching over the real network.
    pub fn new(config: ImportConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: ImportConfig, fetcher: HttpFetcher) -> Self {
        Self {
            config,
            fetcher,
            yaml: true,
        }
    }

    /// Load without a YAML engine.
    pub fn without_yaml(mut self) -> Self {
        self.yaml = false;
        self
    }

    /// Split `text` with the configured input mode and run the batch.
    pub fn run_text(&self, text: &str) -> BatchResult {
        self.run(&split_sources(text, self.config.input_mode))
    }

    /// Process every source in order on the calling thread.
    pub fn run(&self, sources: &[String]) -> BatchResult {
        let custom = parse_custom_headers(&self.config.headers);
        let fetch_headers = spec_fetch_headers(self.config.token.as_deref(), &custom);
        let mut loader = SpecLoader::new(&self.fetcher);
        if !self.yaml {
            loader = loader.without_yaml();
        }

        let mut result = BatchResult::default();
        for source in sources {
            let source = source.trim();
            let label = source_label(source);
            if has_http_scheme(source) {
                log::info!("Fetching spec: {label}");
            } else {
                log::info!("Loading spec from {label}");
            }

            let doc = match loader.load(source, &fetch_headers) {
                Ok(doc) => doc,
                Err(err) => {
                    log::warn!("Failed to load {label}: {err}");
                    result.failures.push(Failure {
                        source: label,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            log::info!(
                "Loaded {} with {} path(s)",
                doc.describe(),
                doc.paths().len()
            );

            let mut assembler = RequestAssembler::new(&self.config, &doc);
            if has_http_scheme(source) {
                assembler = assembler.anchored_at(source);
            }
            for op in extract_operations(&doc) {
                for outcome in assembler.assemble_each(&op) {
                    match outcome {
                        Ok(request) => result.requests.push(request),
                        Err(err) => {
                            log::warn!("{err}");
                            result.failures.push(Failure {
                                source: label.clone(),
                                message: err.to_string(),
                            });
                        }
                    }
                }
            }
        }
        log::info!("Prepared {} request(s)", result.requests.len());
        result
    }

    /// Run the batch on a dedicated background thread.
    pub fn spawn(self, sources: Vec<String>) -> std::io::Result<BatchHandle> {
        let handle = thread::Builder::new()
            .name("swagreq-import".to_string())
            .spawn(move || self.run(&sources))?;
        Ok(BatchHandle { handle })
    }
}

/// One-shot handle to a background batch.
pub struct BatchHandle {
    handle: JoinHandle<BatchResult>,
}

impl BatchHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the batch is done. A worker that panicked yields an empty
    /// result carrying one failure.
    pub fn wait(self) -> BatchResult {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                log::error!("import worker panicked");
                BatchResult {
                    requests: Vec::new(),
                    failures: vec![Failure {
                        source: "batch".to_string(),
                        message: "import worker panicked".to_string(),
                    }],
                }
            }
        }
    }
}

fn source_label(source: &str) -> String {
    let source = source.trim();
    if has_http_scheme(source) {
        source.to_string()
    } else if is_json_text(source) {
        "pasted JSON".to_string()
    } else {
        "pasted text".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_auto_json_is_one_source() {
        let text = "{\n  \"openapi\": \"3.0.0\"\n}\n";
        assert_eq!(split_sources(text, InputMode::Auto), vec!["{\n  \"openapi\": \"3.0.0\"\n}"]);
    }

    #[test]
    fn test_split_auto_lines() {
        let text = " https://a.test/spec.json \n\n\thttps://b.test/spec.yaml\n";
        assert_eq!(
            split_sources(text, InputMode::Auto),
            vec!["https://a.test/spec.json", "https://b.test/spec.yaml"]
        );
    }

    #[test]
    fn test_split_urls_splits_json_too() {
        assert_eq!(split_sources("{\n}", InputMode::Urls), vec!["{", "}"]);
    }

    #[test]
    fn test_split_raw_json() {
        assert_eq!(split_sources(" [1] ", InputMode::RawJson), vec!["[1]"]);
        assert!(split_sources("https://a.test/spec.json", InputMode::RawJson).is_empty());
    }

    #[test]
    fn test_source_label() {
        assert_eq!(source_label(" https://a.test/x "), "https://a.test/x");
        assert_eq!(source_label("{}"), "pasted JSON");
        assert_eq!(source_label("openapi: 3.0.0"), "pasted text");
    }
}
