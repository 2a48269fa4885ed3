use thiserror::Error;

use crate::parse::operation::Method;

/// Failure while fetching a document over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to {host}:{port}: {source}")]
    Io {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup for {host} failed: {reason}")]
    Tls { host: String, reason: String },

    #[error("no response received from {0}")]
    EmptyResponse(String),
}

/// The decoder-level reason a document could not be read.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(String),
}

/// Failure while turning a source into a spec document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("empty source")]
    EmptySource,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unable to parse as JSON or YAML ({source})")]
    Unparseable {
        #[source]
        source: SyntaxError,
    },

    #[error("YAML parsing is not available in this build")]
    MissingYamlEngine,

    #[error("document root is not a mapping")]
    NotADocument,
}

impl From<SyntaxError> for LoadError {
    fn from(source: SyntaxError) -> Self {
        LoadError::Unparseable { source }
    }
}

/// Failure while assembling a single operation into a request.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("skipping {method} {path} (no base URL / host). Set Base URL override.")]
    UnresolvedHost { method: Method, path: String },

    #[error("skipping {method} {path} (base URL override {base} is not absolute)")]
    RelativeOverride {
        method: Method,
        path: String,
        base: String,
    },
}

/// Failure while reading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Failure reported by a dispatch collaborator.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dispatch rejected: {0}")]
    Rejected(String),
}
