use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Import configuration, loadable from `.swagreq.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Emit a query string built from declared query parameters.
    pub include_query_parameters: bool,
    /// Substitute `{name}` path placeholders with sample values.
    pub fill_path_parameters: bool,
    /// Derive the base URL from `servers` / `host`+`basePath` when no override is set.
    pub use_spec_servers: bool,
    /// Secure-flag recorded on every prepared request, whatever the URL scheme says.
    pub use_https: bool,
    /// Base URL override, used verbatim when non-empty.
    pub base_url: Option<String>,
    /// Bearer token sent as `Authorization` on spec fetches and prepared requests.
    pub token: Option<String>,
    /// Custom headers, one `Name: value` per line.
    pub headers: String,
    pub input_mode: InputMode,
    /// Join relative server URLs onto the origin of the URL the spec came from.
    pub anchor_relative_servers: bool,
    /// Prepare every operation once per declared base: each server, each
    /// combination of server variable `enum` values, each Swagger 2 scheme.
    pub expand_servers: bool,
    pub fetch: FetchConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            include_query_parameters: true,
            fill_path_parameters: true,
            use_spec_servers: true,
            use_https: true,
            base_url: None,
            token: None,
            headers: String::new(),
            input_mode: InputMode::Auto,
            anchor_relative_servers: false,
            expand_servers: false,
            fetch: FetchConfig::default(),
        }
    }
}

impl ImportConfig {
    /// The override, when it is non-empty after trimming.
    pub fn base_override(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

/// How a block of source text is split into individual sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// Whole text if it is JSON-shaped, else one source per line.
    #[default]
    Auto,
    /// One URL per line.
    Urls,
    /// The whole text is one JSON document.
    RawJson,
}

/// Spec fetch settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_redirects: u32,
    /// Socket timeout; `0` disables it.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_redirects: 3,
            timeout_secs: 20,
            user_agent: concat!("swagreq/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".swagreq.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
#[cfg(feature = "yaml")]
pub fn load_config(path: &Path) -> Result<Option<ImportConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: ImportConfig =
        serde_yaml_ng::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(Some(config))
}

/// Without a YAML engine a present config file cannot be read.
#[cfg(not(feature = "yaml"))]
pub fn load_config(path: &Path) -> Result<Option<ImportConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    Err(ConfigError::Parse {
        path: path.display().to_string(),
        reason: "built without YAML support".to_string(),
    })
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# swagreq configuration
include_query_parameters: true
fill_path_parameters: true
use_spec_servers: true    # ignored while base_url is set
use_https: true           # secure flag on every request, regardless of URL scheme

# base_url: https://staging.example.com/api
# token: eyJhbGciOi...
headers: |
  # X-Api-Key: changeme
input_mode: auto          # auto | urls | raw-json
anchor_relative_servers: false
expand_servers: false     # one request per server, enum value and scheme

fetch:
  max_redirects: 3
  timeout_secs: 20
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert!(config.include_query_parameters);
        assert!(config.fill_path_parameters);
        assert!(config.use_spec_servers);
        assert!(config.use_https);
        assert_eq!(config.base_override(), None);
        assert_eq!(config.input_mode, InputMode::Auto);
        assert_eq!(config.fetch.max_redirects, 3);
        assert_eq!(config.fetch.timeout_secs, 20);
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let config = ImportConfig {
            base_url: Some("   ".into()),
            ..ImportConfig::default()
        };
        assert_eq!(config.base_override(), None);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
include_query_parameters: false
use_https: false
base_url: " https://staging.test/api "
token: abc
headers: |
  X-One: 1
  X-Two=2
input_mode: raw-json
fetch:
  max_redirects: 1
"#;
        let config: ImportConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(!config.include_query_parameters);
        assert!(config.fill_path_parameters);
        assert!(!config.use_https);
        assert_eq!(config.base_override(), Some("https://staging.test/api"));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.headers, "X-One: 1\nX-Two=2\n");
        assert_eq!(config.input_mode, InputMode::RawJson);
        assert_eq!(config.fetch.max_redirects, 1);
        assert_eq!(config.fetch.timeout_secs, 20);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_default_content_parses() {
        let config: ImportConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.base_url, None);
        assert_eq!(config.input_mode, InputMode::Auto);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_load_config_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "use_https: [unclosed").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
