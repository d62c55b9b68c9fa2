//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where and how to fetch the standings page
    #[serde(default)]
    pub source: SourceConfig,

    /// Table location and row parsing thresholds
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let source = &self.source;

        let endpoint = url::Url::parse(&source.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "source.endpoint must be http(s), got '{}'",
                endpoint.scheme()
            )));
        }
        if source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if source.poll_interval_secs == 0 {
            return Err(AppError::validation("source.poll_interval_secs must be > 0"));
        }
        if source.paused_idle_secs == 0 {
            return Err(AppError::validation("source.paused_idle_secs must be > 0"));
        }
        if !(source.backoff_base >= 0.0 && source.backoff_base.is_finite()) {
            return Err(AppError::validation("source.backoff_base must be >= 0"));
        }
        for (name, value) in &source.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::validation(format!("header name '{name}': {e}")))?;
            HeaderValue::from_str(value)
                .map_err(|e| AppError::validation(format!("header '{name}' value: {e}")))?;
        }

        let extraction = &self.extraction;
        if extraction.min_headers == 0 {
            return Err(AppError::validation("extraction.min_headers must be > 0"));
        }
        if extraction.max_header_chars == 0 {
            return Err(AppError::validation(
                "extraction.max_header_chars must be > 0",
            ));
        }
        if let (Some(min), Some(max)) = (extraction.min_cells, extraction.max_cells) {
            if min > max {
                return Err(AppError::validation(format!(
                    "extraction.min_cells ({min}) exceeds extraction.max_cells ({max})"
                )));
            }
        }

        Ok(())
    }
}

/// HTTP source and polling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Fallback source name; also keys the stored snapshot
    #[serde(default = "defaults::source_name")]
    pub name: String,

    /// URL of the standings page
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first timed-out attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff delay in seconds is `backoff_base ^ attempt`
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base: f64,

    /// Idle time between poll cycles in seconds
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Idle time per cycle while paused
    #[serde(default = "defaults::paused_idle")]
    pub paused_idle_secs: u64,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn paused_idle(&self) -> Duration {
        Duration::from_secs(self.paused_idle_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: defaults::source_name(),
            endpoint: defaults::endpoint(),
            user_agent: defaults::user_agent(),
            headers: BTreeMap::new(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            backoff_base: defaults::backoff_base(),
            poll_interval_secs: defaults::poll_interval(),
            paused_idle_secs: defaults::paused_idle(),
        }
    }
}

/// Structural thresholds for finding and reading the standings table.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Fewest header cells a standings table can have
    #[serde(default = "defaults::min_headers")]
    pub min_headers: usize,

    /// Header text longer than this marks the row as metadata
    #[serde(default = "defaults::max_header_chars")]
    pub max_header_chars: usize,

    /// Skip rows whose first non-empty cell is not a round number
    #[serde(default = "defaults::validate_round")]
    pub validate_round: bool,

    /// Override for the smallest plausible row width
    #[serde(default)]
    pub min_cells: Option<usize>,

    /// Override for the largest plausible row width
    #[serde(default)]
    pub max_cells: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_headers: defaults::min_headers(),
            max_header_chars: defaults::max_header_chars(),
            validate_round: defaults::validate_round(),
            min_cells: None,
            max_cells: None,
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_enabled")]
    pub enabled: bool,

    /// Directory holding one snapshot document per source
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::storage_enabled(),
            dir: defaults::storage_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn source_name() -> String {
        "Standings".into()
    }
    pub fn endpoint() -> String {
        "https://chess-results.com/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; standings-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_base() -> f64 {
        2.0
    }
    pub fn poll_interval() -> u64 {
        60
    }
    pub fn paused_idle() -> u64 {
        5
    }

    // Extraction defaults
    pub fn min_headers() -> usize {
        4
    }
    pub fn max_header_chars() -> usize {
        40
    }
    pub fn validate_round() -> bool {
        true
    }

    // Storage defaults
    pub fn storage_enabled() -> bool {
        true
    }
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.source.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut config = Config::default();
        config.source.endpoint = "ftp://example.org/standings".to_string();
        assert!(config.validate().is_err());

        config.source.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_intervals() {
        let mut config = Config::default();
        config.source.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.paused_idle_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_header() {
        let mut config = Config::default();
        config
            .source
            .headers
            .insert("Bad Header".to_string(), "x".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_cell_bounds() {
        let mut config = Config::default();
        config.extraction.min_cells = Some(8);
        config.extraction.max_cells = Some(4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            endpoint = "https://example.org/tnr1.aspx"
            poll_interval_secs = 15

            [source.headers]
            "Accept-Language" = "en"

            [extraction]
            validate_round = false
            "#,
        )
        .unwrap();

        assert_eq!(config.source.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.source.max_retries, 3);
        assert_eq!(config.source.headers["Accept-Language"], "en");
        assert!(!config.extraction.validate_round);
        assert_eq!(config.extraction.min_headers, 4);
        assert!(config.storage.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.source.name, "Standings");
    }
}
