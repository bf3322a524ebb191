//! Configuration for the upstream endpoints, retries and cache
//!
//! Settings are layered: built-in defaults, then a TOML config file, then
//! `WOTD_*` environment variables. Command-line flags are applied on top by the
//! CLI. A bad base URL is a startup error, never a per-request one.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheSettings, MAX_TTL_HOURS};
use crate::data::dictionary::DICTIONARY_API_BASE_URL;
use crate::data::random_word::UnknownProvider;
use crate::data::{UpstreamError, WordProvider};
use crate::retry::RetryPolicy;

/// Name of the config file inside the config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the random word base URL
pub const ENV_RANDOM_WORD_URL: &str = "WOTD_RANDOM_WORD_URL";

/// Environment variable overriding the dictionary base URL
pub const ENV_DICTIONARY_URL: &str = "WOTD_DICTIONARY_URL";

/// Environment variable selecting the word provider
pub const ENV_WORD_PROVIDER: &str = "WOTD_WORD_PROVIDER";

/// Default per-request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A base URL was empty
    #[error("Missing base URL for {field}")]
    MissingUrl { field: &'static str },

    /// A base URL could not be used
    #[error("Invalid base URL for {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Retry settings are unusable
    #[error("Invalid retry settings: {0}")]
    InvalidRetry(String),

    /// Cache settings are out of range
    #[error("Invalid cache settings: {0}")]
    InvalidCache(String),

    /// Unrecognized provider name
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] UpstreamError),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which random word provider to call
    pub word_provider: WordProvider,
    /// Base URL of the random word provider; the provider's public URL when unset
    pub random_word_url: Option<String>,
    /// Base URL of the dictionary API
    pub dictionary_url: String,
    /// Timeout for a single HTTP request
    pub request_timeout_secs: u64,
    /// Retry behavior for both upstreams
    pub retry: RetryPolicy,
    /// Result cache settings
    pub cache: CacheSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_provider: WordProvider::default(),
            random_word_url: None,
            dictionary_url: DICTIONARY_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/wotd/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "wotd")?;
        Some(project_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, the default location is used
    /// if a file is present there, otherwise built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Reads and parses a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `WOTD_*` overrides looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup(ENV_WORD_PROVIDER) {
            self.word_provider = provider.parse()?;
        }
        if let Some(url) = lookup(ENV_RANDOM_WORD_URL) {
            self.random_word_url = Some(url);
        }
        if let Some(url) = lookup(ENV_DICTIONARY_URL) {
            self.dictionary_url = url;
        }
        Ok(())
    }

    /// Resolved random word base URL
    pub fn random_word_url(&self) -> Result<Url, ConfigError> {
        let value = self
            .random_word_url
            .as_deref()
            .unwrap_or_else(|| self.word_provider.default_base_url());
        parse_base_url("random_word_url", value)
    }

    /// Resolved dictionary base URL
    pub fn dictionary_url(&self) -> Result<Url, ConfigError> {
        parse_base_url("dictionary_url", &self.dictionary_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Checks everything the service needs before it is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.random_word_url()?;
        self.dictionary_url()?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::InvalidRetry(format!(
                "multiplier must be at least 1.0, got {}",
                self.retry.multiplier
            )));
        }
        if !(1..=MAX_TTL_HOURS).contains(&self.cache.ttl_hours) {
            return Err(ConfigError::InvalidCache(format!(
                "ttl_hours must be between 1 and {}, got {}",
                MAX_TTL_HOURS, self.cache.ttl_hours
            )));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::InvalidCache(
                "capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses an http(s) base URL that path segments can be appended to
fn parse_base_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::MissingUrl { field });
    }

    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    Ok(url)
}
