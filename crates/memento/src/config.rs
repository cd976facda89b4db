//! Runtime configuration with sensible defaults.
//!
//! [`MementoConfig`] is read from a TOML file and converted into the
//! pipeline's own types via [`build_client`](MementoConfig::build_client),
//! [`sync_config`](MementoConfig::sync_config) and friends. Every key is
//! optional:
//!
//! ```toml
//! [model]
//! base_url = "http://localhost:11434"
//! model = "llama3.2"
//! max_retries = 1
//!
//! [sync]
//! processed_calendar = "Processed"
//! skip_calendars = ["Shopping"]
//! default_assignee = "Jane"
//! failure_policy = "continue"
//!
//! [layout]
//! title_width = 20
//! body_width = 22
//!
//! [store]
//! path = "reminders.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::api::retry::RetryConfig;
use crate::extract::response_schema;
use crate::layout::LayoutConfig;
use crate::normalize::Normalizer;
use crate::sync::{FailurePolicy, SyncConfig};
use crate::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, GenerateOptions, OllamaClient};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// `[model]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Default: `"http://localhost:11434"`.
    pub base_url: String,
    /// Default: `"llama3.2"`.
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub num_ctx: u32,
    pub seed: Option<u64>,
    /// Per-request timeout. Default: `120`.
    pub timeout_secs: u64,
    /// Extra attempts on transient failures. Default: `1`.
    pub max_retries: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let options = GenerateOptions::default();
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: options.temperature.unwrap_or(0.1),
            top_p: options.top_p.unwrap_or(0.9),
            num_ctx: options.num_ctx.unwrap_or(4096),
            seed: None,
            timeout_secs: 120,
            max_retries: 1,
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Default: `"Processed"`.
    pub processed_calendar: String,
    pub skip_calendars: Vec<String>,
    pub default_assignee: Option<String>,
    /// Default: `10`.
    pub store_timeout_secs: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            processed_calendar: sync.processed_calendar,
            skip_calendars: Vec::new(),
            default_assignee: None,
            store_timeout_secs: sync.store_timeout.as_secs(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// JSON reminders document. Required by `memento run` unless given on
    /// the command line.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MementoConfig {
    pub model: ModelSettings,
    pub sync: SyncSettings,
    pub layout: LayoutConfig,
    pub store: StoreSettings,
}

impl MementoConfig {
    /// `$XDG_CONFIG_HOME/memento/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("memento").join("config.toml"))
    }

    /// Load and validate the file at `path`. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MementoConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the default file if there is one, otherwise return defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.processed_calendar.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sync.processed_calendar must not be empty".into(),
            ));
        }
        if self.sync.store_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sync.store_timeout_secs must be at least 1".into(),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "model.timeout_secs must be at least 1".into(),
            ));
        }
        if self.layout.title_width == 0 || self.layout.body_width == 0 {
            return Err(ConfigError::Invalid("layout widths must be positive".into()));
        }
        Ok(())
    }

    /// Replace the skip list from a comma-separated value such as
    /// `SKIP_CALENDARS`.
    pub fn set_skip_calendars(&mut self, value: &str) {
        self.sync.skip_calendars = parse_skip_calendars(value);
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: Some(self.model.temperature),
            top_p: Some(self.model.top_p),
            num_ctx: Some(self.model.num_ctx),
            seed: self.model.seed,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_retries(self.model.max_retries)
    }

    /// Build the model client, constrained to the extraction schema.
    pub fn build_client(&self) -> Result<OllamaClient, ConfigError> {
        reqwest::Url::parse(&self.model.base_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "model.base_url {:?} is not a URL: {e}",
                self.model.base_url
            ))
        })?;
        let client = OllamaClient::with_base_url(
            &self.model.base_url,
            &self.model.model,
            Duration::from_secs(self.model.timeout_secs),
        )
        .map_err(|e| ConfigError::Invalid(format!("cannot build the model client: {e}")))?;
        Ok(client
            .with_options(self.generate_options())
            .with_format(response_schema()))
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(
            self.sync
                .default_assignee
                .clone()
                .filter(|a| !a.trim().is_empty()),
        )
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(&self.sync.processed_calendar)
            .with_skip_calendars(self.sync.skip_calendars.clone())
            .with_store_timeout(Duration::from_secs(self.sync.store_timeout_secs))
            .with_failure_policy(self.sync.failure_policy)
    }
}

/// Split a comma-separated calendar list, dropping empty entries.
pub fn parse_skip_calendars(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
