//! Harvester settings
//!
//! File-based configuration (YAML or JSON) with a default for every field.
//! CLI flags are layered on top by the runner.

use crate::error::{Error, Result};
use crate::engine::HarvestConfig;
use crate::http::{HttpClientConfig, DEFAULT_ENDPOINT, DEFAULT_REFERER, DEFAULT_SESSION_HEADER};
use crate::sink::SinkFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

// ============================================================================
// Settings
// ============================================================================

/// Complete harvester configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Search endpoint URL
    pub endpoint: String,

    /// Header carrying the session credential
    pub session_header: String,

    /// Extra request headers, merged over the built-in defaults
    pub headers: HashMap<String, String>,

    /// Referer template; `{query}` is replaced by the URL-encoded query
    pub referer: Option<String>,

    /// User agent override
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures and timeouts
    pub max_retries: u32,

    /// Delay between attempts in seconds
    pub retry_backoff_secs: f64,

    /// Delay between pages in seconds
    pub page_delay_secs: f64,

    /// First page to fetch
    pub start_page: u32,

    /// Directory holding output, event log and checkpoint files
    pub output_dir: PathBuf,

    /// Result file format
    pub output_format: SinkFormat,

    /// Event log file name, relative to `output_dir`
    pub log_file: PathBuf,

    /// Checkpoint file name, relative to `output_dir`
    pub checkpoint_file: PathBuf,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session_header: DEFAULT_SESSION_HEADER.to_string(),
            headers: HashMap::new(),
            referer: Some(DEFAULT_REFERER.to_string()),
            user_agent: None,
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_secs: 2.0,
            page_delay_secs: 1.0,
            start_page: 1,
            output_dir: PathBuf::from("search_results"),
            output_format: SinkFormat::default(),
            log_file: PathBuf::from("scraper.log"),
            checkpoint_file: PathBuf::from("checkpoint.json"),
        }
    }
}

impl HarvestSettings {
    /// Load settings from a YAML or JSON file.
    ///
    /// A `.json` extension selects JSON; anything else is parsed as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let settings = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse config JSON: {e}")))
    }

    /// Check settings for values the harvester cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::invalid_value("endpoint", "must not be empty"));
        }
        Url::parse(&self.endpoint)
            .map_err(|e| Error::invalid_value("endpoint", e.to_string()))?;

        if self.session_header.trim().is_empty() {
            return Err(Error::invalid_value("session_header", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be positive"));
        }
        if self.start_page == 0 {
            return Err(Error::invalid_value("start_page", "pages start at 1"));
        }

        check_seconds("retry_backoff_secs", self.retry_backoff_secs)?;
        check_seconds("page_delay_secs", self.page_delay_secs)?;
        Ok(())
    }

    /// Client configuration for the search fetcher
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .endpoint(self.endpoint.as_str())
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .retry_backoff(seconds(self.retry_backoff_secs))
            .session_header(self.session_header.as_str());

        builder = match &self.referer {
            Some(template) => builder.referer(template.as_str()),
            None => builder.no_referer(),
        };
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder.build()
    }

    /// Driver configuration
    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig::new()
            .with_start_page(self.start_page)
            .with_page_delay(seconds(self.page_delay_secs))
    }

    /// Path of the result file
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_format.file_name())
    }

    /// Path of the event log
    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file)
    }

    /// Path of the resume checkpoint
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(&self.checkpoint_file)
    }
}

/// Whether `value` seconds fits in a [`Duration`] (finite, non-negative, not too large)
pub(crate) fn is_valid_seconds(value: f64) -> bool {
    Duration::try_from_secs_f64(value).is_ok()
}

fn check_seconds(field: &str, value: f64) -> Result<()> {
    if !is_valid_seconds(value) {
        return Err(Error::invalid_value(
            field,
            format!("must be a non-negative, representable number of seconds, got {value}"),
        ));
    }
    Ok(())
}

/// Convert seconds already accepted by `check_seconds` to a duration
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}
