//! Configuration for the classification engine
//!
//! One TOML file covers every component:
//!
//! ```toml
//! templates_dir = "/srv/docsort/templates"
//! model_path = "/srv/docsort/model/document_classifier.json"
//!
//! [extractor]
//! page_separator = "\n"
//!
//! [remote]
//! model = "gpt-4o-mini"
//! max_excerpt_chars = 1000
//!
//! [batch]
//! batch_size = 5
//! remote_batch_delay_ms = 1000
//! ```

use crate::error::{ClassifyError, Result};
use docsort_extract::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default OpenAI-compatible endpoint
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default chat model for remote inference
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4o-mini";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsortConfig {
    /// Directory holding one `<label>.json` template per category
    pub templates_dir: PathBuf,
    /// Serialized statistical model; a missing file leaves the strategy unavailable
    pub model_path: PathBuf,
    pub extractor: ExtractorConfig,
    pub remote: RemoteConfig,
    pub batch: BatchConfig,
}

impl Default for DocsortConfig {
    fn default() -> Self {
        let home = docsort_home();
        Self {
            templates_dir: home.join("templates"),
            model_path: home.join("model").join("document_classifier.json"),
            extractor: ExtractorConfig::default(),
            remote: RemoteConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// `~/.docsort`, or `.docsort` relative to the working directory when no home exists
pub fn docsort_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docsort")
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    docsort_home().join("config.toml")
}

impl DocsortConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClassifyError::ConfigurationError(format!("reading {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| {
            ClassifyError::ConfigurationError(format!("parsing {}: {}", path.display(), e))
        })
    }

    /// Write as pretty TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClassifyError::ConfigurationError(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClassifyError::ConfigurationError(e.to_string()))?;
        }
        std::fs::write(path, contents).map_err(|e| {
            ClassifyError::ConfigurationError(format!("writing {}: {}", path.display(), e))
        })
    }

    /// Overlay environment variables
    pub fn apply_env(mut self) -> Self {
        self.remote = self.remote.apply_env();
        if let Ok(dir) = std::env::var("DOCSORT_TEMPLATES_DIR") {
            self.templates_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("DOCSORT_MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        self
    }
}

/// Remote inference endpoint settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub api_base: String,
    /// Bearer credential; never written back to disk
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    /// Characters of extracted text sent per request
    pub max_excerpt_chars: usize,
    /// Caller-supplied request deadline; no deadline when absent
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_REMOTE_MODEL.to_string(),
            max_excerpt_chars: 1000,
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_excerpt_chars", &self.max_excerpt_chars)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RemoteConfig {
    /// Overlay `DOCSORT_API_BASE`, `DOCSORT_API_KEY`, then `OPENAI_API_KEY`
    pub fn apply_env(mut self) -> Self {
        if let Ok(base) = std::env::var("DOCSORT_API_BASE") {
            self.api_base = base;
        }
        if let Some(key) = std::env::var("DOCSORT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            self.api_key = Some(key);
        }
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_excerpt_chars(mut self, chars: usize) -> Self {
        self.max_excerpt_chars = chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Batch orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Documents per chunk
    pub batch_size: usize,
    /// Pause between chunks when classifying with remote inference
    pub remote_batch_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            remote_batch_delay_ms: 1000,
        }
    }
}

impl BatchConfig {
    pub fn remote_batch_delay(&self) -> Duration {
        Duration::from_millis(self.remote_batch_delay_ms)
    }
}
