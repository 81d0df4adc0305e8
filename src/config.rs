use crate::error::{Result, TranscacheError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    /// Per-request timeout for the translation provider, in seconds.
    pub timeout_secs: u64,
    /// Largest number of strings sent in one provider call.
    pub max_batch_size: usize,
    /// Number of entities translated at the same time by the background queue.
    pub concurrency: usize,
    /// SQLite database for the store. `None` keeps records in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            max_batch_size: 40,
            concurrency: 2,
            store_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str::<Config>(&contents).map_err(|e| {
                    TranscacheError::Config(format!("{}: {}", config_path.display(), e))
                })?;
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups. Unparseable numbers are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.openai_api_key = Some(key);
            }
        }
        if let Some(base) = lookup("TRANSCACHE_API_BASE") {
            self.api_base = base;
        }
        if let Some(model) = lookup("TRANSCACHE_MODEL") {
            self.model = model;
        }
        if let Some(path) = lookup("TRANSCACHE_STORE_PATH") {
            self.store_path = Some(PathBuf::from(path));
        }
        if let Some(c) = lookup("TRANSCACHE_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.concurrency = c;
        }
        if let Some(t) = lookup("TRANSCACHE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = t;
        }
        if let Some(b) = lookup("TRANSCACHE_MAX_BATCH").and_then(|v| v.parse().ok()) {
            self.max_batch_size = b;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(TranscacheError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(TranscacheError::Config(
                "Timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(TranscacheError::Config(
                "Max batch size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// False when no API key is configured; callers then serve source-language content only.
    pub fn translation_available(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("transcache").join("config.toml"))
    }
}
