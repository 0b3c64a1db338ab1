//! TOML-based application configuration.
//!
//! Stores the tracker endpoint, the model endpoint, and the focus-check
//! tuning knobs. Stored at `~/.config/focuswatch/config.toml`.
//!
//! The model API key is never written to the file; it is read from the
//! environment variable named by `model.api_key_env`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::activity::DEFAULT_BUCKET_PREFIX;
use crate::classifier::DEFAULT_THRESHOLD_MS;
use crate::error::ConfigError;

/// Activity tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_base_url")]
    pub base_url: String,
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,
    #[serde(default = "default_event_limit")]
    pub event_limit: u32,
    /// Trailing aggregation window per poll, in milliseconds.
    #[serde(default = "default_past_ms")]
    pub past_ms: i64,
}

/// Language model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Focus session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Active time a window key must exceed before the model is consulted.
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
    /// Summary polling cadence during a session, in milliseconds.
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub focus: FocusConfig,
}

fn default_tracker_base_url() -> String {
    "http://127.0.0.1:5600".to_string()
}

fn default_bucket_prefix() -> String {
    DEFAULT_BUCKET_PREFIX.to_string()
}

fn default_event_limit() -> u32 {
    5_000
}

fn default_past_ms() -> i64 {
    60_000
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "FOCUSWATCH_API_KEY".to_string()
}

fn default_threshold_ms() -> u64 {
    DEFAULT_THRESHOLD_MS
}

fn default_cadence_ms() -> u64 {
    60_000
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_tracker_base_url(),
            bucket_prefix: default_bucket_prefix(),
            event_limit: default_event_limit(),
            past_ms: default_past_ms(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            name: default_model_name(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_threshold_ms(),
            cadence_ms: default_cadence_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            model: ModelConfig::default(),
            focus: FocusConfig::default(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(super::config_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults when the file does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// The model API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.model.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}
