//! Configuration persistence.

mod config;

pub use config::{Config, FocusConfig, ModelConfig, TrackerConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Resolve (and create) the focuswatch config directory.
///
/// `FOCUSWATCH_ENV=dev` switches to a separate directory so development
/// runs do not clobber the real configuration.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSWATCH_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focuswatch-dev")
    } else {
        base_dir.join("focuswatch")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
