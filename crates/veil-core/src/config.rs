//! Pipeline configuration.
//!
//! The pipeline itself is stateless; the only tunable is how far the outer
//! Wrapped timestamp may be pushed into the past to blur timing
//! correlation between the moment of sending and what relays observe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted jitter window (7 days).
pub const MAX_JITTER_SECS: u64 = 7 * 24 * 3600;

/// Environment variable overriding [`PipelineConfig::jitter_secs`].
pub const JITTER_ENV: &str = "VEIL_JITTER_SECS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wrapped `created_at` is drawn uniformly from `[now - jitter_secs, now]`.
    /// Zero disables jitter.
    #[serde(default)]
    pub jitter_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { jitter_secs: 0 }
    }
}

impl PipelineConfig {
    pub fn with_jitter(jitter_secs: u64) -> Result<Self, ConfigError> {
        let config = Self { jitter_secs };
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overridden by `VEIL_JITTER_SECS` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(JITTER_ENV) {
            config.jitter_secs = value
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("Invalid {JITTER_ENV}: {e}")))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jitter_secs > MAX_JITTER_SECS {
            return Err(ConfigError::Invalid(format!(
                "jitter_secs must be <= {MAX_JITTER_SECS}, got {}",
                self.jitter_secs
            )));
        }
        Ok(())
    }
}
