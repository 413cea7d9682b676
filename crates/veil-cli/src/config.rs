//! Configuration management for veil
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Unix: `~/.config/veil/veil.toml`
//! - Windows: `%APPDATA%\veil\veil.toml`
//!
//! Command-line flags take precedence over file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use veil_core::config::MAX_JITTER_SECS;
use veil_core::PipelineConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Veil configuration
///
/// # Example TOML
///
/// ```toml
/// [pipeline]
/// jitter_secs = 0  # 0 = wrapped timestamp is the send time
///
/// [relay]
/// channel_capacity = 1024
///
/// [identity]
/// key_path = "/path/to/secret.key"  # Unset = VEIL_SECRET_KEY
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// In-process relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Fan-out buffer; slow subscribers past this many envelopes lag
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    veil_core::transport::DEFAULT_CHANNEL_CAPACITY
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Identity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// File holding the hex secret key (unset = use VEIL_SECRET_KEY)
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("veil.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create default configuration file if it doesn't exist
    pub fn create_default_if_missing() -> Result<bool, ConfigError> {
        if let Some(path) = Self::default_path() {
            if !path.exists() {
                Self::default().save(&path)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.jitter_secs > MAX_JITTER_SECS {
            return Err(ConfigError::ValidationError(format!(
                "jitter_secs must be <= {MAX_JITTER_SECS}, got {}",
                self.pipeline.jitter_secs
            )));
        }

        if self.relay.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }

        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "veil", "veil")
}

/// CLI configuration overrides
///
/// Captures CLI flags that can override config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_format: Option<String>,
    pub debug: Option<bool>,
    pub jitter_secs: Option<u64>,
    pub key_path: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides, then re-validate the result.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(true) = overrides.debug {
            self.logging.level = "debug".to_string();
        }
        if let Some(jitter) = overrides.jitter_secs {
            self.pipeline.jitter_secs = jitter;
        }
        if let Some(ref path) = overrides.key_path {
            self.identity.key_path = Some(path.clone());
        }
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.pipeline.jitter_secs, 0);
        assert_eq!(config.relay.channel_capacity, 1024);
        assert!(config.identity.key_path.is_none());
        assert_eq!(config.output.format, "table");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default();
        config.relay.channel_capacity = 0;

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_validate_jitter_limit() {
        let mut config = Config::default();
        config.pipeline.jitter_secs = MAX_JITTER_SECS;
        assert!(config.validate().is_ok());

        config.pipeline.jitter_secs = MAX_JITTER_SECS + 1;
        assert!(config.validate().unwrap_err().to_string().contains("jitter_secs"));
    }

    #[test]
    fn test_validate_invalid_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid output format"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("veil.toml");

        let mut config = Config::default();
        config.pipeline.jitter_secs = 120;
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.pipeline.jitter_secs, 120);
        assert_eq!(loaded.relay.channel_capacity, config.relay.channel_capacity);
        assert_eq!(loaded.logging.level, config.logging.level);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("veil.toml");
        std::fs::write(&config_path, "[relay]\nchannel_capacity = 0\n").unwrap();

        assert!(matches!(
            Config::load(&config_path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_missing_custom_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");

        assert!(matches!(
            Config::load_from(Some(&missing)),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_cli_overrides() {
        let overrides = CliOverrides {
            output_format: Some("json".to_string()),
            debug: Some(true),
            jitter_secs: Some(3600),
            key_path: Some(PathBuf::from("/tmp/alice.key")),
        };

        let config = Config::default().with_overrides(&overrides).unwrap();

        assert_eq!(config.output.format, "json");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.pipeline.jitter_secs, 3600);
        assert_eq!(config.identity.key_path, Some(PathBuf::from("/tmp/alice.key")));
    }

    #[test]
    fn test_cli_override_is_validated() {
        let overrides = CliOverrides {
            jitter_secs: Some(MAX_JITTER_SECS + 1),
            ..Default::default()
        };

        assert!(Config::default().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[pipeline]
jitter_secs = 900

[relay]
channel_capacity = 16

[output]
format = "json"

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.pipeline.jitter_secs, 900);
        assert_eq!(config.relay.channel_capacity, 16);
        assert_eq!(config.output.format, "json");
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();

        assert_eq!(config.pipeline.jitter_secs, 0);
        assert_eq!(config.relay.channel_capacity, 1024);
        assert_eq!(config.output.format, "table");
    }
}
