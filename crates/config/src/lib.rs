//! Engine configuration loading and validation for codeloom.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use codeloom_core::attachment::ContextInfoSource;

/// The engine configuration.
///
/// Maps directly to `codeloom.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum tool-call rounds within one turn before forcing a final
    /// answer.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Hard per-call timeout for tool callbacks, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Cap on results any single retrieval tool folds in per call.
    #[serde(default = "default_max_results_per_tool")]
    pub max_results_per_tool: usize,

    /// Sources that lose identity-key collisions to any other source.
    #[serde(default = "default_deprioritized_sources")]
    pub deprioritized_sources: Vec<ContextInfoSource>,
}

fn default_max_tool_rounds() -> u32 {
    8
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_max_results_per_tool() -> usize {
    5
}

fn default_deprioritized_sources() -> Vec<ContextInfoSource> {
    vec![ContextInfoSource::EditorMention]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            tool_timeout_secs: default_tool_timeout_secs(),
            max_results_per_tool: default_max_results_per_tool(),
            deprioritized_sources: default_deprioritized_sources(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific file path, then apply environment
    /// variable overrides (highest priority).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(timeout) = std::env::var("CODELOOM_TOOL_TIMEOUT_SECS") {
            config.tool_timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CODELOOM_TOOL_TIMEOUT_SECS is not a number: {timeout}"
                ))
            })?;
        }
        if let Ok(rounds) = std::env::var("CODELOOM_MAX_TOOL_ROUNDS") {
            config.max_tool_rounds = rounds.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CODELOOM_MAX_TOOL_ROUNDS is not a number: {rounds}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_rounds must be at least 1".into(),
            ));
        }
        if self.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tool_timeout_secs must be at least 1".into(),
            ));
        }
        if self.max_results_per_tool == 0 {
            return Err(ConfigError::ValidationError(
                "max_results_per_tool must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tool_rounds, 8);
        assert_eq!(config.tool_timeout_secs, 30);
        assert_eq!(
            config.deprioritized_sources,
            vec![ContextInfoSource::EditorMention]
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load_from(Path::new("/nonexistent/codeloom.toml")).unwrap();
        assert_eq!(config.max_tool_rounds, 8);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tool_rounds = 3").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.tool_timeout_secs, 30, "unset fields use defaults");
    }

    #[test]
    fn zero_rounds_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tool_rounds = 0").unwrap();

        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tool_rounds = \"lots\"").unwrap();

        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn deprioritized_sources_parse_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deprioritized_sources = [\"editor_mention\", \"tool_result\"]").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.deprioritized_sources.len(), 2);
    }
}
