//! Configuration Types
//!
//! All configuration structures with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{llm, network, pipeline};
use crate::types::{DocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// HTTP/WebSocket server settings
    pub server: ServerConfig,

    /// Pipeline run settings
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(DocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(DocError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.clone_timeout_secs == 0 {
            return Err(DocError::Config(
                "pipeline clone_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.clone_depth == 0 {
            return Err(DocError::Config(
                "pipeline clone_depth must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.summarize_concurrency == 0 {
            return Err(DocError::Config(
                "pipeline summarize_concurrency must be greater than 0".to_string(),
            ));
        }

        let name = &self.pipeline.readme_filename;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return Err(DocError::Config(format!(
                "pipeline readme_filename must be a plain file name, got '{}'",
                name
            )));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Model provider settings
///
/// The API key is read from the environment at startup and never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    pub provider: String,

    /// Model name
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Retries per model call for transient failures
    pub max_retries: u32,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: llm::DEFAULT_PROVIDER.to_string(),
            model: llm::DEFAULT_MODEL.to_string(),
            timeout_secs: llm::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            max_retries: llm::DEFAULT_MAX_RETRIES,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
            api_base: None,
            api_key: None,
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: network::DEFAULT_HOST.to_string(),
            port: network::DEFAULT_PORT,
        }
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory holding one sub-directory per run
    pub data_dir: PathBuf,

    /// Shallow clone depth
    pub clone_depth: u32,

    /// Clone timeout in seconds
    pub clone_timeout_secs: u64,

    /// Maximum files summarized concurrently
    pub summarize_concurrency: usize,

    /// File content beyond this many characters is truncated before prompting
    pub max_file_chars: usize,

    /// File name of the persisted document inside the run directory
    pub readme_filename: String,

    /// Keep the cloned working copy after the run finishes
    pub keep_working_copy: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(pipeline::DEFAULT_DATA_DIR),
            clone_depth: pipeline::DEFAULT_CLONE_DEPTH,
            clone_timeout_secs: pipeline::DEFAULT_CLONE_TIMEOUT_SECS,
            summarize_concurrency: pipeline::DEFAULT_SUMMARIZE_CONCURRENCY,
            max_file_chars: pipeline::DEFAULT_MAX_FILE_CHARS,
            readme_filename: pipeline::DEFAULT_README_FILENAME.to_string(),
            keep_working_copy: false,
        }
    }
}

impl PipelineConfig {
    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.pipeline.clone_depth, 1);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_invalid_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(matches!(config.validate(), Err(DocError::Config(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.pipeline.summarize_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_readme_filename_must_be_plain() {
        let mut config = Config::default();
        config.pipeline.readme_filename = "../escape.md".to_string();
        assert!(config.validate().is_err());

        config.pipeline.readme_filename = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_redacted_and_not_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());

        let debug = format!("{:?}", config.llm);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
