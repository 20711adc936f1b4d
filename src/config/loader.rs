//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/autodoc/config.toml)
//! 3. Project config (./autodoc.toml)
//! 4. Environment variables (AUTODOC_* prefix, `__` between nesting levels)
//! 5. OPENAI_API_KEY / OPENAI_MODEL

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DocError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        let config: Config = Self::with_env(figment)
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only (plus environment)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.is_file() {
            return Err(DocError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));

        let config: Config = Self::with_env(figment)
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Layer environment variables on top of `figment`
    ///
    /// `AUTODOC_LLM__MODEL` maps to `llm.model`; the provider-standard
    /// `OPENAI_API_KEY` and `OPENAI_MODEL` take precedence.
    fn with_env(figment: Figment) -> Figment {
        figment
            .merge(Env::prefixed("AUTODOC_").split("__"))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "llm.api_key".into()),
            )
            .merge(
                Env::raw()
                    .only(&["OPENAI_MODEL"])
                    .map(|_| "llm.model".into()),
            )
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/autodoc/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(|p| PathBuf::from(p).join("autodoc"))
            .or_else(|| {
                ProjectDirs::from("", "", "autodoc").map(|dirs| dirs.config_dir().to_path_buf())
            })
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("autodoc.toml")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default global configuration file
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DocError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_toml())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config file content (TOML)
    pub fn default_config_toml() -> String {
        r#"# autodoc configuration
# OPENAI_API_KEY is read from the environment; never store it here.

version = "1.0"

[llm]
provider = "openai"
model = "gpt-4o"
timeout_secs = 120
temperature = 0.0
max_retries = 2

[server]
host = "127.0.0.1"
port = 8000

[pipeline]
data_dir = "data"
clone_depth = 1
summarize_concurrency = 4
readme_filename = "README.md"
keep_working_copy = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("autodoc.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9100

[pipeline]
summarize_concurrency = 8
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.pipeline.summarize_concurrency, 8);
        assert_eq!(config.pipeline.readme_filename, "README.md");
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("autodoc.toml");
        fs::write(&path, "[llm]\ntemperature = 5.0\n").unwrap();

        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(DocError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");

        assert!(matches!(
            ConfigLoader::load_from_file(&missing),
            Err(DocError::Config(msg)) if msg.contains("absent.toml")
        ));
    }

    #[test]
    fn test_default_config_toml_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("autodoc.toml");
        fs::write(&path, ConfigLoader::default_config_toml()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.pipeline.clone_depth, 1);
    }
}
