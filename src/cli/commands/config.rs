//! Config Command
//!
//! Usage:
//!   autodoc config show [-f toml|json|yaml]
//!   autodoc config path
//!   autodoc config init [--force]

use std::path::Path;

use super::load_config;
use crate::cli::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::{DocError, Result};

/// Print the effective configuration (API key never included)
pub fn show(config_path: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", render(&config, format)?);
    Ok(())
}

pub fn path(out: &Output) -> Result<()> {
    match ConfigLoader::global_config_path() {
        Some(global) => out.field("global", &describe(&global)),
        None => out.warning("Cannot determine global config directory"),
    }
    out.field("project", &describe(&ConfigLoader::project_config_path()));
    Ok(())
}

pub fn init(force: bool, out: &Output) -> Result<()> {
    let path = ConfigLoader::init_global(force)?;
    out.success("Initialized global configuration");
    out.field("config", &path.display().to_string());
    Ok(())
}

fn render(config: &Config, format: &str) -> Result<String> {
    match format {
        "toml" => Ok(toml::to_string_pretty(config)?),
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "yaml" => serde_yaml::to_string(config)
            .map_err(|e| DocError::Config(format!("YAML output failed: {}", e))),
        other => Err(DocError::Config(format!(
            "Unknown format '{}'. Valid values: toml, json, yaml",
            other
        ))),
    }
}

fn describe(path: &Path) -> String {
    let state = if path.exists() { "" } else { " (not found)" };
    format!("{}{}", path.display(), state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> Config {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-hidden".to_string());
        config
    }

    #[test]
    fn test_render_formats_omit_api_key() {
        let config = config_with_key();
        for format in ["toml", "json", "yaml"] {
            let text = render(&config, format).unwrap();
            assert!(text.contains("gpt-4o"), "{} output: {}", format, text);
            assert!(!text.contains("sk-hidden"));
        }
    }

    #[test]
    fn test_render_rejects_unknown_format() {
        assert!(matches!(
            render(&Config::default(), "xml"),
            Err(DocError::Config(_))
        ));
    }
}
