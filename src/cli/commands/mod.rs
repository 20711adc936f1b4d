//! Subcommand implementations
//!
//! Each command builds its own runtime; `main` stays synchronous.

pub mod config;
pub mod generate;
pub mod serve;

use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::ai::{SharedProvider, create_provider};
use crate::config::{Config, ConfigLoader};
use crate::pipeline::DocPipeline;
use crate::repo::GitFetcher;
use crate::types::{DocError, Result};

/// Effective configuration: the explicit `--config` file, or the usual layers
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Wire the configured model and `git` into a pipeline
pub fn build_pipeline(config: &Config) -> Result<DocPipeline> {
    Ok(pipeline_with(create_provider(&config.llm)?, config))
}

fn pipeline_with(provider: SharedProvider, config: &Config) -> DocPipeline {
    let fetcher = Arc::new(GitFetcher::new(config.pipeline.clone_timeout()));
    DocPipeline::new(provider, fetcher, config.pipeline.clone())
}

fn runtime() -> Result<Runtime> {
    Runtime::new().map_err(|e| DocError::Server(format!("Cannot start async runtime: {}", e)))
}
