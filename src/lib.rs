//! autodoc - README generation for remote repositories
//!
//! Clones a repository, lets a model pick the files worth reading,
//! summarizes each of them concurrently and synthesizes a README from the
//! summaries. Runs are driven from the CLI or over a WebSocket.
//!
//! ## Modules
//!
//! - [`pipeline`]: run state, stage state machine and the orchestrator
//! - [`ai`]: model providers, prompts, JSON extraction from replies
//! - [`repo`]: cloning, run workspaces, directory trees
//! - [`server`]: axum HTTP/WebSocket surface
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod repo;
pub mod server;
pub mod types;

pub use config::{Config, ConfigLoader};
pub use pipeline::{DocPipeline, ProgressEmitter, ProgressEvent, RunReport, RunStage};
pub use types::{DocError, Result, RunId};
