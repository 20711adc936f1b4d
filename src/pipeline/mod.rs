//! Documentation Pipeline
//!
//! ```text
//! repo URL → clone → working copy → select → file list
//!          → summarize (fan-out/fan-in) → summaries → write → document
//! ```
//!
//! One `DocPipeline::run` call drives one run. Stages execute strictly in
//! sequence, each returning a delta the orchestrator merges into the run's
//! `PipelineState`. A progress event follows every stage, and exactly one
//! terminal event follows the last.

mod machine;
mod progress;
mod prompts;
mod record;
mod stages;
mod state;

pub use machine::{RunStage, StageOutcome};
pub use progress::{ProgressEmitter, ProgressEvent};
pub use record::SummaryRecord;
pub use stages::{
    CloneStage, SelectStage, Stage, SummarizeStage, WriteStage, parse_summary, resolve_selection,
};
pub use state::{LogEntry, PipelineState, Rejection, ScalarField, StateDelta, WorkingCopy};

use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::ai::SharedProvider;
use crate::config::PipelineConfig;
use crate::repo::{RunWorkspace, SharedFetcher};
use crate::types::RunId;

/// Everything a finished run leaves behind
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    /// `Done` or `Failed`
    pub stage: RunStage,
    pub document: Option<String>,
    /// Persisted document, when one was written
    pub artifact: Option<PathBuf>,
    pub log: Vec<LogEntry>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.stage == RunStage::Done
    }

    pub fn latest_log(&self) -> Option<&str> {
        self.log.last().map(|e| e.message.as_str())
    }
}

/// Orchestrator shared by every run of a process
#[derive(Clone)]
pub struct DocPipeline {
    provider: SharedProvider,
    fetcher: SharedFetcher,
    config: PipelineConfig,
}

impl DocPipeline {
    pub fn new(provider: SharedProvider, fetcher: SharedFetcher, config: PipelineConfig) -> Self {
        Self {
            provider,
            fetcher,
            config,
        }
    }

    /// Run all stages for `repo_url` under a fresh run identifier
    pub async fn run(&self, repo_url: &str, progress: &ProgressEmitter) -> RunReport {
        self.run_with_id(RunId::generate(), repo_url, progress).await
    }

    #[instrument(skip(self, run_id, progress), fields(run_id = %run_id))]
    pub async fn run_with_id(
        &self,
        run_id: RunId,
        repo_url: &str,
        progress: &ProgressEmitter,
    ) -> RunReport {
        let workspace = RunWorkspace::new(
            &self.config.data_dir,
            &run_id,
            repo_url,
            &self.config.readme_filename,
        );

        let mut state = PipelineState::new(run_id.clone(), repo_url);
        state.merge(
            RunStage::Cloning,
            StateDelta::new().log(format!("Connection established. Target: {}", repo_url)),
        );

        let mut stage = RunStage::Cloning;
        while !stage.is_terminal() {
            let Some(runner) = self.stage_for(stage, &workspace) else {
                break;
            };

            // Scalar ownership is checked against the stage that produced the delta
            let owner = runner.stage();
            let outcome = runner.run(&state).await;
            let fatal = outcome.is_fatal();
            info!(stage = %owner, outcome = outcome.label(), "Stage finished");

            state.merge(owner, outcome.into_delta());

            if let Some(node) = stage.node() {
                let fallback = format!("Node {} completed.", node);
                progress
                    .stage(node, state.latest_log().unwrap_or(&fallback))
                    .await;
            }

            // The clone sentinel stops the run whatever the outcome said.
            let halted = stage == RunStage::Cloning && state.working_copy().is_none();
            stage = stage.advance(fatal || halted);
        }

        match stage {
            RunStage::Done => {
                progress
                    .completed(state.final_document().unwrap_or_default())
                    .await
            }
            _ => {
                stage = RunStage::Failed;
                progress
                    .failed(state.latest_log().unwrap_or("Run failed."))
                    .await
            }
        }

        if !self.config.keep_working_copy {
            workspace.remove_working_copy().await;
        }

        let artifact = workspace.artifact_path();
        let artifact = match tokio::fs::try_exists(artifact).await {
            Ok(true) => Some(artifact.to_path_buf()),
            Ok(false) => None,
            Err(e) => {
                warn!("Cannot check {}: {}", artifact.display(), e);
                None
            }
        };

        info!(terminal = %stage, "Run finished");

        let (document, log) = state.into_parts();
        RunReport {
            run_id,
            stage,
            document,
            artifact,
            log,
        }
    }

    fn stage_for(&self, stage: RunStage, workspace: &RunWorkspace) -> Option<Box<dyn Stage>> {
        let runner: Box<dyn Stage> = match stage {
            RunStage::Cloning => Box::new(CloneStage::new(
                self.fetcher.clone(),
                workspace.clone(),
                self.config.clone_depth,
            )),
            RunStage::Selecting => Box::new(SelectStage::new(self.provider.clone())),
            RunStage::Summarizing => Box::new(SummarizeStage::new(
                self.provider.clone(),
                self.config.summarize_concurrency,
                self.config.max_file_chars,
            )),
            RunStage::Writing => Box::new(WriteStage::new(self.provider.clone(), workspace.clone())),
            RunStage::Done | RunStage::Failed => return None,
        };
        Some(runner)
    }
}
