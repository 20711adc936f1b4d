use async_trait::async_trait;
use tracing::instrument;

use super::Stage;
use crate::ai::SharedProvider;
use crate::constants::messages::{NO_ANALYSIS_DATA, SYNTHESIS_FAILED};
use crate::pipeline::machine::{RunStage, StageOutcome};
use crate::pipeline::prompts;
use crate::pipeline::state::{PipelineState, StateDelta};
use crate::repo::RunWorkspace;
use crate::types::{Result, file_name_or};

/// Synthesizes the final document and persists it in the run directory
pub struct WriteStage {
    provider: SharedProvider,
    workspace: RunWorkspace,
}

impl WriteStage {
    pub fn new(provider: SharedProvider, workspace: RunWorkspace) -> Self {
        Self {
            provider,
            workspace,
        }
    }

    async fn synthesize(&self, repo_url: &str, combined: &str) -> Result<String> {
        let response = self
            .provider
            .generate(&prompts::synthesis(repo_url, combined))
            .await?;
        self.workspace.persist(&response.content).await?;
        Ok(response.content)
    }
}

#[async_trait]
impl Stage for WriteStage {
    fn stage(&self) -> RunStage {
        RunStage::Writing
    }

    #[instrument(skip_all, fields(run_id = %state.run_id(), summaries = state.summaries().len()))]
    async fn run(&self, state: &PipelineState) -> StageOutcome {
        let blocks: Vec<String> = state
            .summaries()
            .iter()
            .filter_map(|record| record.synthesis_block())
            .collect();

        // Nothing usable to synthesize from; the model is not consulted.
        if blocks.is_empty() {
            return StageOutcome::Degraded(
                StateDelta::new()
                    .log("Writer Node: No summaries found to synthesize.")
                    .with_final_document(NO_ANALYSIS_DATA),
            );
        }

        let delta = StateDelta::new().log(format!(
            "Writer Node: Synthesizing {} file analyses into a README...",
            blocks.len()
        ));

        match self.synthesize(state.repo_url(), &blocks.join("\n\n")).await {
            Ok(document) => {
                let artifact = file_name_or(self.workspace.artifact_path(), "README.md");
                StageOutcome::Success(
                    delta
                        .log(format!("Writer Node: Successfully generated {}.", artifact))
                        .with_final_document(document),
                )
            }
            Err(e) => StageOutcome::Fatal(
                delta
                    .log(format!("Error in Writer Node: {}", e))
                    .with_final_document(SYNTHESIS_FAILED),
            ),
        }
    }
}
