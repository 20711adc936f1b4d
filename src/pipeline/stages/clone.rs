use async_trait::async_trait;
use tracing::instrument;

use super::Stage;
use crate::pipeline::machine::{RunStage, StageOutcome};
use crate::pipeline::state::{PipelineState, StateDelta, WorkingCopy};
use crate::repo::{RunWorkspace, SharedFetcher};
use crate::types::Result;

/// Fetches the working copy into the run's own directory
pub struct CloneStage {
    fetcher: SharedFetcher,
    workspace: RunWorkspace,
    depth: u32,
}

impl CloneStage {
    pub fn new(fetcher: SharedFetcher, workspace: RunWorkspace, depth: u32) -> Self {
        Self {
            fetcher,
            workspace,
            depth,
        }
    }

    async fn fetch(&self, url: &str) -> Result<()> {
        self.workspace.create().await?;
        self.fetcher
            .fetch(url, self.workspace.working_copy(), self.depth)
            .await
    }
}

#[async_trait]
impl Stage for CloneStage {
    fn stage(&self) -> RunStage {
        RunStage::Cloning
    }

    #[instrument(skip_all, fields(run_id = %state.run_id()))]
    async fn run(&self, state: &PipelineState) -> StageOutcome {
        let url = state.repo_url();
        let dest = self.workspace.working_copy();
        let dest = std::path::absolute(dest).unwrap_or_else(|_| dest.to_path_buf());

        let delta = StateDelta::new().log(format!(
            "Starting shallow clone of {} into {}",
            url,
            dest.display()
        ));

        match self.fetch(url).await {
            Ok(()) => StageOutcome::Success(
                delta
                    .log("Clone successful.")
                    .with_local_path(WorkingCopy::Ready(dest)),
            ),
            Err(e) => StageOutcome::Fatal(
                delta
                    .log(format!("Failed to clone repository: {}", e))
                    .with_local_path(WorkingCopy::Unavailable),
            ),
        }
    }
}
