//! The four pipeline stages
//!
//! Each stage reads the current state and returns a `StageOutcome`; errors
//! inside a stage are converted into a degraded or fatal outcome here and
//! never reach the orchestrator as `Err`.

mod clone;
mod select;
mod summarize;
mod write;

pub use clone::CloneStage;
pub use select::{SelectStage, resolve_selection};
pub use summarize::{SummarizeStage, parse_summary};
pub use write::WriteStage;

use async_trait::async_trait;

use super::machine::{RunStage, StageOutcome};
use super::state::PipelineState;

#[async_trait]
pub trait Stage: Send + Sync {
    /// State-machine position this stage runs in
    fn stage(&self) -> RunStage;

    async fn run(&self, state: &PipelineState) -> StageOutcome;
}
