//! Run state machine
//!
//! ```text
//! CLONING → SELECTING → SUMMARIZING → WRITING → DONE
//!    └──────────────────────────────────┴────→ FAILED
//! ```

use std::fmt;

use super::state::StateDelta;
use crate::constants::nodes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStage {
    Cloning,
    Selecting,
    Summarizing,
    Writing,
    Done,
    Failed,
}

impl RunStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Name reported to progress listeners for the stage's completion
    pub fn node(&self) -> Option<&'static str> {
        match self {
            Self::Cloning => Some(nodes::CLONER),
            Self::Selecting => Some(nodes::MANAGER),
            Self::Summarizing => Some(nodes::SUMMARIZER),
            Self::Writing => Some(nodes::WRITER),
            Self::Done | Self::Failed => None,
        }
    }

    /// Transition taken once this stage finishes.
    ///
    /// Only a fatal outcome diverts to `Failed`; degraded outcomes move on.
    pub fn advance(self, fatal: bool) -> Self {
        if fatal && !self.is_terminal() {
            return Self::Failed;
        }
        match self {
            Self::Cloning => Self::Selecting,
            Self::Selecting => Self::Summarizing,
            Self::Summarizing => Self::Writing,
            Self::Writing => Self::Done,
            terminal => terminal,
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cloning => "CLONING",
            Self::Selecting => "SELECTING",
            Self::Summarizing => "SUMMARIZING",
            Self::Writing => "WRITING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// What a stage hands back to the orchestrator
#[derive(Debug)]
pub enum StageOutcome {
    /// Stage did everything it set out to do
    Success(StateDelta),
    /// Stage hit a recoverable failure; the delta carries the degraded value
    Degraded(StateDelta),
    /// Run cannot continue
    Fatal(StateDelta),
}

impl StageOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Degraded(_) => "degraded",
            Self::Fatal(_) => "fatal",
        }
    }

    pub fn delta(&self) -> &StateDelta {
        match self {
            Self::Success(d) | Self::Degraded(d) | Self::Fatal(d) => d,
        }
    }

    pub fn into_delta(self) -> StateDelta {
        match self {
            Self::Success(d) | Self::Degraded(d) | Self::Fatal(d) => d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_progression() {
        let mut stage = RunStage::Cloning;
        let mut seen = vec![stage];
        while !stage.is_terminal() {
            stage = stage.advance(false);
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                RunStage::Cloning,
                RunStage::Selecting,
                RunStage::Summarizing,
                RunStage::Writing,
                RunStage::Done
            ]
        );
    }

    #[test]
    fn test_fatal_diverts_to_failed() {
        assert_eq!(RunStage::Cloning.advance(true), RunStage::Failed);
        assert_eq!(RunStage::Writing.advance(true), RunStage::Failed);
        assert_eq!(RunStage::Done.advance(true), RunStage::Done);
    }

    #[test]
    fn test_node_names() {
        assert_eq!(RunStage::Selecting.node(), Some("manager"));
        assert_eq!(RunStage::Failed.node(), None);
        assert_eq!(RunStage::Summarizing.to_string(), "SUMMARIZING");
    }
}
