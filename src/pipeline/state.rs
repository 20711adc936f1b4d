//! Pipeline state and delta merging
//!
//! Stages never touch `PipelineState` directly. They return a `StateDelta`
//! and the orchestrator folds it in with fixed per-field rules:
//!
//! | Field            | Kind   | Rule                           | Owner     |
//! |------------------|--------|--------------------------------|-----------|
//! | `local_path`     | scalar | set once                       | Cloning   |
//! | `file_tree`      | scalar | set once                       | Selecting |
//! | `final_document` | scalar | set once                       | Writing   |
//! | `selected_files` | list   | append, known entries skipped  | any       |
//! | `summaries`      | list   | append                         | any       |
//! | `log`            | list   | append                         | any       |

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::machine::RunStage;
use super::record::SummaryRecord;
use crate::types::RunId;

/// Result of the clone stage; `Unavailable` halts the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingCopy {
    Ready(PathBuf),
    Unavailable,
}

impl WorkingCopy {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Ready(path) => Some(path),
            Self::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

/// Scalar fields, each written by exactly one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    LocalPath,
    FileTree,
    FinalDocument,
}

impl ScalarField {
    pub fn owner(&self) -> RunStage {
        match self {
            Self::LocalPath => RunStage::Cloning,
            Self::FileTree => RunStage::Selecting,
            Self::FinalDocument => RunStage::Writing,
        }
    }
}

impl fmt::Display for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalPath => "local_path",
            Self::FileTree => "file_tree",
            Self::FinalDocument => "final_document",
        })
    }
}

/// Why a scalar write was dropped during a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The writing stage does not own the field
    NotOwner(ScalarField),
    /// The field already holds a value
    AlreadySet(ScalarField),
}

/// Partial update produced by one stage
#[derive(Debug, Default)]
pub struct StateDelta {
    pub local_path: Option<WorkingCopy>,
    pub file_tree: Option<String>,
    pub final_document: Option<String>,
    pub selected_files: Vec<PathBuf>,
    pub summaries: Vec<SummaryRecord>,
    pub log: Vec<String>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(mut self, message: impl Into<String>) -> Self {
        self.log.push(message.into());
        self
    }

    pub fn with_local_path(mut self, local_path: WorkingCopy) -> Self {
        self.local_path = Some(local_path);
        self
    }

    pub fn with_file_tree(mut self, tree: String) -> Self {
        self.file_tree = Some(tree);
        self
    }

    pub fn with_final_document(mut self, document: impl Into<String>) -> Self {
        self.final_document = Some(document.into());
        self
    }

    pub fn with_selected_files(mut self, files: Vec<PathBuf>) -> Self {
        self.selected_files = files;
        self
    }

    pub fn with_summaries(mut self, summaries: Vec<SummaryRecord>) -> Self {
        self.summaries = summaries;
        self
    }
}

/// The record threaded through one run
#[derive(Debug, Clone)]
pub struct PipelineState {
    run_id: RunId,
    repo_url: String,
    local_path: Option<WorkingCopy>,
    file_tree: Option<String>,
    selected_files: Vec<PathBuf>,
    summaries: Vec<SummaryRecord>,
    log: Vec<LogEntry>,
    final_document: Option<String>,
}

impl PipelineState {
    pub fn new(run_id: RunId, repo_url: impl Into<String>) -> Self {
        Self {
            run_id,
            repo_url: repo_url.into(),
            local_path: None,
            file_tree: None,
            selected_files: Vec::new(),
            summaries: Vec::new(),
            log: Vec::new(),
            final_document: None,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn local_path(&self) -> Option<&WorkingCopy> {
        self.local_path.as_ref()
    }

    /// Working copy root, if the clone produced one
    pub fn working_copy(&self) -> Option<&Path> {
        self.local_path.as_ref().and_then(WorkingCopy::path)
    }

    pub fn file_tree(&self) -> Option<&str> {
        self.file_tree.as_deref()
    }

    pub fn selected_files(&self) -> &[PathBuf] {
        &self.selected_files
    }

    pub fn summaries(&self) -> &[SummaryRecord] {
        &self.summaries
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn latest_log(&self) -> Option<&str> {
        self.log.last().map(|e| e.message.as_str())
    }

    pub fn final_document(&self) -> Option<&str> {
        self.final_document.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<LogEntry>) {
        (self.final_document, self.log)
    }

    /// Fold `delta`, produced by `stage`, into the state.
    ///
    /// Returns the scalar writes that were dropped.
    pub fn merge(&mut self, stage: RunStage, delta: StateDelta) -> Vec<Rejection> {
        let StateDelta {
            local_path,
            file_tree,
            final_document,
            selected_files,
            summaries,
            log,
        } = delta;

        let mut rejected = Vec::new();
        set_once(
            &mut self.local_path,
            local_path,
            ScalarField::LocalPath,
            stage,
            &mut rejected,
        );
        set_once(
            &mut self.file_tree,
            file_tree,
            ScalarField::FileTree,
            stage,
            &mut rejected,
        );
        set_once(
            &mut self.final_document,
            final_document,
            ScalarField::FinalDocument,
            stage,
            &mut rejected,
        );

        for file in selected_files {
            if !self.selected_files.contains(&file) {
                self.selected_files.push(file);
            }
        }
        self.summaries.extend(summaries);

        for message in log {
            info!(run_id = %self.run_id, stage = %stage, "{}", message);
            self.log.push(LogEntry::now(message));
        }

        for rejection in &rejected {
            warn!(run_id = %self.run_id, stage = %stage, ?rejection, "Scalar write rejected");
        }
        rejected
    }
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: Option<T>,
    field: ScalarField,
    stage: RunStage,
    rejected: &mut Vec<Rejection>,
) {
    let Some(value) = value else {
        return;
    };
    if field.owner() != stage {
        rejected.push(Rejection::NotOwner(field));
    } else if slot.is_some() {
        rejected.push(Rejection::AlreadySet(field));
    } else {
        *slot = Some(value);
    }
}
