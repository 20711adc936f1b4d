use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

use super::Stage;
use crate::ai::{SharedProvider, extract_json_list};
use crate::pipeline::machine::{RunStage, StageOutcome};
use crate::pipeline::prompts;
use crate::pipeline::state::{PipelineState, StateDelta};
use crate::repo::generate_tree;
use crate::types::{DocError, Result};

/// Asks the model which files of the working copy are worth summarizing
pub struct SelectStage {
    provider: SharedProvider,
}

impl SelectStage {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage for SelectStage {
    fn stage(&self) -> RunStage {
        RunStage::Selecting
    }

    #[instrument(skip_all, fields(run_id = %state.run_id()))]
    async fn run(&self, state: &PipelineState) -> StageOutcome {
        let mut delta = StateDelta::new().log("Generating file tree for analysis...");

        let Some(root) = state.working_copy().map(Path::to_path_buf) else {
            return StageOutcome::Degraded(delta.log("No working copy available for file selection."));
        };

        let tree = match tree_of(root.clone()).await {
            Ok(tree) => tree,
            Err(e) => {
                return StageOutcome::Degraded(
                    delta.log(format!("Failed to generate file tree: {}", e)),
                );
            }
        };

        delta = delta.with_file_tree(tree.clone()).log(format!(
            "Step: Consulting {} for file selection...",
            self.provider.model()
        ));

        let response = match self.provider.generate(&prompts::file_selection(&tree)).await {
            Ok(response) => response,
            Err(e) => return StageOutcome::Degraded(delta.log(format!("LLM call failed: {}", e))),
        };

        let items = extract_json_list(&response.content);
        let (files, dropped) = resolve_selection(&root, &items);
        for path in dropped {
            delta = delta.log(format!("Ignoring path outside the repository: {}", path));
        }

        let count = files.len();
        delta = delta
            .with_selected_files(files)
            .log(format!("LLM selected {} files for analysis.", count));

        if count == 0 {
            StageOutcome::Degraded(delta)
        } else {
            StageOutcome::Success(delta)
        }
    }
}

async fn tree_of(root: PathBuf) -> Result<String> {
    tokio::task::spawn_blocking(move || generate_tree(&root))
        .await
        .map_err(|e| DocError::Workspace(format!("tree walk aborted: {}", e)))?
}

/// Turn the model's list into absolute paths under `root`.
///
/// Non-string items are skipped, a leading `/` is treated as repository
/// relative, and duplicates keep their first position. Existing paths must
/// also resolve inside `root` once symlinks are followed. Returns the kept
/// paths plus the entries dropped for escaping `root`.
pub fn resolve_selection(root: &Path, items: &[Value]) -> (Vec<PathBuf>, Vec<String>) {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut dropped = Vec::new();
    let real_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

    for item in items {
        let Some(raw) = item.as_str() else {
            debug!("Ignoring non-string selection entry: {}", item);
            continue;
        };

        let rel = raw.trim().trim_start_matches('/');
        if rel.is_empty() {
            continue;
        }

        let Some(clean) = confined(Path::new(rel)) else {
            dropped.push(raw.to_string());
            continue;
        };

        let path = root.join(clean);
        if !stays_inside(&path, &real_root) {
            dropped.push(raw.to_string());
            continue;
        }
        if !files.contains(&path) {
            files.push(path);
        }
    }

    (files, dropped)
}

/// Relative path with `.` removed, or `None` when it could leave its base
fn confined(rel: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// False when `path` exists but its real location is outside `real_root`.
///
/// Missing paths are kept; reading them fails later as a per-file error.
fn stays_inside(path: &Path, real_root: &Path) -> bool {
    match std::fs::canonicalize(path) {
        Ok(real) => real.starts_with(real_root),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // A dangling link still points somewhere; refuse it outright
            std::fs::symlink_metadata(path).is_err()
        }
        Err(e) => {
            debug!("Cannot resolve {}: {}", path.display(), e);
            false
        }
    }
}
