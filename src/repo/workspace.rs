//! Per-run directory layout
//!
//! ```text
//! <data_dir>/<run_id>/                 run directory, owned by one run
//! <data_dir>/<run_id>/<slug>_<run_id>/ working copy
//! <data_dir>/<run_id>/<readme>         persisted document
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::pipeline::FALLBACK_REPO_SLUG;
use crate::types::{DocError, Result, RunId};

#[derive(Debug, Clone)]
pub struct RunWorkspace {
    run_dir: PathBuf,
    working_copy: PathBuf,
    artifact: PathBuf,
}

impl RunWorkspace {
    /// Derive the layout for `run_id`; nothing is created on disk yet
    pub fn new(data_dir: &Path, run_id: &RunId, repo_url: &str, readme_filename: &str) -> Self {
        let run_dir = data_dir.join(run_id.as_str());
        let working_copy = run_dir.join(format!("{}_{}", repo_slug(repo_url), run_id));
        let artifact = run_dir.join(readme_filename);
        Self {
            run_dir,
            working_copy,
            artifact,
        }
    }

    /// Create the run directory.
    ///
    /// Fails if the directory already exists, so two runs can never share one.
    pub async fn create(&self) -> Result<()> {
        if let Some(parent) = self.run_dir.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::create_dir(&self.run_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DocError::Workspace(format!(
                "Run directory {} already exists",
                self.run_dir.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn working_copy(&self) -> &Path {
        &self.working_copy
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    /// Write the final document, replacing any previous content
    pub async fn persist(&self, document: &str) -> Result<PathBuf> {
        tokio::fs::write(&self.artifact, document).await?;
        debug!("Persisted document to {}", self.artifact.display());
        Ok(self.artifact.clone())
    }

    /// Delete the working copy, keeping the run directory and artifact
    pub async fn remove_working_copy(&self) {
        match tokio::fs::remove_dir_all(&self.working_copy).await {
            Ok(()) => debug!("Removed working copy {}", self.working_copy.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove working copy {}: {}",
                self.working_copy.display(),
                e
            ),
        }
    }
}

/// Directory-safe name for a repository: last path segment without `.git`
pub fn repo_slug(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let last = last.strip_suffix(".git").unwrap_or(last);

    let slug: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if slug.is_empty() || slug.chars().all(|c| c == '.') {
        FALLBACK_REPO_SLUG.to_string()
    } else {
        slug
    }
}
