//! Repository access
//!
//! - `RepoFetcher`: produces a shallow working copy of a remote repository
//! - `RunWorkspace`: the per-run directory layout keyed by run identifier
//! - `generate_tree`: directory listing for the selection prompt

mod tree;
mod workspace;
#[cfg(test)]
pub(crate) mod fixture;

pub use tree::generate_tree;
pub use workspace::{RunWorkspace, repo_slug};

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::ai::timeout::with_timeout;
use crate::types::{DocError, Result};

/// Fetch collaborator: place a copy of `url` at `dest`, `depth` commits deep
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path, depth: u32) -> Result<()>;
}

pub type SharedFetcher = Arc<dyn RepoFetcher>;

/// Shallow clone through the `git` executable
#[derive(Debug, Clone)]
pub struct GitFetcher {
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RepoFetcher for GitFetcher {
    async fn fetch(&self, url: &str, dest: &Path, depth: u32) -> Result<()> {
        validate_repo_url(url)?;

        debug!("git clone --depth {} {} {}", depth, url, dest.display());

        let output = Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg(depth.to_string())
            .arg("--quiet")
            .arg("--")
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = with_timeout(
            self.timeout,
            async { output.await.map_err(DocError::from) },
            "git clone",
        )
        .await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DocError::fetch(
                url,
                format!("git exited with {}: {}", output.status, stderr.trim()),
            ))
        }
    }
}

/// Accept URLs git can clone from: https/http/ssh/git/file, or scp-style `user@host:path`
pub fn validate_repo_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DocError::fetch(url, "empty repository URL"));
    }
    if url.starts_with('-') {
        return Err(DocError::fetch(url, "repository URL may not start with '-'"));
    }

    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "https" | "http" | "ssh" | "git" | "file") => Ok(()),
        Ok(parsed) => Err(DocError::fetch(
            url,
            format!("unsupported scheme '{}'", parsed.scheme()),
        )),
        Err(_) if is_scp_like(url) => Ok(()),
        Err(e) => Err(DocError::fetch(url, format!("invalid URL: {}", e))),
    }
}

fn is_scp_like(url: &str) -> bool {
    let Some((user_host, path)) = url.split_once(':') else {
        return false;
    };
    let Some((user, host)) = user_host.split_once('@') else {
        return false;
    };
    !user.is_empty()
        && !host.is_empty()
        && !path.is_empty()
        && !host.contains('/')
        && !user.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_repo_url() {
        assert!(validate_repo_url("https://github.com/owner/repo.git").is_ok());
        assert!(validate_repo_url("ssh://git@host/owner/repo").is_ok());
        assert!(validate_repo_url("git@github.com:owner/repo.git").is_ok());
        assert!(validate_repo_url("file:///tmp/repo").is_ok());

        assert!(validate_repo_url("").is_err());
        assert!(validate_repo_url("--upload-pack=evil").is_err());
        assert!(validate_repo_url("ftp://host/repo").is_err());
        assert!(validate_repo_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_git_fetcher_rejects_bad_url_before_spawning() {
        let temp = TempDir::new().unwrap();
        let err = GitFetcher::new(Duration::from_secs(5))
            .fetch("javascript:alert(1)", &temp.path().join("wc"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_git_fetcher_reports_missing_repository() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let url = format!("file://{}", missing.display());

        let result = GitFetcher::new(Duration::from_secs(30))
            .fetch(&url, &temp.path().join("wc"), 1)
            .await;
        // Either git is absent (Io) or it fails on the missing source (Fetch).
        assert!(matches!(result, Err(DocError::Fetch { .. }) | Err(DocError::Io(_))));
    }
}
