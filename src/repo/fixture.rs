//! In-memory repository for tests: writes a fixed file map instead of cloning

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::RepoFetcher;
use crate::types::{DocError, Result};

pub struct FixtureFetcher {
    files: Vec<(String, String)>,
    fail_with: Option<String>,
    fetches: AtomicUsize,
}

impl FixtureFetcher {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            fail_with: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            files: Vec::new(),
            fail_with: Some(reason.to_string()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, dest: &Path, _depth: u32) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail_with {
            return Err(DocError::fetch(url, reason.clone()));
        }

        tokio::fs::create_dir(dest).await?;
        for (rel, content) in &self.files {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, content).await?;
        }
        Ok(())
    }
}
