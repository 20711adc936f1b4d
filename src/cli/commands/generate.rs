//! Generate Command
//!
//! Runs one pipeline in-process and renders its progress to the terminal.
//!
//! Usage:
//!   autodoc generate <repo_url> [--model <name>] [--output <file>]

use std::path::{Path, PathBuf};
use tokio::sync::mpsc::Receiver;

use super::{build_pipeline, load_config, runtime};
use crate::cli::Output;
use crate::constants::messages::NO_ANALYSIS_DATA;
use crate::pipeline::{ProgressEmitter, ProgressEvent, RunReport};
use crate::repo::validate_repo_url;
use crate::types::Result;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub repo_url: String,
    /// Explicit config file instead of the layered lookup
    pub config: Option<PathBuf>,
    pub model: Option<String>,
    /// Extra copy of the document outside the run directory
    pub output: Option<PathBuf>,
}

pub fn run(options: GenerateOptions, out: &Output) -> Result<RunReport> {
    let GenerateOptions {
        repo_url,
        config,
        model,
        output,
    } = options;
    validate_repo_url(&repo_url)?;

    let mut config = load_config(config.as_deref())?;
    if let Some(model) = model {
        config.llm.model = model;
    }
    config.validate()?;

    let pipeline = build_pipeline(&config)?;

    out.header(&format!("Documenting {}", repo_url));
    out.field("model", &config.llm.model);

    let report = runtime()?.block_on(async {
        let (emitter, events) = ProgressEmitter::channel();
        let renderer = render(events, out);
        let (report, ()) = tokio::join!(
            async {
                let report = pipeline.run(&repo_url, &emitter).await;
                drop(emitter);
                report
            },
            renderer
        );
        report
    });

    if report.succeeded() {
        if let Some(artifact) = &report.artifact {
            out.field("saved", &artifact.display().to_string());
        }
        if let (Some(target), Some(document)) = (&output, &report.document) {
            write_copy(target, document)?;
            out.field("copied", &target.display().to_string());
        }
    }

    Ok(report)
}

async fn render(mut events: Receiver<ProgressEvent>, out: &Output) {
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::Stage { node, log } => out.stage(&node, &log),
            ProgressEvent::Completed { markdown } if markdown == NO_ANALYSIS_DATA => {
                out.warning("No file could be analyzed; nothing was synthesized")
            }
            ProgressEvent::Completed { markdown } => out.success(&format!(
                "Documentation generated ({} lines)",
                markdown.lines().count()
            )),
            ProgressEvent::Failed { message } => out.error(&message),
        }
    }
}

fn write_copy(target: &Path, document: &str) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_copy_creates_parents() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("docs/out/README.md");

        write_copy(&target, "# Doc").unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "# Doc");
    }

    #[tokio::test]
    async fn test_render_consumes_until_closed() {
        let (emitter, events) = ProgressEmitter::channel();
        emitter.stage("cloner", "Clone successful.").await;
        emitter.completed("# Doc").await;
        drop(emitter);

        render(events, &Output::new(true)).await;
    }
}
