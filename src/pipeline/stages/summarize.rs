//! Fan-out/fan-in over the selected files
//!
//! Every file is summarized independently with bounded concurrency. Results
//! land in a slot indexed by the file's position in the selection, so output
//! order never depends on completion order and no file can go missing.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument, warn};

use super::Stage;
use crate::ai::{SharedProvider, extract_json_object};
use crate::pipeline::machine::{RunStage, StageOutcome};
use crate::pipeline::prompts;
use crate::pipeline::record::SummaryRecord;
use crate::pipeline::state::{PipelineState, StateDelta};
use crate::types::{DocError, Result, file_name_or, truncate_chars};

pub struct SummarizeStage {
    provider: SharedProvider,
    concurrency: usize,
    max_file_chars: usize,
}

impl SummarizeStage {
    pub fn new(provider: SharedProvider, concurrency: usize, max_file_chars: usize) -> Self {
        Self {
            provider,
            concurrency: concurrency.max(1),
            max_file_chars,
        }
    }

    /// Summarize every file, returning one record per input in input order
    pub async fn summarize_all(&self, files: &[PathBuf]) -> Vec<SummaryRecord> {
        let mut slots: Vec<Option<SummaryRecord>> = vec![None; files.len()];

        let mut results = futures::stream::iter(files.iter().cloned().enumerate())
            .map(|(index, path)| async move { (index, self.summarize_one(&path).await) })
            .buffer_unordered(self.concurrency);

        while let Some((index, record)) = results.next().await {
            slots[index] = Some(record);
        }

        slots
            .into_iter()
            .zip(files)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| {
                    SummaryRecord::error(path.display().to_string(), "summary task did not finish")
                })
            })
            .collect()
    }

    async fn summarize_one(&self, path: &Path) -> SummaryRecord {
        match self.try_summarize(path).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to summarize {}: {}", path.display(), e);
                SummaryRecord::error(path.display().to_string(), e.to_string())
            }
        }
    }

    async fn try_summarize(&self, path: &Path) -> Result<SummaryRecord> {
        let content = read_prefix(path, self.max_file_chars).await?;
        let file_name = file_name_or(path, "unknown");
        let content = truncate_chars(&content, self.max_file_chars);

        let response = self
            .provider
            .generate(&prompts::file_summary(&file_name, &content))
            .await?;

        debug!("Summary response for {}: {} chars", file_name, response.content.len());
        parse_summary(&response.content, path)
    }
}

/// Read enough of `path` to cover `max_chars` characters.
///
/// At most four bytes per character are read. A multi-byte character cut at
/// the read limit is dropped; invalid UTF-8 anywhere else is an error.
async fn read_prefix(path: &Path, max_chars: usize) -> Result<String> {
    let limit = (max_chars as u64).saturating_mul(4).saturating_add(4);
    let mut bytes = Vec::new();
    tokio::fs::File::open(path)
        .await?
        .take(limit)
        .read_to_end(&mut bytes)
        .await?;
    let cut_short = bytes.len() as u64 == limit;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) if cut_short && e.utf8_error().error_len().is_none() => {
            let valid = e.utf8_error().valid_up_to();
            let mut bytes = e.into_bytes();
            bytes.truncate(valid);
            String::from_utf8(bytes).map_err(|e| invalid_utf8(path, e))
        }
        Err(e) => Err(invalid_utf8(path, e)),
    }
}

fn invalid_utf8(path: &Path, e: std::string::FromUtf8Error) -> DocError {
    DocError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("{} is not valid UTF-8: {}", path.display(), e),
    ))
}

/// Interpret a model reply as a summary of `path`.
///
/// Requires an object with a string `summary`; `file` defaults to the
/// basename and `exports`/`deps` to empty lists.
pub fn parse_summary(text: &str, path: &Path) -> Result<SummaryRecord> {
    let display = path.display().to_string();
    let object = extract_json_object(text)
        .ok_or_else(|| DocError::parse(&display, "response is not a JSON object"))?;

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| DocError::parse(&display, "response has no string \"summary\" field"))?
        .to_string();

    let file = object
        .get("file")
        .and_then(Value::as_str)
        .filter(|f| !f.trim().is_empty())
        .map(String::from)
        .unwrap_or_else(|| file_name_or(path, "unknown"));

    Ok(SummaryRecord::Success {
        file,
        path: path.to_path_buf(),
        summary,
        exports: string_list(&object, "exports"),
        deps: string_list(&object, "deps"),
    })
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl Stage for SummarizeStage {
    fn stage(&self) -> RunStage {
        RunStage::Summarizing
    }

    #[instrument(skip_all, fields(run_id = %state.run_id(), files = state.selected_files().len()))]
    async fn run(&self, state: &PipelineState) -> StageOutcome {
        let files = state.selected_files();
        let records = self.summarize_all(files).await;

        let ok = records.iter().filter(|r| r.is_success()).count();
        let failed = records.len() - ok;
        let delta = StateDelta::new()
            .log(format!(
                "Summarized {}/{} files ({} failed).",
                ok,
                records.len(),
                failed
            ))
            .with_summaries(records);

        if failed > 0 || files.is_empty() {
            StageOutcome::Degraded(delta)
        } else {
            StageOutcome::Success(delta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::{Reply, ScriptedProvider};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn reply(file: &str) -> Reply {
        Reply::text(format!(
            r#"{{"file": "{}", "summary": "about {}", "exports": ["f"], "deps": []}}"#,
            file, file
        ))
    }

    #[test]
    fn test_parse_summary_defaults() {
        let record = parse_summary(r#"{"summary": "does things"}"#, Path::new("/w/src/lib.rs")).unwrap();
        match record {
            SummaryRecord::Success {
                file,
                exports,
                deps,
                path,
                ..
            } => {
                assert_eq!(file, "lib.rs");
                assert!(exports.is_empty());
                assert!(deps.is_empty());
                assert_eq!(path, PathBuf::from("/w/src/lib.rs"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_summary_requires_summary_string() {
        assert!(parse_summary(r#"{"file": "a.rs"}"#, Path::new("a.rs")).is_err());
        assert!(parse_summary(r#"{"summary": 3}"#, Path::new("a.rs")).is_err());
        assert!(parse_summary("no json here", Path::new("a.rs")).is_err());
    }

    #[tokio::test]
    async fn test_order_preserved_despite_completion_order() {
        let temp = TempDir::new().unwrap();
        let names = ["slow.py", "fast.py", "mid.py"];
        let files: Vec<PathBuf> = names
            .iter()
            .map(|n| {
                let p = temp.path().join(n);
                std::fs::write(&p, "code").unwrap();
                p
            })
            .collect();

        let provider = Arc::new(
            ScriptedProvider::new()
                .on(
                    "file: slow.py",
                    Reply::Delayed(Duration::from_millis(80), r#"{"summary": "slow"}"#.into()),
                )
                .on(
                    "file: mid.py",
                    Reply::Delayed(Duration::from_millis(30), r#"{"summary": "mid"}"#.into()),
                )
                .on("file: fast.py", reply("fast.py")),
        );
        let stage = SummarizeStage::new(provider, 3, 1000);

        let records = stage.summarize_all(&files).await;
        let order: Vec<&str> = records.iter().map(|r| r.file()).collect();
        assert_eq!(order, vec!["slow.py", "fast.py", "mid.py"]);
    }

    #[tokio::test]
    async fn test_read_failure_isolated_to_its_file() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.py");
        std::fs::write(&good, "x = 1").unwrap();
        let missing = temp.path().join("missing.py");

        let provider = Arc::new(ScriptedProvider::new().otherwise(reply("good.py")));
        let stage = SummarizeStage::new(provider.clone(), 2, 1000);

        let records = stage.summarize_all(&[missing.clone(), good]).await;
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], SummaryRecord::Error { file, .. } if *file == missing.display().to_string()));
        assert!(records[1].is_success());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_every_file_failing_keeps_length() {
        let temp = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..5)
            .map(|i| {
                let p = temp.path().join(format!("f{}.rs", i));
                std::fs::write(&p, "fn main() {}").unwrap();
                p
            })
            .collect();

        let provider = Arc::new(ScriptedProvider::new().otherwise(Reply::fail("timeout")));
        let stage = SummarizeStage::new(provider, 2, 1000);

        let mut state = PipelineState::new(crate::types::RunId::new("x"), "u");
        state.merge(
            RunStage::Selecting,
            StateDelta::new().with_selected_files(files.clone()),
        );

        let outcome = stage.run(&state).await;
        assert!(matches!(outcome, StageOutcome::Degraded(_)));
        let delta = outcome.into_delta();
        assert_eq!(delta.summaries.len(), files.len());
        assert!(delta.summaries.iter().all(|r| !r.is_success()));
        assert_eq!(delta.log, vec!["Summarized 0/5 files (5 failed).".to_string()]);
    }

    #[tokio::test]
    async fn test_long_files_truncated_before_prompting() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.txt");
        std::fs::write(&path, "a".repeat(500)).unwrap();

        let provider = Arc::new(ScriptedProvider::new().otherwise(reply("big.txt")));
        let stage = SummarizeStage::new(provider.clone(), 1, 100);
        stage.summarize_all(&[path]).await;

        let prompt = &provider.prompts()[0];
        assert!(prompt.user.contains("... [truncated]"));
        assert!(!prompt.user.contains(&"a".repeat(101)));
    }

    #[tokio::test]
    async fn test_read_prefix_is_bounded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("huge.log");
        std::fs::write(&path, "a".repeat(10_000)).unwrap();

        let text = read_prefix(&path, 10).await.unwrap();
        assert_eq!(text.len(), 44);
    }

    #[tokio::test]
    async fn test_read_prefix_drops_split_character() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("accents.txt");
        // 1 + 2 * 20 bytes; the 16-byte limit splits the eighth 'é'
        std::fs::write(&path, format!("a{}", "é".repeat(20))).unwrap();

        let text = read_prefix(&path, 3).await.unwrap();
        assert_eq!(text, format!("a{}", "é".repeat(7)));
    }

    #[tokio::test]
    async fn test_read_prefix_rejects_binary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.dat");
        std::fs::write(&path, [0x66, 0xff, 0xfe, 0x00]).unwrap();

        assert!(read_prefix(&path, 100).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_selection_yields_empty_summaries() {
        let provider = Arc::new(ScriptedProvider::new());
        let stage = SummarizeStage::new(provider.clone(), 4, 1000);
        let state = PipelineState::new(crate::types::RunId::new("e"), "u");

        let delta = stage.run(&state).await.into_delta();
        assert!(delta.summaries.is_empty());
        assert_eq!(provider.calls(), 0);
    }
}
