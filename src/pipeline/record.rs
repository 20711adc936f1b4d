use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of summarizing one selected file
///
/// One record exists per selected file, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryRecord {
    Success {
        /// Name the model reported for the file (its basename when absent)
        file: String,
        /// Absolute path inside the working copy
        path: PathBuf,
        summary: String,
        #[serde(default)]
        exports: Vec<String>,
        #[serde(default)]
        deps: Vec<String>,
    },
    Error {
        /// Path of the file that could not be summarized
        file: String,
        error: String,
    },
}

impl SummaryRecord {
    pub fn error(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            file: file.into(),
            error: error.into(),
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Success { file, .. } | Self::Error { file, .. } => file,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The `--- File: <name> ---` block fed to the synthesis prompt; `None` for errors
    pub fn synthesis_block(&self) -> Option<String> {
        match self {
            Self::Success { file, summary, .. } => {
                Some(format!("--- File: {} ---\n{}", file, summary))
            }
            Self::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_block_skips_errors() {
        let ok = SummaryRecord::Success {
            file: "main.py".to_string(),
            path: PathBuf::from("/w/main.py"),
            summary: "Entry point.".to_string(),
            exports: vec![],
            deps: vec![],
        };
        let failed = SummaryRecord::error("/w/bad.py", "unreadable");

        assert_eq!(
            ok.synthesis_block().as_deref(),
            Some("--- File: main.py ---\nEntry point.")
        );
        assert!(failed.synthesis_block().is_none());
        assert_eq!(failed.file(), "/w/bad.py");
        assert!(!failed.is_success());
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_value(SummaryRecord::error("a.rs", "boom")).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error"], "boom");
    }
}
