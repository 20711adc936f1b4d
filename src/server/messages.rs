//! Wire messages for the generate socket

use serde::{Deserialize, Serialize};

use crate::pipeline::ProgressEvent;

/// Inbound request starting a run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub repo_url: Option<String>,
}

impl GenerateRequest {
    /// Trimmed repository URL, `None` when absent or blank
    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Processing,
    Completed,
    Error,
}

/// Outbound frame; each variant serializes to a flat JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Progress {
        node: String,
        log: String,
        status: Status,
    },
    Completed {
        status: Status,
        markdown: String,
    },
    Error {
        status: Status,
        message: String,
    },
    /// Request refused before any run started
    Rejected { error: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            status: Status::Error,
            message: message.into(),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self::Rejected {
            error: error.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Every field is a plain string, serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","message":"serialization failed: {}"}}"#, e)
        })
    }
}

impl From<ProgressEvent> for ServerMessage {
    fn from(event: ProgressEvent) -> Self {
        match event {
            ProgressEvent::Stage { node, log } => Self::Progress {
                node,
                log,
                status: Status::Processing,
            },
            ProgressEvent::Completed { markdown } => Self::Completed {
                status: Status::Completed,
                markdown,
            },
            ProgressEvent::Failed { message } => Self::error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn wire(message: ServerMessage) -> Value {
        serde_json::from_str(&message.to_json()).unwrap()
    }

    #[test]
    fn test_progress_shape() {
        let message = ServerMessage::from(ProgressEvent::Stage {
            node: "cloner".into(),
            log: "Clone successful.".into(),
        });
        assert_eq!(
            wire(message),
            json!({"node": "cloner", "log": "Clone successful.", "status": "processing"})
        );
    }

    #[test]
    fn test_terminal_shapes() {
        let done = ServerMessage::from(ProgressEvent::Completed {
            markdown: "# Doc".into(),
        });
        assert_eq!(wire(done), json!({"status": "completed", "markdown": "# Doc"}));

        let failed = ServerMessage::from(ProgressEvent::Failed {
            message: "Failed to clone repository: nope".into(),
        });
        assert_eq!(
            wire(failed),
            json!({"status": "error", "message": "Failed to clone repository: nope"})
        );

        assert_eq!(
            wire(ServerMessage::rejected("No repository URL provided.")),
            json!({"error": "No repository URL provided."})
        );
    }

    #[test]
    fn test_request_url_normalization() {
        let parse = |s: &str| serde_json::from_str::<GenerateRequest>(s).unwrap();

        assert_eq!(parse(r#"{"repo_url": " https://h/o/r "}"#).repo_url(), Some("https://h/o/r"));
        assert_eq!(parse(r#"{"repo_url": "   "}"#).repo_url(), None);
        assert_eq!(parse(r#"{"other": 1}"#).repo_url(), None);
        assert_eq!(parse(r#"{"repo_url": null}"#).repo_url(), None);
    }
}
