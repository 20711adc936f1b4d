//! Progress events for an external observer
//!
//! Events are delivered over a bounded channel in the order they are emitted.
//! Once the receiving side goes away the emitter marks itself closed and
//! drops every later event without error.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

use crate::constants::pipeline::PROGRESS_CHANNEL_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A stage finished; `log` is the run's most recent log line
    Stage { node: String, log: String },
    /// Run reached DONE
    Completed { markdown: String },
    /// Run reached FAILED
    Failed { message: String },
}

#[derive(Debug)]
pub struct ProgressEmitter {
    tx: Option<mpsc::Sender<ProgressEvent>>,
    closed: AtomicBool,
}

impl ProgressEmitter {
    /// Emitter plus the receiving end, with the default capacity
    pub fn channel() -> (Self, mpsc::Receiver<ProgressEvent>) {
        Self::with_capacity(PROGRESS_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx: Some(tx),
                closed: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Emitter with no observer
    pub fn disabled() -> Self {
        Self {
            tx: None,
            closed: AtomicBool::new(true),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn emit(&self, event: ProgressEvent) {
        if self.is_closed() {
            return;
        }
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(event).await.is_err() {
            debug!("Progress receiver dropped; further events are discarded");
            self.closed.store(true, Ordering::Release);
        }
    }

    pub async fn stage(&self, node: &str, log: &str) {
        self.emit(ProgressEvent::Stage {
            node: node.to_string(),
            log: log.to_string(),
        })
        .await;
    }

    pub async fn completed(&self, markdown: &str) {
        self.emit(ProgressEvent::Completed {
            markdown: markdown.to_string(),
        })
        .await;
    }

    pub async fn failed(&self, message: &str) {
        self.emit(ProgressEvent::Failed {
            message: message.to_string(),
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (emitter, mut rx) = ProgressEmitter::channel();
        emitter.stage("cloner", "Clone successful.").await;
        emitter.completed("# Doc").await;
        drop(emitter);

        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::Stage {
                node: "cloner".to_string(),
                log: "Clone successful.".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::Completed {
                markdown: "# Doc".to_string()
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_closes_silently() {
        let (emitter, rx) = ProgressEmitter::channel();
        drop(rx);

        emitter.stage("cloner", "x").await;
        assert!(emitter.is_closed());
        emitter.failed("later").await;
    }

    #[tokio::test]
    async fn test_disabled_emitter_discards() {
        let emitter = ProgressEmitter::disabled();
        emitter.completed("ignored").await;
        assert!(emitter.is_closed());
    }
}
