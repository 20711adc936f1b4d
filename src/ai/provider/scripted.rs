//! Deterministic provider for tests
//!
//! Replies are chosen by the first rule whose needle occurs in the user
//! message; every prompt is recorded.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::{LlmProvider, LlmResponse};
use crate::ai::prompt::Prompt;
use crate::types::{ErrorCategory, LlmError, Result};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Sleep, then answer with the text
    Delayed(Duration, String),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn fail(s: impl Into<String>) -> Self {
        Self::Fail(s.into())
    }
}

pub struct ScriptedProvider {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Reply::fail("no scripted reply"),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer prompts whose user message contains `needle`
    pub fn on(mut self, needle: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, prompt: &Prompt) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.clone());

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.user.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Text(text) => Ok(LlmResponse::content_only(text)),
            Reply::Fail(message) => {
                Err(LlmError::with_provider(ErrorCategory::Unavailable, message, "scripted").into())
            }
            Reply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(LlmResponse::content_only(text))
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
