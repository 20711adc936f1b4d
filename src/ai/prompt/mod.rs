//! Prompt container
//!
//! A prompt is one user message plus an optional system message. Builders for
//! the concrete pipeline prompts live in `pipeline::prompts`.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Role instruction sent ahead of the user message
    pub system: Option<String>,
    /// The request itself
    pub user: String,
}

impl Prompt {
    /// A user-only prompt
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            system: None,
            user: content.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Messages in chat order as `(role, content)` pairs
    pub fn messages(&self) -> Vec<(&'static str, &str)> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(("system", system.as_str()));
        }
        messages.push(("user", self.user.as_str()));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_order() {
        let prompt = Prompt::user("list files").with_system("be terse");
        assert_eq!(
            prompt.messages(),
            vec![("system", "be terse"), ("user", "list files")]
        );
    }

    #[test]
    fn test_user_only() {
        let prompt = Prompt::user("summarize");
        assert_eq!(prompt.messages(), vec![("user", "summarize")]);
    }
}
