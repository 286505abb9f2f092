//! Language-model capability seam
//!
//! The orchestration layer treats the model as an opaque capability: it
//! receives a system prompt, a bound tool set, and the trimmed message
//! history, and replies with free text and/or one structured tool call.

use crate::models::{MessageEntry, ToolCall};
use crate::Result;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub mod gemini;
pub use gemini::GeminiModel;

/// Declaration of a tool the model may invoke, JSON-schema parameters.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: String,
    pub parameters: Value,
}

/// One model reply: free text, a tool call, both, or (on a bad turn) neither.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub text: String,
    pub tool_call: Option<ToolCall>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_call: None,
        }
    }

    pub fn tool(call: ToolCall) -> Self {
        Self {
            text: String::new(),
            tool_call: Some(call),
        }
    }

    /// True when the reply carries neither a tool call nor non-empty text.
    pub fn is_empty(&self) -> bool {
        self.tool_call.is_none() && self.text.trim().is_empty()
    }
}

/// Trait for invoking the language-model backend
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(
        &self,
        system_prompt: &str,
        tools: &[ToolSchema],
        history: &[MessageEntry],
    ) -> Result<ModelReply>;
}

/// Scripted model for development & testing.
/// Replies are consumed front-to-back; an exhausted script yields empty
/// replies, which exercises the agents' retry path.
pub struct MockLanguageModel {
    script: Mutex<VecDeque<Result<ModelReply>>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn scripted(replies: Vec<ModelReply>) -> Self {
        let model = Self::new();
        {
            let mut script = model.script.try_lock().expect("fresh mock is uncontended");
            script.extend(replies.into_iter().map(Ok));
        }
        model
    }

    pub async fn push_reply(&self, reply: ModelReply) {
        self.script.lock().await.push_back(Ok(reply));
    }

    pub async fn push_error(&self, error: crate::error::OrchestrationError) {
        self.script.lock().await.push_back(Err(error));
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LanguageModel for MockLanguageModel {
    async fn invoke(
        &self,
        _system_prompt: &str,
        _tools: &[ToolSchema],
        _history: &[MessageEntry],
    ) -> Result<ModelReply> {
        let mut script = self.script.lock().await;
        script.pop_front().unwrap_or_else(|| Ok(ModelReply::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_script_in_order() {
        let model = MockLanguageModel::scripted(vec![
            ModelReply::text("first"),
            ModelReply::text("second"),
        ]);

        let first = model.invoke("", &[], &[]).await.unwrap();
        let second = model.invoke("", &[], &[]).await.unwrap();
        let exhausted = model.invoke("", &[], &[]).await.unwrap();

        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
        assert!(exhausted.is_empty());
    }
}
