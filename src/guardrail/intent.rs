//! Supervisor intent guard
//!
//! A free-text supervisor reply may only be a greeting or a thank-you.
//! Anything else, including an apology, fails the guard and the turn
//! degrades to the fixed apology.

use crate::llm::{LanguageModel, ToolSchema};
use crate::models::MessageEntry;
use crate::prompts::INTENT_GUARD_PROMPT;
use crate::Result;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const INTENT_GUARD_TOOL: &str = "IntentGuard";

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum IntentType {
    Greeting,
    ThankYou,
    Apology,
    Other,
}

#[derive(Debug, Clone, Deserialize)]
struct IntentVerdict {
    intent_type: IntentType,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Clone)]
pub struct IntentOutcome {
    pub passed: bool,
    pub intent: IntentType,
    pub reason: String,
}

pub struct IntentGuard {
    model: Arc<dyn LanguageModel>,
}

impl IntentGuard {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn schema() -> ToolSchema {
        ToolSchema {
            name: INTENT_GUARD_TOOL,
            description:
                "Classify the response as Greeting, ThankYou, Apology, or Other.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "intent_type": {
                        "type": "string",
                        "enum": ["Greeting", "ThankYou", "Apology", "Other"],
                    },
                    "reason": {
                        "type": "string",
                        "description": "Brief justification for the classification."
                    }
                },
                "required": ["intent_type", "reason"],
            }),
        }
    }

    pub async fn classify(&self, response: &str) -> Result<IntentOutcome> {
        info!("Starting intent guard check");

        let schema = Self::schema();
        let history = vec![MessageEntry::user(format!("Response: {response}"))];

        let reply = self
            .model
            .invoke(INTENT_GUARD_PROMPT, std::slice::from_ref(&schema), &history)
            .await?;

        let call = reply.tool_call.ok_or_else(|| {
            crate::error::OrchestrationError::GuardrailError(
                "Intent guard returned no structured verdict".to_string(),
            )
        })?;

        let verdict: IntentVerdict = serde_json::from_value(call.args).map_err(|e| {
            crate::error::OrchestrationError::GuardrailError(format!(
                "Malformed intent verdict: {}",
                e
            ))
        })?;

        let passed = matches!(verdict.intent_type, IntentType::Greeting | IntentType::ThankYou);

        info!(passed, intent = ?verdict.intent_type, "Intent guard check complete");
        Ok(IntentOutcome {
            passed,
            intent: verdict.intent_type,
            reason: verdict.reason,
        })
    }
}
