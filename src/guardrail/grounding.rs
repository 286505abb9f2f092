//! Classifier-based grounding validators
//!
//! Invokes the language model with a single structured verdict tool and
//! judges the verdict strictly: a response passes only when every scored
//! dimension lands in the top category. Two variants exist: conversational
//! grounding (three dimensions, for retrieval-backed answers) and API
//! grounding (two dimensions, for answers derived from a remote API call).

use crate::llm::{LanguageModel, ToolSchema};
use crate::models::MessageEntry;
use crate::prompts::{API_GROUNDING_PROMPT, CONVERSATIONAL_GROUNDING_PROMPT};
use crate::Result;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const GROUNDING_VALIDATOR_TOOL: &str = "GroundingValidator";

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum Relevance {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum Alignment {
    Aligned,
    #[serde(rename = "Partially Aligned")]
    PartiallyAligned,
    Misaligned,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum Continuity {
    Coherent,
    #[serde(rename = "Partially Coherent")]
    PartiallyCoherent,
    Incoherent,
}

#[derive(Debug, Clone, Deserialize)]
struct GroundingVerdict {
    query_response_relevance: Relevance,
    response_chunk_alignment: Alignment,
    #[serde(default)]
    dialogue_continuity: Option<Continuity>,
    #[serde(default)]
    issues: String,
}

/// Outcome of a grounding check. `issues` is the classifier's diagnostic,
/// fed back to the owning agent on failure.
#[derive(Debug, Clone)]
pub struct GroundingOutcome {
    pub passed: bool,
    pub issues: String,
}

pub struct GroundingValidator {
    model: Arc<dyn LanguageModel>,
}

impl GroundingValidator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn verdict_schema(with_continuity: bool) -> ToolSchema {
        let mut properties = json!({
            "query_response_relevance": {
                "type": "string",
                "enum": ["High", "Moderate", "Low"],
                "description": "Semantic match between the user query and the response."
            },
            "response_chunk_alignment": {
                "type": "string",
                "enum": ["Aligned", "Partially Aligned", "Misaligned"],
                "description": "Does the response accurately rely on the source content?"
            },
            "issues": {
                "type": "string",
                "description": "Brief explanation of any mismatch or hallucination identified."
            }
        });

        let mut required = vec!["query_response_relevance", "response_chunk_alignment", "issues"];
        if with_continuity {
            properties["dialogue_continuity"] = json!({
                "type": "string",
                "enum": ["Coherent", "Partially Coherent", "Incoherent"],
                "description": "Is the response logically coherent with the previous messages?"
            });
            required.push("dialogue_continuity");
        }

        ToolSchema {
            name: GROUNDING_VALIDATOR_TOOL,
            description: "Evaluate the consistency and contextual grounding of a response."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    async fn invoke_validator(
        &self,
        system_prompt: &str,
        user_text: String,
        with_continuity: bool,
    ) -> Result<GroundingVerdict> {
        let schema = Self::verdict_schema(with_continuity);
        let history = vec![MessageEntry::user(user_text)];

        let reply = self
            .model
            .invoke(system_prompt, std::slice::from_ref(&schema), &history)
            .await?;

        let call = reply.tool_call.ok_or_else(|| {
            crate::error::OrchestrationError::GuardrailError(
                "Grounding validator returned no structured verdict".to_string(),
            )
        })?;

        serde_json::from_value(call.args).map_err(|e| {
            crate::error::OrchestrationError::GuardrailError(format!(
                "Malformed grounding verdict: {}",
                e
            ))
        })
    }

    /// Full conversational grounding: relevance, alignment, and continuity
    /// must all score in the strict top category.
    pub async fn validate_conversational(
        &self,
        query: &str,
        response: &str,
        chunk: &str,
        dialogue_history: &str,
    ) -> Result<GroundingOutcome> {
        info!("Validating conversational grounding");

        let verdict = self
            .invoke_validator(
                CONVERSATIONAL_GROUNDING_PROMPT,
                format!(
                    "Query: {query}\n\nResponse: {response}\n\nRetrieved Chunk: {chunk}\n\nPrevious Dialogue (if any): {dialogue_history}"
                ),
                true,
            )
            .await?;

        let passed = verdict.query_response_relevance == Relevance::High
            && verdict.response_chunk_alignment == Alignment::Aligned
            && verdict.dialogue_continuity == Some(Continuity::Coherent);

        info!(passed, "Conversational grounding validation complete");
        Ok(GroundingOutcome {
            passed,
            issues: verdict.issues,
        })
    }

    /// API grounding: relevance and alignment between the candidate reply
    /// and the raw API result.
    pub async fn validate_api(&self, response: &str, chunk: &str) -> Result<GroundingOutcome> {
        info!("Validating API response grounding");

        let verdict = self
            .invoke_validator(
                API_GROUNDING_PROMPT,
                format!("Response: {response}\n\nRetrieved Chunk: {chunk}"),
                false,
            )
            .await?;

        let passed = verdict.query_response_relevance == Relevance::High
            && verdict.response_chunk_alignment == Alignment::Aligned;

        info!(passed, "API grounding validation complete");
        Ok(GroundingOutcome {
            passed,
            issues: verdict.issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, ModelReply};
    use crate::models::ToolCall;

    fn verdict_reply(args: serde_json::Value) -> ModelReply {
        ModelReply::tool(ToolCall {
            id: "call-v".to_string(),
            name: GROUNDING_VALIDATOR_TOOL.to_string(),
            args,
        })
    }

    #[tokio::test]
    async fn test_conversational_pass_requires_top_category_on_all_dimensions() {
        let model = MockLanguageModel::scripted(vec![verdict_reply(json!({
            "query_response_relevance": "High",
            "response_chunk_alignment": "Aligned",
            "dialogue_continuity": "Coherent",
            "issues": ""
        }))]);
        let validator = GroundingValidator::new(Arc::new(model));

        let outcome = validator
            .validate_conversational("What is SPEED-e?", "SPEED-e is...", "chunk", "")
            .await
            .unwrap();
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_partial_alignment_fails_with_issues() {
        let model = MockLanguageModel::scripted(vec![verdict_reply(json!({
            "query_response_relevance": "High",
            "response_chunk_alignment": "Partially Aligned",
            "dialogue_continuity": "Coherent",
            "issues": "Response adds details absent from the retrieved content."
        }))]);
        let validator = GroundingValidator::new(Arc::new(model));

        let outcome = validator
            .validate_conversational("query", "response", "chunk", "")
            .await
            .unwrap();
        assert!(!outcome.passed);
        assert!(outcome.issues.contains("absent"));
    }

    #[tokio::test]
    async fn test_api_grounding_scores_two_dimensions() {
        let model = MockLanguageModel::scripted(vec![verdict_reply(json!({
            "query_response_relevance": "High",
            "response_chunk_alignment": "Aligned",
            "issues": ""
        }))]);
        let validator = GroundingValidator::new(Arc::new(model));

        let outcome = validator.validate_api("reply", "raw api data").await.unwrap();
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_missing_verdict_is_a_guardrail_error() {
        let model = MockLanguageModel::scripted(vec![ModelReply::text("no tool call here")]);
        let validator = GroundingValidator::new(Arc::new(model));

        let result = validator.validate_api("reply", "chunk").await;
        assert!(result.is_err());
    }
}
