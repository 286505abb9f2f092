//! Final-response nodes
//!
//! Last gate before a candidate reply leaves the system. Rule-based guards
//! run first, then a grounding check matched to where the answer came from
//! (remote API call vs. FAQ retrieval). Failures feed corrective tool
//! results back into the owning agent instead of ending the turn. The
//! supervisor variant swaps grounding for the intent guard.

use crate::guardrail::{GroundingValidator, GuardVerdict, IntentGuard, OutputGuard};
use crate::llm::LanguageModel;
use crate::models::{
    AgentOutput, ConversationState, MessageEntry, OutputStatus, APOLOGY_MESSAGE,
    COMPLETED_SENTINEL, OUT_OF_SCOPE_MESSAGE,
};
use crate::tools::{ToolInvocation, AGENT_OUTPUT_TOOL, FAQ_TOOL, REMOTE_CALL_TOOL};
use crate::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOutcome {
    /// Turn finished; `state.response` holds the outgoing reply.
    Completed,
    /// A guard rejected the candidate; feedback appended, re-enter the agent.
    Reroute,
}

/// Tool name and content of the entry immediately preceding the latest one.
fn adjacent_tool_result(messages: &[MessageEntry]) -> Option<(&str, &str)> {
    if messages.len() < 2 {
        return None;
    }
    match &messages[messages.len() - 2] {
        MessageEntry::ToolResult {
            tool_name, content, ..
        } => Some((tool_name.as_str(), content.as_str())),
        _ => None,
    }
}

pub struct FinalResponseNode {
    grounding: GroundingValidator,
    intent: IntentGuard,
}

impl FinalResponseNode {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            grounding: GroundingValidator::new(model.clone()),
            intent: IntentGuard::new(model),
        }
    }

    /// Validate a domain agent's candidate reply.
    pub async fn review(&self, state: &mut ConversationState) -> Result<FinalOutcome> {
        let Some(call) = state.last_message().and_then(MessageEntry::tool_call).cloned() else {
            // Free text where a terminal tool call was expected: close the
            // turn with the generic out-of-scope reply.
            info!("No tool call in final message, ending turn out of scope");
            state.response = Some(AgentOutput {
                message: OUT_OF_SCOPE_MESSAGE.to_string(),
                status: OutputStatus::Result,
            });
            return Ok(FinalOutcome::Completed);
        };

        let ToolInvocation::FinalOutput(output) = ToolInvocation::decode(&call)? else {
            return Err(crate::error::OrchestrationError::InvalidState(
                "Final-response node reached without a terminal output call".to_string(),
            ));
        };
        if output.status != OutputStatus::Result {
            return Err(crate::error::OrchestrationError::InvalidState(
                "Escalation routed to a final-response node".to_string(),
            ));
        }

        // Rule-based guards first.
        if let GuardVerdict::Fail { reason } = OutputGuard::check(&output.message) {
            info!("Candidate reply failed rule-based validation, rerouting");
            state.push(MessageEntry::tool_result(call.id, AGENT_OUTPUT_TOOL, reason));
            return Ok(FinalOutcome::Reroute);
        }

        // Grounding check matched to the answer's source.
        let source = adjacent_tool_result(&state.messages)
            .map(|(name, content)| (name.to_string(), content.to_string()));

        match source.as_ref().map(|(name, content)| (name.as_str(), content)) {
            Some((REMOTE_CALL_TOOL, chunk)) => {
                let outcome = self.grounding.validate_api(&output.message, chunk).await?;
                if !outcome.passed {
                    info!("API grounding validation failed, rerouting");
                    state.push(MessageEntry::tool_result(
                        call.id,
                        AGENT_OUTPUT_TOOL,
                        outcome.issues,
                    ));
                    return Ok(FinalOutcome::Reroute);
                }
            }
            Some((FAQ_TOOL, chunk)) => {
                let query = state.payload.interaction.input.text.clone();
                let outcome = self
                    .grounding
                    .validate_conversational(&query, &output.message, chunk, "")
                    .await?;
                if !outcome.passed {
                    info!("Conversational grounding validation failed, rerouting");
                    state.push(MessageEntry::tool_result(
                        call.id,
                        AGENT_OUTPUT_TOOL,
                        outcome.issues,
                    ));
                    return Ok(FinalOutcome::Reroute);
                }
            }
            _ => {}
        }

        info!("Final response validation passed");
        state.response = Some(output);
        state.push(MessageEntry::tool_result(
            call.id,
            AGENT_OUTPUT_TOOL,
            COMPLETED_SENTINEL,
        ));
        Ok(FinalOutcome::Completed)
    }

    /// Validate the supervisor's own reply. Always ends the turn.
    pub async fn review_supervisor(&self, state: &mut ConversationState) -> Result<()> {
        let Some(MessageEntry::Assistant { text, tool_call }) = state.last_message() else {
            return Err(crate::error::OrchestrationError::InvalidState(
                "Supervisor final-response node without an assistant entry".to_string(),
            ));
        };

        // A leftover tool call means routing failed to match; degrade.
        if tool_call.is_some() {
            info!("Unmatched supervisor tool call, degrading to apology");
            state.response = Some(AgentOutput::apology());
            return Ok(());
        }

        let text = text.clone();
        let intent = self.intent.classify(&text).await?;
        let rules = OutputGuard::check(&text);

        if intent.passed && rules.passed() {
            info!(intent = ?intent.intent, "Supervisor reply passed validation");
            return Ok(());
        }

        info!(
            intent_passed = intent.passed,
            rules_passed = rules.passed(),
            "Supervisor reply failed validation, degrading to apology"
        );
        state.push(MessageEntry::assistant_text(APOLOGY_MESSAGE));
        state.response = Some(AgentOutput::apology());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, ModelReply};
    use crate::models::{InputData, Interaction, InteractionKind, Payload, ToolCall};
    use serde_json::json;

    fn base_state(query: &str) -> ConversationState {
        let mut state = ConversationState::new(Payload {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            client_id: None,
            role: "client".to_string(),
            token: "t".to_string(),
            interaction: Interaction {
                kind: InteractionKind::AgenticFlow,
                input: InputData {
                    text: query.to_string(),
                    id: None,
                    from_date: None,
                    to_date: None,
                },
                request_id: "req".to_string(),
            },
        });
        state.push(MessageEntry::user(query));
        state
    }

    fn final_output_call(message: &str) -> MessageEntry {
        MessageEntry::Assistant {
            text: String::new(),
            tool_call: Some(ToolCall {
                id: "call-out".to_string(),
                name: AGENT_OUTPUT_TOOL.to_string(),
                args: json!({"message": message, "status": "result"}),
            }),
        }
    }

    fn grounding_reply(relevance: &str, alignment: &str, issues: &str) -> ModelReply {
        ModelReply::tool(ToolCall {
            id: "call-v".to_string(),
            name: "GroundingValidator".to_string(),
            args: json!({
                "query_response_relevance": relevance,
                "response_chunk_alignment": alignment,
                "dialogue_continuity": "Coherent",
                "issues": issues,
            }),
        })
    }

    #[tokio::test]
    async fn test_pass_appends_completed_sentinel() {
        let node = FinalResponseNode::new(Arc::new(MockLanguageModel::new()));
        let mut state = base_state("ledger report");
        state.push(final_output_call("Your ledger report is ready."));

        let outcome = node.review(&mut state).await.unwrap();
        assert_eq!(outcome, FinalOutcome::Completed);
        assert_eq!(
            state.response.as_ref().unwrap().message,
            "Your ledger report is ready."
        );
        match state.last_message().unwrap() {
            MessageEntry::ToolResult { content, call_id, .. } => {
                assert_eq!(content, COMPLETED_SENTINEL);
                assert_eq!(call_id, "call-out");
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_banned_term_reroutes_with_feedback() {
        let node = FinalResponseNode::new(Arc::new(MockLanguageModel::new()));
        let mut state = base_state("ledger report");
        state.push(final_output_call("Share your clientId to continue."));

        let outcome = node.review(&mut state).await.unwrap();
        assert_eq!(outcome, FinalOutcome::Reroute);
        assert!(state.last_message().unwrap().is_tool_result());
        // The turn is not closed: no sentinel, no outgoing response set.
        assert!(state.response.is_none());
    }

    #[tokio::test]
    async fn test_api_grounding_runs_after_remote_call() {
        let model = MockLanguageModel::scripted(vec![grounding_reply(
            "Low",
            "Misaligned",
            "Response does not reflect the API data.",
        )]);
        let node = FinalResponseNode::new(Arc::new(model));

        let mut state = base_state("ledger report");
        state.push(MessageEntry::tool_result(
            "call-api",
            REMOTE_CALL_TOOL,
            "{\"balance\": 12000}",
        ));
        state.push(final_output_call("Your balance is 99."));

        let outcome = node.review(&mut state).await.unwrap();
        assert_eq!(outcome, FinalOutcome::Reroute);
        match state.last_message().unwrap() {
            MessageEntry::ToolResult { content, .. } => {
                assert!(content.contains("does not reflect"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_faq_grounding_pass_completes_turn() {
        let model = MockLanguageModel::scripted(vec![grounding_reply("High", "Aligned", "")]);
        let node = FinalResponseNode::new(Arc::new(model));

        let mut state = base_state("What is SPEED-e of NSDL?");
        state.push(MessageEntry::tool_result(
            "call-faq",
            FAQ_TOOL,
            "SPEED-e is NSDL's electronic delivery instruction facility.",
        ));
        state.push(final_output_call(
            "SPEED-e is NSDL's facility for submitting delivery instructions electronically.",
        ));

        let outcome = node.review(&mut state).await.unwrap();
        assert_eq!(outcome, FinalOutcome::Completed);
    }

    #[tokio::test]
    async fn test_free_text_ends_out_of_scope() {
        let node = FinalResponseNode::new(Arc::new(MockLanguageModel::new()));
        let mut state = base_state("something odd");
        state.push(MessageEntry::assistant_text("I think maybe..."));

        let outcome = node.review(&mut state).await.unwrap();
        assert_eq!(outcome, FinalOutcome::Completed);
        assert_eq!(
            state.response.as_ref().unwrap().message,
            OUT_OF_SCOPE_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_supervisor_greeting_passes_intent_guard() {
        let model = MockLanguageModel::scripted(vec![ModelReply::tool(ToolCall {
            id: "call-i".to_string(),
            name: "IntentGuard".to_string(),
            args: json!({"intent_type": "Greeting", "reason": "simple greeting"}),
        })]);
        let node = FinalResponseNode::new(Arc::new(model));

        let mut state = base_state("Hi");
        state.push(MessageEntry::assistant_text("Hello! How can I assist you today?"));
        state.response = Some(AgentOutput::result("Hello! How can I assist you today?"));

        node.review_supervisor(&mut state).await.unwrap();
        assert_eq!(
            state.response.as_ref().unwrap().message,
            "Hello! How can I assist you today?"
        );
    }

    #[tokio::test]
    async fn test_supervisor_substantive_reply_degrades_to_apology() {
        let model = MockLanguageModel::scripted(vec![ModelReply::tool(ToolCall {
            id: "call-i".to_string(),
            name: "IntentGuard".to_string(),
            args: json!({"intent_type": "Other", "reason": "explains margin rules"}),
        })]);
        let node = FinalResponseNode::new(Arc::new(model));

        let mut state = base_state("explain margin");
        state.push(MessageEntry::assistant_text("Margin is calculated by..."));
        state.response = Some(AgentOutput::result("Margin is calculated by..."));

        node.review_supervisor(&mut state).await.unwrap();
        assert_eq!(state.response.as_ref().unwrap().message, APOLOGY_MESSAGE);
    }
}
