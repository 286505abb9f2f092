//! Supervisor agent
//!
//! Top-level intent router bound with one routing tool per domain agent.
//! Trivial greetings and thanks are answered directly in free text;
//! everything else transitions to a domain agent.

use crate::agents::{all_profiles, AgentStepOutcome};
use crate::history::{trim_history, HISTORY_TOKEN_BUDGET};
use crate::llm::{LanguageModel, ToolSchema};
use crate::models::{AgentOutput, ConversationState, MessageEntry, OutputStatus};
use crate::prompts;
use crate::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::domain::MAX_MODEL_RETRIES;

const RETRY_INSTRUCTION: &str = "Respond with a real output.";

pub struct Supervisor {
    model: Arc<dyn LanguageModel>,
}

impl Supervisor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// One routing tool per domain agent.
    fn routing_tools() -> Vec<ToolSchema> {
        all_profiles()
            .iter()
            .map(|profile| ToolSchema {
                name: profile.kind.routing_tool_name(),
                description: profile.routing_description.to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "instruction": {
                            "type": "string",
                            "description": "The user's request, restated for the selected resource."
                        }
                    },
                    "required": ["instruction"],
                }),
            })
            .collect()
    }

    /// Run one supervisor step; mirrors the domain-agent retry contract.
    pub async fn step(&self, state: &mut ConversationState) -> Result<AgentStepOutcome> {
        let tools = Self::routing_tools();
        let prompt = prompts::supervisor_prompt();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let trimmed = trim_history(&state.messages, HISTORY_TOKEN_BUDGET);

            debug!(attempt = attempts, "Invoking supervisor model");

            match self.model.invoke(&prompt, &tools, &trimmed).await {
                Ok(reply) if !reply.is_empty() => {
                    state.push(MessageEntry::Assistant {
                        text: reply.text.clone(),
                        tool_call: reply.tool_call.clone(),
                    });

                    // A free-text reply is the supervisor's own answer; a
                    // routing call leaves the response to the target agent.
                    if reply.tool_call.is_none() {
                        state.response = Some(AgentOutput {
                            message: reply.text,
                            status: OutputStatus::Result,
                        });
                    }

                    info!("Supervisor step completed");
                    return Ok(AgentStepOutcome::Continue);
                }
                Ok(_) => {
                    warn!(attempt = attempts, "Supervisor returned neither tool call nor content");
                }
                Err(error) => {
                    warn!(attempt = attempts, %error, "Supervisor model invocation failed");
                }
            }

            if attempts >= MAX_MODEL_RETRIES {
                warn!("Supervisor retry ceiling reached, degrading to apology");
                state.response = Some(AgentOutput::apology());
                return Ok(AgentStepOutcome::Exhausted);
            }

            state.push(MessageEntry::user(RETRY_INSTRUCTION));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, ModelReply};
    use crate::models::{
        AgentKind, InputData, Interaction, InteractionKind, Payload, ToolCall, APOLOGY_MESSAGE,
    };

    fn state_with_query(text: &str) -> ConversationState {
        let payload = Payload {
            user_id: "u-1".to_string(),
            session_id: "s-1".to_string(),
            client_id: None,
            role: "client".to_string(),
            token: "tok".to_string(),
            interaction: Interaction {
                kind: InteractionKind::AgenticFlow,
                input: InputData {
                    text: text.to_string(),
                    id: None,
                    from_date: None,
                    to_date: None,
                },
                request_id: "req-1".to_string(),
            },
        };
        let mut state = ConversationState::new(payload);
        state.push(MessageEntry::user(text));
        state
    }

    #[test]
    fn test_one_routing_tool_per_domain() {
        let tools = Supervisor::routing_tools();
        assert_eq!(tools.len(), AgentKind::ALL.len());
        for kind in AgentKind::ALL {
            assert!(tools.iter().any(|t| t.name == kind.routing_tool_name()));
        }
    }

    #[tokio::test]
    async fn test_free_text_reply_becomes_response() {
        let supervisor = Supervisor::new(Arc::new(MockLanguageModel::scripted(vec![
            ModelReply::text("Hello! How can I assist you today?"),
        ])));
        let mut state = state_with_query("Hi");

        let outcome = supervisor.step(&mut state).await.unwrap();
        assert_eq!(outcome, AgentStepOutcome::Continue);
        assert_eq!(
            state.response.as_ref().unwrap().message,
            "Hello! How can I assist you today?"
        );
    }

    #[tokio::test]
    async fn test_routing_call_leaves_response_unset() {
        let supervisor = Supervisor::new(Arc::new(MockLanguageModel::scripted(vec![
            ModelReply::tool(ToolCall {
                id: "call-r".to_string(),
                name: AgentKind::Reports.routing_tool_name().to_string(),
                args: serde_json::json!({"instruction": "ledger report"}),
            }),
        ])));
        let mut state = state_with_query("Send me my ledger report");

        supervisor.step(&mut state).await.unwrap();
        assert!(state.response.is_none());
        assert!(state.last_message().unwrap().tool_call().is_some());
    }

    #[tokio::test]
    async fn test_supervisor_shares_the_retry_ceiling() {
        let supervisor = Supervisor::new(Arc::new(MockLanguageModel::new()));
        let mut state = state_with_query("Hi");

        let outcome = supervisor.step(&mut state).await.unwrap();
        assert_eq!(outcome, AgentStepOutcome::Exhausted);
        assert_eq!(state.response.as_ref().unwrap().message, APOLOGY_MESSAGE);
    }
}
