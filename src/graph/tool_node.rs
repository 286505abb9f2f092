//! Tool-execution node
//!
//! Executes the remote-API or FAQ-retrieval call from the latest assistant
//! entry and appends the result. Tool failures are surfaced to the owning
//! agent as corrective tool results, never swallowed and never fatal.

use crate::models::{ConversationState, MessageEntry};
use crate::tools::{
    retriever::format_chunks, KnowledgeRetriever, RemoteApi, ToolInvocation, FAQ_TOOL,
    REMOTE_CALL_TOOL,
};
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ToolExecNode {
    remote: Arc<dyn RemoteApi>,
    retriever: Arc<dyn KnowledgeRetriever>,
}

impl ToolExecNode {
    pub fn new(remote: Arc<dyn RemoteApi>, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        Self { remote, retriever }
    }

    pub async fn execute(&self, state: &mut ConversationState) -> Result<()> {
        let call = state
            .last_message()
            .and_then(MessageEntry::tool_call)
            .cloned()
            .ok_or_else(|| {
                crate::error::OrchestrationError::InvalidState(
                    "Tool-execution node reached without a tool call".to_string(),
                )
            })?;

        match ToolInvocation::decode(&call)? {
            ToolInvocation::RemoteCall { endpoint, params } => {
                info!(%endpoint, "Executing remote-API tool");
                let content = match self.remote.call(&endpoint, params, &state.payload).await {
                    Ok(value) => value.to_string(),
                    Err(error) => {
                        // Let the agent decide: retry, ask back, or escalate.
                        warn!(%endpoint, %error, "Remote-API call failed");
                        format!("Error: {}. Please fix your request and try again.", error)
                    }
                };
                state.push(MessageEntry::tool_result(call.id, REMOTE_CALL_TOOL, content));
            }
            ToolInvocation::FaqLookup { question } => {
                info!("Executing FAQ retrieval tool");
                let content = match self.retriever.retrieve(&question).await {
                    Ok(chunks) => format_chunks(&chunks),
                    Err(error) => {
                        warn!(%error, "FAQ retrieval failed");
                        format!("Error: {}. Please fix your request and try again.", error)
                    }
                };
                state.push(MessageEntry::tool_result(call.id, FAQ_TOOL, content));
            }
            ToolInvocation::FinalOutput(_)
            | ToolInvocation::AskBack(_)
            | ToolInvocation::Route(_) => {
                return Err(crate::error::OrchestrationError::InvalidState(
                    "Terminal tool call routed to the execution node".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputData, Interaction, InteractionKind, Payload, ToolCall};
    use crate::tools::{MockRemoteApi, StaticRetriever};
    use serde_json::json;

    fn state_with_call(name: &str, args: serde_json::Value) -> ConversationState {
        let mut state = ConversationState::new(Payload {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            client_id: Some("C1".to_string()),
            role: "client".to_string(),
            token: "t".to_string(),
            interaction: Interaction {
                kind: InteractionKind::AgenticFlow,
                input: InputData {
                    text: "q".to_string(),
                    id: None,
                    from_date: None,
                    to_date: None,
                },
                request_id: "req".to_string(),
            },
        });
        state.push(MessageEntry::user("q"));
        state.push(MessageEntry::Assistant {
            text: String::new(),
            tool_call: Some(ToolCall {
                id: "call-t".to_string(),
                name: name.to_string(),
                args,
            }),
        });
        state
    }

    #[tokio::test]
    async fn test_remote_call_appends_result() {
        let remote = MockRemoteApi::new();
        remote.stub("ledger_statement", json!({"balance": 500})).await;
        let node = ToolExecNode::new(Arc::new(remote), Arc::new(StaticRetriever::new()));

        let mut state = state_with_call(REMOTE_CALL_TOOL, json!({"endpoint": "ledger_statement"}));
        node.execute(&mut state).await.unwrap();

        match state.last_message().unwrap() {
            MessageEntry::ToolResult {
                call_id,
                tool_name,
                content,
            } => {
                assert_eq!(call_id, "call-t");
                assert_eq!(tool_name, REMOTE_CALL_TOOL);
                assert!(content.contains("500"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces_as_corrective_result() {
        let node = ToolExecNode::new(
            Arc::new(MockRemoteApi::new()),
            Arc::new(StaticRetriever::new()),
        );

        let mut state = state_with_call(REMOTE_CALL_TOOL, json!({"endpoint": "unknown_op"}));
        node.execute(&mut state).await.unwrap();

        match state.last_message().unwrap() {
            MessageEntry::ToolResult { content, .. } => {
                assert!(content.starts_with("Error:"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_faq_lookup_with_no_match_returns_fallback() {
        let node = ToolExecNode::new(
            Arc::new(MockRemoteApi::new()),
            Arc::new(StaticRetriever::new()),
        );

        let mut state = state_with_call(FAQ_TOOL, json!({"question": "What is DIS?"}));
        node.execute(&mut state).await.unwrap();

        match state.last_message().unwrap() {
            MessageEntry::ToolResult { content, .. } => {
                assert!(content.contains("couldn't find a specific answer"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_terminal_call_is_structural_error() {
        let node = ToolExecNode::new(
            Arc::new(MockRemoteApi::new()),
            Arc::new(StaticRetriever::new()),
        );
        let mut state = state_with_call(
            "AgentOutput",
            json!({"message": "done", "status": "result"}),
        );
        assert!(node.execute(&mut state).await.is_err());
    }
}
