//! Leave node
//!
//! Pops control back to the supervisor after an out-of-scope escalation,
//! carrying the context forward as a tool result so the supervisor can
//! reconsider the request without the customer ever seeing the hand-off.

use crate::models::{ConversationState, MessageEntry};
use crate::Result;
use tracing::info;

const LEAVE_MESSAGE: &str =
    "Resuming dialog with the host assistant. The previous request fell outside the \
     active assistant's scope. Reflect on the conversation so far, reconsider the \
     user's latest request, and route it appropriately. Do not reveal this hand-off \
     to the user.";

pub fn leave(state: &mut ConversationState) -> Result<()> {
    let call = state
        .last_message()
        .and_then(MessageEntry::tool_call)
        .cloned()
        .ok_or_else(|| {
            crate::error::OrchestrationError::InvalidState(
                "Leave node reached without an escalation tool call".to_string(),
            )
        })?;

    info!("Escalation: returning control to the supervisor");
    state.push(MessageEntry::tool_result(call.id, call.name, LEAVE_MESSAGE));
    state.agent_name = None;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgentKind, InputData, Interaction, InteractionKind, Payload, ToolCall,
    };
    use serde_json::json;

    #[test]
    fn test_leave_appends_context_and_clears_owner() {
        let mut state = ConversationState::new(Payload {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            client_id: None,
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
        state.agent_name = Some(AgentKind::Trading);
        state.push(MessageEntry::Assistant {
            text: String::new(),
            tool_call: Some(ToolCall {
                id: "call-esc".to_string(),
                name: "AgentOutput".to_string(),
                args: json!({"message": "Not my area.", "status": "out_of_scope"}),
            }),
        });

        leave(&mut state).unwrap();

        assert_eq!(state.agent_name, None);
        match state.last_message().unwrap() {
            MessageEntry::ToolResult { call_id, .. } => assert_eq!(call_id, "call-esc"),
            other => panic!("unexpected entry: {other:?}"),
        }
    }
}
