//! Dynamic routers
//!
//! Pure, total functions over the latest state message. Every reachable
//! message shape maps to exactly one branch; a structurally invalid state
//! (latest entry is not an assistant message, or an undecodable tool call)
//! is a configuration error, not a runtime condition to recover from.

use crate::models::{AgentKind, ConversationState, MessageEntry, OutputStatus};
use crate::tools::ToolInvocation;
use crate::Result;
use tracing::debug;

/// Next node for a domain agent's latest reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    FinalResponse,
    Leave,
    HumanInLoop,
    ExecuteTool,
}

/// Next node for the supervisor's latest reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorRoute {
    ToAgent(AgentKind),
    FinalResponse,
}

fn latest_assistant(state: &ConversationState) -> Result<&MessageEntry> {
    match state.last_message() {
        Some(entry @ MessageEntry::Assistant { .. }) => Ok(entry),
        other => Err(crate::error::OrchestrationError::InvalidState(format!(
            "Router expected an assistant entry, found {:?}",
            other.map(std::mem::discriminant)
        ))),
    }
}

/// Route a domain agent's reply. Identical rule for all six agents.
pub fn route_agent(state: &ConversationState) -> Result<RouteDecision> {
    let entry = latest_assistant(state)?;

    let Some(call) = entry.tool_call() else {
        debug!("No tool call in latest message, routing to final response");
        return Ok(RouteDecision::FinalResponse);
    };

    let decision = match ToolInvocation::decode(call)? {
        ToolInvocation::FinalOutput(output) if output.status == OutputStatus::Result => {
            RouteDecision::FinalResponse
        }
        ToolInvocation::FinalOutput(_) => RouteDecision::Leave,
        ToolInvocation::AskBack(_) => RouteDecision::HumanInLoop,
        ToolInvocation::RemoteCall { .. }
        | ToolInvocation::FaqLookup { .. }
        | ToolInvocation::Route(_) => RouteDecision::ExecuteTool,
    };

    debug!(?decision, "Dynamic router decision");
    Ok(decision)
}

/// Route the supervisor's reply: a routing tool call transitions to that
/// agent, anything else ends at the supervisor's own final-response node.
pub fn route_supervisor(state: &ConversationState) -> Result<SupervisorRoute> {
    let entry = latest_assistant(state)?;

    let Some(call) = entry.tool_call() else {
        return Ok(SupervisorRoute::FinalResponse);
    };

    match ToolInvocation::decode(call) {
        Ok(ToolInvocation::Route(kind)) => {
            debug!(agent = %kind, "Supervisor routed to domain agent");
            Ok(SupervisorRoute::ToAgent(kind))
        }
        _ => Ok(SupervisorRoute::FinalResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        InputData, Interaction, InteractionKind, Payload, ToolCall,
    };
    use serde_json::json;

    fn base_state() -> ConversationState {
        ConversationState::new(Payload {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            client_id: None,
            role: "client".to_string(),
            token: "t".to_string(),
            interaction: Interaction {
                kind: InteractionKind::AgenticFlow,
                input: InputData {
                    text: "query".to_string(),
                    id: None,
                    from_date: None,
                    to_date: None,
                },
                request_id: "req".to_string(),
            },
        })
    }

    fn state_with_call(name: &str, args: serde_json::Value) -> ConversationState {
        let mut state = base_state();
        state.push(MessageEntry::Assistant {
            text: String::new(),
            tool_call: Some(ToolCall {
                id: "call-1".to_string(),
                name: name.to_string(),
                args,
            }),
        });
        state
    }

    #[test]
    fn test_no_tool_call_routes_to_final_response() {
        let mut state = base_state();
        state.push(MessageEntry::assistant_text("plain reply"));
        assert_eq!(route_agent(&state).unwrap(), RouteDecision::FinalResponse);
    }

    #[test]
    fn test_result_output_routes_to_final_response() {
        let state = state_with_call(
            "AgentOutput",
            json!({"message": "done", "status": "result"}),
        );
        assert_eq!(route_agent(&state).unwrap(), RouteDecision::FinalResponse);
    }

    #[test]
    fn test_out_of_scope_routes_to_leave() {
        let state = state_with_call(
            "AgentOutput",
            json!({"message": "not mine", "status": "out_of_scope"}),
        );
        assert_eq!(route_agent(&state).unwrap(), RouteDecision::Leave);
    }

    #[test]
    fn test_ask_back_routes_to_human_in_loop() {
        let state = state_with_call(
            "AskBackToUser",
            json!({"interrupt_message": "Which year?"}),
        );
        assert_eq!(route_agent(&state).unwrap(), RouteDecision::HumanInLoop);
    }

    #[test]
    fn test_other_tools_route_to_execution() {
        let remote = state_with_call("request_post", json!({"endpoint": "ledger_statement"}));
        assert_eq!(route_agent(&remote).unwrap(), RouteDecision::ExecuteTool);

        let faq = state_with_call("faq_knowledge_base", json!({"question": "What is DIS?"}));
        assert_eq!(route_agent(&faq).unwrap(), RouteDecision::ExecuteTool);
    }

    #[test]
    fn test_invalid_latest_entry_is_structural_error() {
        let mut state = base_state();
        state.push(MessageEntry::user("not an assistant entry"));
        assert!(route_agent(&state).is_err());
        assert!(route_supervisor(&state).is_err());
    }

    #[test]
    fn test_supervisor_routing_call_transitions() {
        let state = state_with_call("ReportsAgent", json!({"instruction": "ledger"}));
        assert_eq!(
            route_supervisor(&state).unwrap(),
            SupervisorRoute::ToAgent(AgentKind::Reports)
        );
    }

    #[test]
    fn test_supervisor_free_text_ends_at_final_response() {
        let mut state = base_state();
        state.push(MessageEntry::assistant_text("Hello!"));
        assert_eq!(
            route_supervisor(&state).unwrap(),
            SupervisorRoute::FinalResponse
        );
    }
}
