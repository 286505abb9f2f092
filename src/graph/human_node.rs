//! Human-in-loop node
//!
//! Validates an ask-back prompt through the rule-based guards, then
//! suspends the turn by recording a pending interrupt. A guard failure
//! reroutes to the owning agent without suspending. Resumption appends
//! exactly one tool result keyed to the original correlation id.

use crate::guardrail::{GuardVerdict, OutputGuard};
use crate::models::{ConversationState, MessageEntry, PendingInterrupt};
use crate::tools::{ToolInvocation, ASK_BACK_TOOL};
use crate::Result;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HumanNodeOutcome {
    /// Ask-back text failed a guard; feedback appended, re-enter the agent.
    Rerouted,
    /// Turn suspended; `prompt` is surfaced to the caller.
    Suspended { prompt: String },
}

/// Engage the human-in-loop node for the agent owning the turn.
pub fn engage(state: &mut ConversationState) -> Result<HumanNodeOutcome> {
    let agent = state.agent_name.ok_or_else(|| {
        crate::error::OrchestrationError::InvalidState(
            "Human-in-loop node reached without an owning agent".to_string(),
        )
    })?;

    let call = state
        .last_message()
        .and_then(MessageEntry::tool_call)
        .cloned()
        .ok_or_else(|| {
            crate::error::OrchestrationError::InvalidState(
                "Human-in-loop node reached without a tool call".to_string(),
            )
        })?;

    let ToolInvocation::AskBack(ask) = ToolInvocation::decode(&call)? else {
        return Err(crate::error::OrchestrationError::InvalidState(
            "Human-in-loop node reached without an ask-back call".to_string(),
        ));
    };

    // Rule-based guards only; grounding does not apply to ask-backs.
    if let GuardVerdict::Fail { reason } = OutputGuard::check(&ask.interrupt_message) {
        info!("Ask-back message failed validation, rerouting to agent");
        state.push(MessageEntry::tool_result(call.id, ASK_BACK_TOOL, reason));
        return Ok(HumanNodeOutcome::Rerouted);
    }

    info!(agent = %agent, "Suspending turn on ask-back");
    state.pending_interrupt = Some(PendingInterrupt {
        prompt: ask.interrupt_message.clone(),
        call_id: call.id,
        agent,
    });

    Ok(HumanNodeOutcome::Suspended {
        prompt: ask.interrupt_message,
    })
}

/// Resume a suspended turn with the user's answer. Returns the owning agent.
pub fn resume(state: &mut ConversationState, user_reply: &str) -> Result<crate::models::AgentKind> {
    let pending = state.pending_interrupt.take().ok_or_else(|| {
        crate::error::OrchestrationError::InvalidState(
            "Resume requested without a pending interrupt".to_string(),
        )
    })?;

    info!(agent = %pending.agent, "Resuming suspended turn");
    state.push(MessageEntry::tool_result(
        pending.call_id,
        ASK_BACK_TOOL,
        user_reply,
    ));

    Ok(pending.agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgentKind, InputData, Interaction, InteractionKind, Payload, ToolCall,
    };
    use serde_json::json;

    fn state_with_ask_back(message: &str) -> ConversationState {
        let mut state = ConversationState::new(Payload {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            client_id: None,
            role: "partner".to_string(),
            token: "t".to_string(),
            interaction: Interaction {
                kind: InteractionKind::AgenticFlow,
                input: InputData {
                    text: "ledger".to_string(),
                    id: None,
                    from_date: None,
                    to_date: None,
                },
                request_id: "req".to_string(),
            },
        });
        state.agent_name = Some(AgentKind::Reports);
        state.push(MessageEntry::user("ledger"));
        state.push(MessageEntry::Assistant {
            text: String::new(),
            tool_call: Some(ToolCall {
                id: "call-ask".to_string(),
                name: ASK_BACK_TOOL.to_string(),
                args: json!({"interrupt_message": message}),
            }),
        });
        state
    }

    #[test]
    fn test_clean_ask_back_suspends_with_pending_interrupt() {
        let mut state = state_with_ask_back("Please provide your Client Code.");

        let outcome = engage(&mut state).unwrap();
        assert_eq!(
            outcome,
            HumanNodeOutcome::Suspended {
                prompt: "Please provide your Client Code.".to_string()
            }
        );

        let pending = state.pending_interrupt.as_ref().unwrap();
        assert_eq!(pending.call_id, "call-ask");
        assert_eq!(pending.agent, AgentKind::Reports);
    }

    #[test]
    fn test_banned_term_in_ask_back_reroutes_without_suspending() {
        let mut state = state_with_ask_back("Please provide your clientId value.");
        let before = state.messages.len();

        let outcome = engage(&mut state).unwrap();
        assert_eq!(outcome, HumanNodeOutcome::Rerouted);
        assert!(state.pending_interrupt.is_none());
        assert_eq!(state.messages.len(), before + 1);
        assert!(state.last_message().unwrap().is_tool_result());
    }

    #[test]
    fn test_resume_appends_exactly_one_correlated_tool_result() {
        let mut state = state_with_ask_back("Which financial year?");
        engage(&mut state).unwrap();
        let before = state.messages.len();

        let agent = resume(&mut state, "the previous one").unwrap();
        assert_eq!(agent, AgentKind::Reports);
        assert_eq!(state.messages.len(), before + 1);
        assert!(state.pending_interrupt.is_none());

        match state.last_message().unwrap() {
            MessageEntry::ToolResult {
                call_id, content, ..
            } => {
                assert_eq!(call_id, "call-ask");
                assert_eq!(content, "the previous one");
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_resume_without_pending_interrupt_is_an_error() {
        let mut state = state_with_ask_back("Which year?");
        assert!(resume(&mut state, "answer").is_err());
    }
}
