//! Core data models for the conversational orchestration layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

//
// ================= Fixed customer-facing strings =================
//

/// Apology used when an agent or the supervisor exhausts its retry budget,
/// or when a turn fails guard validation beyond the reroute ceiling.
pub const APOLOGY_MESSAGE: &str =
    "I sincerely apologize for not being able to fulfill your request.";

/// Returned when an agent finishes without producing a usable structured reply.
pub const OUT_OF_SCOPE_MESSAGE: &str =
    "I apologize, this query appears to be outside of my scope.";

/// Marker appended after a fully validated reply; recovery truncates back to it.
pub const COMPLETED_SENTINEL: &str = "This query response has been completed.";

//
// ================= Request envelope =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionKind {
    AgenticFlow,
    DeterministicFlow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputData {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub input: InputData,
    #[serde(default)]
    pub request_id: String,
}

/// Immutable per-turn request envelope. Replaced each new turn; the prior
/// payload persists while a turn is suspended on an interrupt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub user_id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub role: String,
    pub token: String,
    pub interaction: Interaction,
}

//
// ================= Message log =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// One entry in the append-only turn log. Every `ToolResult` must reference
/// a preceding assistant entry's tool call by its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageEntry {
    User {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call: Option<ToolCall>,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

impl MessageEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::Assistant {
            text: text.into(),
            tool_call: None,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        }
    }

    pub fn tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::Assistant { tool_call, .. } => tool_call.as_ref(),
            _ => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }
}

//
// ================= Agent structured outputs =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Result,
    OutOfScope,
}

/// Terminal tool-shaped reply from an agent. `message` must be
/// customer-safe markdown; the guardrail pipeline enforces that, not
/// the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOutput {
    pub message: String,
    pub status: OutputStatus,
}

impl AgentOutput {
    pub fn result(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: OutputStatus::Result,
        }
    }

    pub fn apology() -> Self {
        Self::result(APOLOGY_MESSAGE)
    }
}

/// Tool-shaped clarification request; producing one suspends the turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskBackToUser {
    pub interrupt_message: String,
}

//
// ================= Agents =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Reports,
    Account,
    Funds,
    Trading,
    Information,
    Depository,
}

impl AgentKind {
    pub const ALL: [AgentKind; 6] = [
        AgentKind::Reports,
        AgentKind::Account,
        AgentKind::Funds,
        AgentKind::Trading,
        AgentKind::Information,
        AgentKind::Depository,
    ];

    /// Internal routing-tool name bound to the supervisor for this agent.
    /// Never customer-visible; the banned-term guard blocks these names.
    pub fn routing_tool_name(&self) -> &'static str {
        match self {
            AgentKind::Reports => "ReportsAgent",
            AgentKind::Account => "AccountAgent",
            AgentKind::Funds => "FundsAgent",
            AgentKind::Trading => "TradingAgent",
            AgentKind::Information => "InformationAgent",
            AgentKind::Depository => "DepositoryAgent",
        }
    }

    pub fn from_routing_tool(name: &str) -> Option<AgentKind> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.routing_tool_name() == name)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.routing_tool_name())
    }
}

//
// ================= Conversation state =================
//

/// Recorded when a turn suspends at a human-in-loop node. Serialized with
/// the rest of the state so suspension survives process restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingInterrupt {
    pub prompt: String,
    pub call_id: String,
    pub agent: AgentKind,
}

/// The single mutable record threaded through the graph for one session.
/// Mutated exclusively by the orchestration graph during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub payload: Payload,
    pub messages: Vec<MessageEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AgentOutput>,
    /// Domain agent currently owning the turn; `None` means the supervisor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interrupt: Option<PendingInterrupt>,
}

impl ConversationState {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            messages: Vec::new(),
            response: None,
            agent_name: None,
            pending_interrupt: None,
        }
    }

    pub fn last_message(&self) -> Option<&MessageEntry> {
        self.messages.last()
    }

    pub fn push(&mut self, entry: MessageEntry) {
        self.messages.push(entry);
    }

    pub fn has_pending_interrupt(&self) -> bool {
        self.pending_interrupt.is_some()
    }
}

//
// ================= Turn response =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TurnStatus {
    Success,
    Failure,
}

/// Response shape returned across the turn boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub status: TurnStatus,
    pub message: String,
    pub action: String,
    pub request_id: String,
}

impl TurnResponse {
    pub fn success(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            status: TurnStatus::Success,
            message: message.into(),
            action: "result".to_string(),
            request_id: request_id.into(),
        }
    }

    pub fn failure(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            status: TurnStatus::Failure,
            message: message.into(),
            action: "result".to_string(),
            request_id: request_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> Payload {
        Payload {
            user_id: "u-1".to_string(),
            session_id: "s-1".to_string(),
            client_id: Some("C123".to_string()),
            role: "client".to_string(),
            token: "tok".to_string(),
            interaction: Interaction {
                kind: InteractionKind::AgenticFlow,
                input: InputData {
                    text: "Send me my ledger report".to_string(),
                    id: None,
                    from_date: None,
                    to_date: None,
                },
                request_id: "req-1".to_string(),
            },
        }
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = ConversationState::new(sample_payload());
        state.push(MessageEntry::user("hello"));
        state.push(MessageEntry::Assistant {
            text: String::new(),
            tool_call: Some(ToolCall {
                id: "call-1".to_string(),
                name: "AskBackToUser".to_string(),
                args: serde_json::json!({"interrupt_message": "Which year?"}),
            }),
        });
        state.pending_interrupt = Some(PendingInterrupt {
            prompt: "Which year?".to_string(),
            call_id: "call-1".to_string(),
            agent: AgentKind::Reports,
        });

        let json = serde_json::to_string(&state).unwrap();
        let restored: ConversationState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.messages, state.messages);
        assert_eq!(restored.pending_interrupt, state.pending_interrupt);
        assert!(restored.has_pending_interrupt());
    }

    #[test]
    fn test_interaction_kind_wire_names() {
        let json = serde_json::to_string(&InteractionKind::AgenticFlow).unwrap();
        assert_eq!(json, "\"AGENTIC_FLOW\"");

        let status = serde_json::to_string(&OutputStatus::OutOfScope).unwrap();
        assert_eq!(status, "\"out_of_scope\"");
    }

    #[test]
    fn test_routing_tool_names_are_distinct() {
        for kind in AgentKind::ALL {
            assert_eq!(AgentKind::from_routing_tool(kind.routing_tool_name()), Some(kind));
        }
        assert_eq!(AgentKind::from_routing_tool("NoSuchAgent"), None);
    }
}
