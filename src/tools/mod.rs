//! Tool surface bound to the agents
//!
//! Every model tool call is decoded into the closed `ToolInvocation` union
//! at a single point; the routers and nodes then switch on it exhaustively
//! instead of matching name strings in multiple places.

use crate::llm::ToolSchema;
use crate::models::{AgentKind, AgentOutput, AskBackToUser, ToolCall};
use crate::Result;
use serde_json::{json, Value};

pub mod remote_api;
pub mod retriever;

pub use remote_api::{HttpRemoteApi, MockRemoteApi, RemoteApi};
pub use retriever::{KnowledgeRetriever, StaticRetriever, NO_FAQ_MATCH_MESSAGE};

// Model-facing tool names. Internal identifiers only; the banned-term guard
// keeps them out of customer-facing text.
pub const AGENT_OUTPUT_TOOL: &str = "AgentOutput";
pub const ASK_BACK_TOOL: &str = "AskBackToUser";
pub const REMOTE_CALL_TOOL: &str = "request_post";
pub const FAQ_TOOL: &str = "faq_knowledge_base";

/// Decoded model tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    /// Terminal structured reply from an agent.
    FinalOutput(AgentOutput),
    /// Clarification request that suspends the turn.
    AskBack(AskBackToUser),
    /// Remote financial-API call.
    RemoteCall { endpoint: String, params: Value },
    /// FAQ knowledge-base lookup.
    FaqLookup { question: String },
    /// Supervisor hand-off to a domain agent.
    Route(AgentKind),
}

impl ToolInvocation {
    /// Decode a raw tool call. Unknown tool names and malformed arguments
    /// are structural errors, not recoverable conditions.
    pub fn decode(call: &ToolCall) -> Result<ToolInvocation> {
        match call.name.as_str() {
            AGENT_OUTPUT_TOOL => {
                let output: AgentOutput = serde_json::from_value(call.args.clone())
                    .map_err(|e| invalid(call, &format!("bad AgentOutput args: {e}")))?;
                Ok(ToolInvocation::FinalOutput(output))
            }
            ASK_BACK_TOOL => {
                let ask: AskBackToUser = serde_json::from_value(call.args.clone())
                    .map_err(|e| invalid(call, &format!("bad AskBackToUser args: {e}")))?;
                Ok(ToolInvocation::AskBack(ask))
            }
            REMOTE_CALL_TOOL => {
                let endpoint = call
                    .args
                    .get("endpoint")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(call, "missing 'endpoint'"))?
                    .to_string();
                let params = call.args.get("data").cloned().unwrap_or_else(|| json!({}));
                Ok(ToolInvocation::RemoteCall { endpoint, params })
            }
            FAQ_TOOL => {
                let question = call
                    .args
                    .get("question")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(call, "missing 'question'"))?
                    .to_string();
                Ok(ToolInvocation::FaqLookup { question })
            }
            other => AgentKind::from_routing_tool(other)
                .map(ToolInvocation::Route)
                .ok_or_else(|| invalid(call, "unknown tool name")),
        }
    }
}

fn invalid(call: &ToolCall, detail: &str) -> crate::error::OrchestrationError {
    crate::error::OrchestrationError::InvalidToolCall(format!("{}: {}", call.name, detail))
}

//
// ================= Tool schemas =================
//

pub fn agent_output_schema() -> ToolSchema {
    ToolSchema {
        name: AGENT_OUTPUT_TOOL,
        description: "Deliver the final customer-facing reply, or escalate control of the \
                      dialog when the request is out of scope."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Customer-facing reply in plain markdown. No internal \
                                    parameter names, endpoint paths, or system identifiers."
                },
                "status": {
                    "type": "string",
                    "enum": ["result", "out_of_scope"],
                    "description": "result: the request was fulfilled (or definitively \
                                    cannot be). out_of_scope: escalate to the supervisor."
                }
            },
            "required": ["message", "status"],
        }),
    }
}

pub fn ask_back_schema() -> ToolSchema {
    ToolSchema {
        name: ASK_BACK_TOOL,
        description: "Ask the customer for clarification or missing information. The \
                      conversation suspends until they answer."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "interrupt_message": {
                    "type": "string",
                    "description": "Short, polite, markdown-formatted question to the customer."
                }
            },
            "required": ["interrupt_message"],
        }),
    }
}

pub fn remote_call_schema() -> ToolSchema {
    ToolSchema {
        name: REMOTE_CALL_TOOL,
        description: "Call a remote financial-API operation with its parameters.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "endpoint": {
                    "type": "string",
                    "description": "Operation identifier from the api_surface section."
                },
                "data": {
                    "type": "object",
                    "description": "Key-value parameters required by the operation."
                }
            },
            "required": ["endpoint"],
        }),
    }
}

pub fn faq_schema() -> ToolSchema {
    ToolSchema {
        name: FAQ_TOOL,
        description: "Retrieve relevant information from the FAQ knowledge base for \
                      questions about services, products, policies, and regulations."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The customer's natural-language question."
                }
            },
            "required": ["question"],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputStatus;

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            id: "call-1".to_string(),
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn test_decode_final_output() {
        let decoded = ToolInvocation::decode(&call(
            AGENT_OUTPUT_TOOL,
            json!({"message": "Done", "status": "result"}),
        ))
        .unwrap();

        match decoded {
            ToolInvocation::FinalOutput(output) => {
                assert_eq!(output.status, OutputStatus::Result);
                assert_eq!(output.message, "Done");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ask_back_and_remote_call() {
        let ask = ToolInvocation::decode(&call(
            ASK_BACK_TOOL,
            json!({"interrupt_message": "Which financial year?"}),
        ))
        .unwrap();
        assert!(matches!(ask, ToolInvocation::AskBack(_)));

        let remote = ToolInvocation::decode(&call(
            REMOTE_CALL_TOOL,
            json!({"endpoint": "ledger_statement", "data": {"year": "current"}}),
        ))
        .unwrap();
        match remote {
            ToolInvocation::RemoteCall { endpoint, params } => {
                assert_eq!(endpoint, "ledger_statement");
                assert_eq!(params["year"], "current");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_routing_tool() {
        for kind in AgentKind::ALL {
            let decoded = ToolInvocation::decode(&call(
                kind.routing_tool_name(),
                json!({"instruction": "handle this"}),
            ))
            .unwrap();
            assert_eq!(decoded, ToolInvocation::Route(kind));
        }
    }

    #[test]
    fn test_unknown_tool_is_structural_error() {
        let result = ToolInvocation::decode(&call("NotATool", json!({})));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_final_output_is_structural_error() {
        let result =
            ToolInvocation::decode(&call(AGENT_OUTPUT_TOOL, json!({"status": "done"})));
        assert!(result.is_err());
    }
}
