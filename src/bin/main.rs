use std::sync::Arc;
use tracing::info;
use wealth_chatbot_orchestrator::{
    communicate::ChatbotRuntime,
    graph::{GraphLimits, OrchestrationGraph},
    llm::{MockLanguageModel, ModelReply},
    models::{AgentKind, InputData, Interaction, InteractionKind, Payload, ToolCall},
    session::InMemorySessionStore,
    tools::{MockRemoteApi, StaticRetriever},
};

fn payload(session_id: &str, text: &str) -> Payload {
    Payload {
        user_id: "demo-user".to_string(),
        session_id: session_id.to_string(),
        client_id: Some("C123".to_string()),
        role: "client".to_string(),
        token: "demo-token".to_string(),
        interaction: Interaction {
            kind: InteractionKind::AgenticFlow,
            input: InputData {
                text: text.to_string(),
                id: None,
                from_date: None,
                to_date: None,
            },
            request_id: String::new(),
        },
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Wealth chatbot orchestrator demo starting");

    // Scripted model: route to the reports agent, call the gateway, reply.
    let model = MockLanguageModel::scripted(vec![
        ModelReply::tool(ToolCall {
            id: "call-route".to_string(),
            name: AgentKind::Reports.routing_tool_name().to_string(),
            args: serde_json::json!({"instruction": "ledger report"}),
        }),
        ModelReply::tool(ToolCall {
            id: "call-api".to_string(),
            name: "request_post".to_string(),
            args: serde_json::json!({"endpoint": "ledger_statement", "data": {}}),
        }),
        ModelReply::tool(ToolCall {
            id: "call-final".to_string(),
            name: "AgentOutput".to_string(),
            args: serde_json::json!({
                "message": "Your ledger shows a balance of ₹12,000 for the current financial year.",
                "status": "result"
            }),
        }),
        // Grounding verdict for the API-backed reply.
        ModelReply::tool(ToolCall {
            id: "call-ground".to_string(),
            name: "GroundingValidator".to_string(),
            args: serde_json::json!({
                "query_response_relevance": "High",
                "response_chunk_alignment": "Aligned",
                "issues": ""
            }),
        }),
    ]);

    let remote = MockRemoteApi::new();
    remote
        .stub("ledger_statement", serde_json::json!({"balance": 12000}))
        .await;

    let retriever = StaticRetriever::new().with_entry(
        &["speed-e", "nsdl"],
        "SPEED-e is NSDL's electronic delivery instruction facility.",
    );

    let graph = OrchestrationGraph::new(
        Arc::new(model),
        Arc::new(remote),
        Arc::new(retriever),
        GraphLimits::default(),
    );
    let runtime = ChatbotRuntime::new(graph, Arc::new(InMemorySessionStore::new()));

    let response = runtime
        .communicate(payload("demo-session", "Send me my ledger report"))
        .await;

    println!("\n=== TURN RESULT ===");
    println!("Status:     {:?}", response.status);
    println!("Request id: {}", response.request_id);
    println!("Message:    {}", response.message);
}
