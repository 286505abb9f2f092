use std::sync::Arc;
use tracing::info;
use wealth_chatbot_orchestrator::{
    api::start_server,
    communicate::ChatbotRuntime,
    config::Config,
    graph::{GraphLimits, OrchestrationGraph},
    llm::GeminiModel,
    session::{InMemorySessionStore, PostgresSessionStore, SessionStore},
    tools::{HttpRemoteApi, MockRemoteApi, RemoteApi, StaticRetriever},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();

    let model = Arc::new(GeminiModel::new(config.model_api_key.clone()));

    let remote: Arc<dyn RemoteApi> = match &config.gateway_base_url {
        Some(base_url) => {
            info!("Financial gateway: {}", base_url);
            Arc::new(HttpRemoteApi::new(base_url.clone()))
        }
        None => {
            info!("GATEWAY_BASE_URL not set, using stubbed gateway");
            Arc::new(MockRemoteApi::new())
        }
    };

    let retriever = Arc::new(StaticRetriever::new().with_entry(
        &["speed-e", "nsdl"],
        "SPEED-e is NSDL's electronic delivery instruction facility.",
    ));

    let sessions: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => Arc::new(PostgresSessionStore::connect_lazy(url)?),
        None => {
            info!("Session store backend: in-memory");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let graph = OrchestrationGraph::new(model, remote, retriever, GraphLimits::default());
    let runtime = Arc::new(ChatbotRuntime::new(graph, sessions));

    start_server(runtime, config.port).await
}
