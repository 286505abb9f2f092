//! Remote financial-API tool
//!
//! HTTP-backed calls to the financial gateway. System-owned parameters
//! (client id, role, dates) are merged into the request body from the turn
//! payload, never taken from the model, and the session/token headers come
//! from the payload as well.

use crate::error::OrchestrationError;
use crate::models::Payload;
use crate::Result;
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Trait for the remote financial-API collaborator
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    async fn call(&self, endpoint: &str, params: Value, payload: &Payload) -> Result<Value>;
}

/// Payload fields merged into the body for every endpoint. Endpoint-specific
/// extras (statement date ranges) are added on top.
const COMMON_SYSTEM_PARAMS: &[(&str, &str)] = &[
    ("client_id", "client_code"),
    ("role", "user_role"),
    ("user_id", "user_ref"),
];

const DATE_RANGE_ENDPOINTS: &[&str] = &[
    "ledger_statement",
    "profit_loss_statement",
    "contract_note",
    "dp_statement",
    "mutual_fund_statement",
];

fn payload_field(payload: &Payload, field: &str) -> Option<String> {
    match field {
        "client_id" => payload.client_id.clone(),
        "role" => Some(payload.role.clone()),
        "user_id" => Some(payload.user_id.clone()),
        "from_date" => payload.interaction.input.from_date.clone(),
        "to_date" => payload.interaction.input.to_date.clone(),
        _ => None,
    }
}

/// Merge system-owned parameters from the payload into the model-supplied
/// body. Model-supplied keys never override system values.
pub fn build_request_body(endpoint: &str, params: &Value, payload: &Payload) -> Value {
    let mut body: Map<String, Value> = params.as_object().cloned().unwrap_or_default();

    for (field, body_key) in COMMON_SYSTEM_PARAMS {
        match payload_field(payload, field) {
            Some(value) => {
                body.insert((*body_key).to_string(), Value::String(value));
            }
            None => warn!(field, "System parameter missing from payload"),
        }
    }

    if DATE_RANGE_ENDPOINTS.contains(&endpoint) {
        for (field, body_key) in [("from_date", "period_start"), ("to_date", "period_end")] {
            if let Some(value) = payload_field(payload, field) {
                body.insert(body_key.to_string(), Value::String(value));
            }
        }
    }

    Value::Object(body)
}

/// HTTP-backed gateway client (connection-pooled)
pub struct HttpRemoteApi {
    client: Client,
    base_url: String,
}

impl HttpRemoteApi {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn call(&self, endpoint: &str, params: Value, payload: &Payload) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let body = build_request_body(endpoint, &params, payload);

        info!(endpoint, "Calling financial gateway");

        let response = self
            .client
            .post(&url)
            .header("sessionid", &payload.session_id)
            .header("token", &payload.token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::ToolError(format!(
                    "Gateway request failed for {}: {}",
                    endpoint, e
                ))
            })?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| OrchestrationError::ToolError(format!("Invalid JSON response: {}", e)))?;

        if !status.is_success() {
            return Err(OrchestrationError::ToolError(format!(
                "Gateway returned {} for {}",
                status, endpoint
            )));
        }

        Ok(body)
    }
}

/// Canned-response gateway for development & testing.
pub struct MockRemoteApi {
    responses: Mutex<HashMap<String, Value>>,
}

impl MockRemoteApi {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
        }
    }

    pub async fn stub(&self, endpoint: &str, response: Value) {
        self.responses
            .lock()
            .await
            .insert(endpoint.to_string(), response);
    }
}

impl Default for MockRemoteApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteApi for MockRemoteApi {
    async fn call(&self, endpoint: &str, _params: Value, _payload: &Payload) -> Result<Value> {
        let responses = self.responses.lock().await;
        responses.get(endpoint).cloned().ok_or_else(|| {
            OrchestrationError::ToolError(format!("No stubbed response for {}", endpoint))
        })
    }
}
