//! REST API server for the chatbot orchestrator
//!
//! Exposes the communicate entry point over HTTP.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::communicate::ChatbotRuntime;
use crate::models::{Interaction, Payload, TurnStatus};

/// =============================
/// Request Models
/// =============================

/// HTTP request body. `session_id` may be omitted; a stable one is derived
/// from the user id so a thin client still gets conversation continuity.
#[derive(Debug, Deserialize)]
pub struct CommunicateRequest {
    pub user_id: String,
    pub session_id: Option<String>,
    pub client_id: Option<String>,
    pub role: String,
    pub token: String,
    pub interaction: Interaction,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub runtime: Arc<ChatbotRuntime>,
}

/// =============================
/// Helpers — Stable Session Ids
/// =============================

fn stable_session_from_string(input: &str) -> String {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes).to_string()
}

fn resolve_session_id(session_id: Option<&str>, user_id: &str) -> String {
    match session_id {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => stable_session_from_string(user_id),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Communicate Endpoint
/// =============================

async fn communicate_handler(
    State(state): State<ApiState>,
    Json(req): Json<CommunicateRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = resolve_session_id(req.session_id.as_deref(), &req.user_id);
    info!(%session_id, "Received communicate request");

    let payload = Payload {
        user_id: req.user_id,
        session_id,
        client_id: req.client_id,
        role: req.role,
        token: req.token,
        interaction: req.interaction,
    };

    let response = state.runtime.communicate(payload).await;
    let status = match response.status {
        TurnStatus::Success => StatusCode::OK,
        TurnStatus::Failure => StatusCode::BAD_REQUEST,
    };

    (status, Json(ApiResponse::success(response)))
}

/// =============================
/// Router
/// =============================

pub fn create_router(runtime: Arc<ChatbotRuntime>) -> Router {
    let state = ApiState { runtime };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/v1/communicate", post(communicate_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    runtime: Arc<ChatbotRuntime>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_id_derives_a_stable_one() {
        let first = resolve_session_id(None, "user-42");
        let second = resolve_session_id(Some("  "), "user-42");
        let other_user = resolve_session_id(None, "user-43");

        assert_eq!(first, second);
        assert_ne!(first, other_user);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_explicit_session_id_wins() {
        assert_eq!(resolve_session_id(Some("session-7"), "user-42"), "session-7");
    }
}
