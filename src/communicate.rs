//! Communicate entry point
//!
//! The turn boundary: accepts one user turn, resumes or starts the graph
//! under the session's turn lock, and shapes the final response. A fatal
//! error inside a turn repairs the session by truncating the log back to
//! the last completed-exchange sentinel, so the next turn starts clean.

use crate::graph::{OrchestrationGraph, TurnOutcome};
use crate::models::{
    ConversationState, InteractionKind, MessageEntry, Payload, TurnResponse, APOLOGY_MESSAGE,
    COMPLETED_SENTINEL,
};
use crate::session::{SessionLocks, SessionStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub fn generate_request_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

/// Drop every entry after the last completed-exchange sentinel. With no
/// sentinel present the whole log goes; a partial exchange must never leak
/// into the next turn.
pub fn truncate_to_last_sentinel(state: &mut ConversationState) {
    let cut = state
        .messages
        .iter()
        .rposition(|entry| {
            matches!(entry, MessageEntry::ToolResult { content, .. } if content == COMPLETED_SENTINEL)
        })
        .map(|position| position + 1)
        .unwrap_or(0);

    state.messages.truncate(cut);
    state.pending_interrupt = None;
    state.response = None;
    state.agent_name = None;
}

pub struct ChatbotRuntime {
    graph: OrchestrationGraph,
    sessions: Arc<dyn SessionStore>,
    locks: SessionLocks,
}

impl ChatbotRuntime {
    pub fn new(graph: OrchestrationGraph, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            graph,
            sessions,
            locks: SessionLocks::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Process one user turn. Never propagates an error: failures shape a
    /// `Failure` response after repairing the session.
    pub async fn communicate(&self, payload: Payload) -> TurnResponse {
        let query = payload.interaction.input.text.trim().to_string();
        let session_id = payload.session_id.clone();

        if query.is_empty() {
            warn!("Received empty query in payload");
            return TurnResponse::failure("Empty query provided.", payload.interaction.request_id);
        }

        if payload.interaction.kind == InteractionKind::DeterministicFlow {
            // The button-driven flow engine is a separate collaborator.
            return TurnResponse::failure(
                "Deterministic flows are handled by a separate engine.",
                payload.interaction.request_id,
            );
        }

        // At most one in-flight turn per session.
        let lock = self.locks.lock_for(&session_id).await;
        let _guard = lock.lock().await;

        let mut state = match self.sessions.load(&session_id).await {
            Ok(Some(state)) => state,
            Ok(None) => ConversationState::new(payload.clone()),
            Err(e) => {
                error!(%session_id, %e, "Session load failed");
                return TurnResponse::failure(APOLOGY_MESSAGE, payload.interaction.request_id);
            }
        };

        let outcome = if state.has_pending_interrupt() {
            // Resume: the prior payload (and its request id) stays in force.
            info!(%session_id, "Resuming interrupted turn");
            self.graph.resume_turn(&mut state, &query).await
        } else {
            let mut payload = payload;
            payload.interaction.request_id = generate_request_id();
            info!(
                %session_id,
                request_id = %payload.interaction.request_id,
                "Starting new turn"
            );
            state.payload = payload;
            state.push(MessageEntry::user(query));
            self.graph.run_turn(&mut state).await
        };

        let request_id = state.payload.interaction.request_id.clone();

        match outcome {
            Ok(TurnOutcome::Suspended { prompt }) => {
                info!(%session_id, "Turn suspended on ask-back");
                if let Err(e) = self.sessions.save(&session_id, &state).await {
                    error!(%session_id, %e, "Session save failed after suspension");
                    return TurnResponse::failure(APOLOGY_MESSAGE, request_id);
                }
                TurnResponse::success(prompt, request_id)
            }
            Ok(TurnOutcome::Completed) => {
                let message = state
                    .response
                    .as_ref()
                    .map(|response| response.message.clone())
                    .unwrap_or_else(|| APOLOGY_MESSAGE.to_string());

                if let Err(e) = self.sessions.save(&session_id, &state).await {
                    error!(%session_id, %e, "Session save failed after completion");
                    return TurnResponse::failure(APOLOGY_MESSAGE, request_id);
                }

                info!(%session_id, "Turn completed");
                TurnResponse::success(message, request_id)
            }
            Err(e) => {
                // Recovery path: repair the persisted log, answer generically.
                error!(%session_id, %e, "Turn failed, repairing session");
                truncate_to_last_sentinel(&mut state);
                if let Err(save_err) = self.sessions.save(&session_id, &state).await {
                    error!(%session_id, %save_err, "Session repair save failed");
                }
                TurnResponse::failure(APOLOGY_MESSAGE, request_id)
            }
        }
    }
}
