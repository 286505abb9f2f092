//! Error types for the conversational orchestration layer

use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Routing error: {0}")]
    RoutingError(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Guardrail error: {0}")]
    GuardrailError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid tool call: {0}")]
    InvalidToolCall(String),

    #[error("Retriever error: {0}")]
    RetrieverError(String),

    #[error("Step budget exceeded: {0}")]
    StepBudgetExceeded(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
