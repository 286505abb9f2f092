//! Wealth Chatbot Orchestrator
//!
//! Multi-agent conversational orchestration for a financial-services
//! chatbot:
//! - A supervisor routes each query to one of six domain agents
//! - Agents call remote financial APIs or the FAQ knowledge base
//! - Every outbound message passes a layered guardrail pipeline
//! - Agents can suspend the turn to ask the user a clarifying question
//!
//! TURN FLOW:
//! INPUT → SUPERVISOR → AGENT ⇄ TOOLS → GUARDRAILS → RESPONSE | ASK-BACK

pub mod agents;
pub mod api;
pub mod communicate;
pub mod config;
pub mod dates;
pub mod error;
pub mod graph;
pub mod guardrail;
pub mod history;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod session;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use communicate::ChatbotRuntime;
pub use graph::{GraphLimits, OrchestrationGraph, TurnOutcome};
pub use models::*;
