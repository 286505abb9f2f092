//! Guardrail pipeline
//!
//! Gates every customer-facing message and every ask-back prompt before it
//! leaves the system. Three independent checks run in a fixed order: the
//! regex pattern guard, the banned-term guard, then (for final responses
//! only) an LLM-classifier grounding or intent check.

pub mod grounding;
pub mod intent;
pub mod output_guard;

pub use grounding::{GroundingOutcome, GroundingValidator};
pub use intent::{IntentGuard, IntentOutcome, IntentType};
pub use output_guard::{GuardVerdict, OutputGuard};
