//! Shared domain-agent step
//!
//! One agent shape serves all six business areas. A step trims the history,
//! invokes the model with the domain's bound tool set, and either surfaces
//! the reply or retries on empty output up to the fixed ceiling.

use crate::agents::DomainProfile;
use crate::dates;
use crate::history::{trim_history, HISTORY_TOKEN_BUDGET};
use crate::llm::{LanguageModel, ToolSchema};
use crate::models::{AgentOutput, ConversationState, MessageEntry, OutputStatus};
use crate::prompts::{self, PromptContext};
use crate::tools::{
    agent_output_schema, ask_back_schema, faq_schema, remote_call_schema, ToolInvocation,
};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Model invocations per step before degrading to the fixed apology.
/// Empty replies and transport failures (timeouts included) both count.
pub const MAX_MODEL_RETRIES: u32 = 5;

const RETRY_INSTRUCTION: &str = "Respond with a real output.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStepOutcome {
    /// A usable reply was appended; the dynamic router decides what's next.
    Continue,
    /// Retry ceiling hit; `state.response` already carries the apology.
    Exhausted,
}

pub struct DomainAgent {
    profile: &'static DomainProfile,
    model: Arc<dyn LanguageModel>,
}

impl DomainAgent {
    pub fn new(profile: &'static DomainProfile, model: Arc<dyn LanguageModel>) -> Self {
        Self { profile, model }
    }

    pub fn kind(&self) -> crate::models::AgentKind {
        self.profile.kind
    }

    fn tool_set(&self) -> Vec<ToolSchema> {
        let mut tools = vec![remote_call_schema(), ask_back_schema(), agent_output_schema()];
        if self.profile.has_faq_tool {
            tools.insert(0, faq_schema());
        }
        tools
    }

    fn system_prompt(&self, state: &ConversationState) -> String {
        let ctx = PromptContext {
            today: dates::today(),
            current_fy: dates::current_financial_year(),
            previous_fy: dates::previous_financial_year(),
            role: state.payload.role.clone(),
            client_id: state.payload.client_id.clone(),
        };

        let extra_guidance = if self.profile.has_faq_tool {
            prompts::FAQ_GUIDANCE
        } else {
            ""
        };

        prompts::domain_prompt(
            self.profile.summary,
            self.profile.api_surface,
            extra_guidance,
            &ctx,
        )
    }

    /// Run one agent step: append the model's reply to the log and surface
    /// a candidate response when the reply is terminal.
    pub async fn step(&self, state: &mut ConversationState) -> Result<AgentStepOutcome> {
        let tools = self.tool_set();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let trimmed = trim_history(&state.messages, HISTORY_TOKEN_BUDGET);
            let prompt = self.system_prompt(state);

            debug!(
                agent = %self.profile.kind,
                attempt = attempts,
                history_len = trimmed.len(),
                "Invoking domain agent model"
            );

            match self.model.invoke(&prompt, &tools, &trimmed).await {
                Ok(reply) if !reply.is_empty() => {
                    state.push(MessageEntry::Assistant {
                        text: reply.text.clone(),
                        tool_call: reply.tool_call.clone(),
                    });

                    // Surface the candidate response: terminal tool args win,
                    // free text falls back to a plain result.
                    match &reply.tool_call {
                        Some(call) => {
                            if let Ok(ToolInvocation::FinalOutput(output)) =
                                ToolInvocation::decode(call)
                            {
                                state.response = Some(output);
                            }
                        }
                        None => {
                            state.response = Some(AgentOutput {
                                message: reply.text,
                                status: OutputStatus::Result,
                            });
                        }
                    }

                    info!(agent = %self.profile.kind, "Domain agent step completed");
                    return Ok(AgentStepOutcome::Continue);
                }
                Ok(_) => {
                    warn!(
                        agent = %self.profile.kind,
                        attempt = attempts,
                        "Model returned neither tool call nor content"
                    );
                }
                Err(error) => {
                    // Timeouts and transport failures share the retry budget.
                    warn!(
                        agent = %self.profile.kind,
                        attempt = attempts,
                        %error,
                        "Model invocation failed"
                    );
                }
            }

            if attempts >= MAX_MODEL_RETRIES {
                warn!(agent = %self.profile.kind, "Retry ceiling reached, degrading to apology");
                state.response = Some(AgentOutput::apology());
                return Ok(AgentStepOutcome::Exhausted);
            }

            state.push(MessageEntry::user(RETRY_INSTRUCTION));
        }
    }
}
