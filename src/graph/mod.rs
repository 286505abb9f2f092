//! Orchestration graph
//!
//! The conversation state machine: supervisor, six domain agents with their
//! tool-execution / human-in-loop / final-response nodes, and the leave
//! node, joined by the dynamic routers. Nodes form a closed enum and all
//! dispatch happens in one loop, so a routing typo cannot become a silent
//! dead-end. A turn ends by completing, suspending on an ask-back, or
//! exhausting one of the loop budgets.

use crate::agents::{profile, AgentStepOutcome, DomainAgent, Supervisor};
use crate::llm::LanguageModel;
use crate::models::{AgentKind, AgentOutput, ConversationState, MessageEntry};
use crate::tools::{KnowledgeRetriever, RemoteApi};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod final_response;
pub mod human_node;
pub mod leave;
pub mod router;
pub mod tool_node;

pub use final_response::{FinalOutcome, FinalResponseNode};
pub use human_node::HumanNodeOutcome;
pub use router::{RouteDecision, SupervisorRoute};
pub use tool_node::ToolExecNode;

const TRANSITION_MESSAGE: &str =
    "Control transferred. You are now the active assistant for this conversation. \
     Reflect on the conversation between the host assistant and the user, then \
     assist the user directly. Do not mention who you are; act as a proxy for \
     the assistant.";

/// Graph states. Closed set; router outputs map onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode {
    Supervisor,
    Agent(AgentKind),
    ToolExec(AgentKind),
    HumanInLoop(AgentKind),
    FinalResponse(AgentKind),
    SupervisorFinalResponse,
    Leave,
}

/// Per-turn loop budgets.
#[derive(Debug, Clone, Copy)]
pub struct GraphLimits {
    /// Hard ceiling on node dispatches per turn; exceeding it is structural.
    pub max_steps: u32,
    /// Guardrail-rejection reroutes per turn before degrading to the
    /// fixed apology. Mirrors the model-retry ceiling.
    pub max_guard_reroutes: u32,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_steps: 40,
            max_guard_reroutes: 5,
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// `state.response` carries the outgoing reply.
    Completed,
    /// Suspended on an ask-back; `prompt` goes to the caller.
    Suspended { prompt: String },
}

pub struct OrchestrationGraph {
    supervisor: Supervisor,
    agents: Vec<DomainAgent>,
    final_response: FinalResponseNode,
    tool_exec: ToolExecNode,
    limits: GraphLimits,
}

impl OrchestrationGraph {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        remote: Arc<dyn RemoteApi>,
        retriever: Arc<dyn KnowledgeRetriever>,
        limits: GraphLimits,
    ) -> Self {
        let agents = AgentKind::ALL
            .into_iter()
            .map(|kind| DomainAgent::new(profile(kind), model.clone()))
            .collect();

        Self {
            supervisor: Supervisor::new(model.clone()),
            agents,
            final_response: FinalResponseNode::new(model),
            tool_exec: ToolExecNode::new(remote, retriever),
            limits,
        }
    }

    fn agent(&self, kind: AgentKind) -> &DomainAgent {
        self.agents
            .iter()
            .find(|agent| agent.kind() == kind)
            .expect("graph holds one agent per kind")
    }

    /// Start a fresh turn at the supervisor.
    pub async fn run_turn(&self, state: &mut ConversationState) -> Result<TurnOutcome> {
        state.agent_name = None;
        state.response = None;
        self.drive(state, GraphNode::Supervisor).await
    }

    /// Resume a suspended turn with the user's answer.
    pub async fn resume_turn(
        &self,
        state: &mut ConversationState,
        user_reply: &str,
    ) -> Result<TurnOutcome> {
        let agent = human_node::resume(state, user_reply)?;
        state.agent_name = Some(agent);
        state.response = None;
        self.drive(state, GraphNode::Agent(agent)).await
    }

    async fn drive(&self, state: &mut ConversationState, start: GraphNode) -> Result<TurnOutcome> {
        let mut node = start;
        let mut steps = 0u32;
        let mut guard_reroutes = 0u32;

        loop {
            steps += 1;
            if steps > self.limits.max_steps {
                return Err(crate::error::OrchestrationError::StepBudgetExceeded(format!(
                    "Turn exceeded {} graph steps",
                    self.limits.max_steps
                )));
            }

            debug!(?node, steps, "Dispatching graph node");

            match node {
                GraphNode::Supervisor => match self.supervisor.step(state).await? {
                    AgentStepOutcome::Exhausted => return Ok(TurnOutcome::Completed),
                    AgentStepOutcome::Continue => match router::route_supervisor(state)? {
                        SupervisorRoute::ToAgent(kind) => {
                            self.inject_transition(state);
                            state.agent_name = Some(kind);
                            node = GraphNode::Agent(kind);
                        }
                        SupervisorRoute::FinalResponse => {
                            node = GraphNode::SupervisorFinalResponse;
                        }
                    },
                },

                GraphNode::Agent(kind) => match self.agent(kind).step(state).await? {
                    AgentStepOutcome::Exhausted => return Ok(TurnOutcome::Completed),
                    AgentStepOutcome::Continue => {
                        node = match router::route_agent(state)? {
                            RouteDecision::FinalResponse => GraphNode::FinalResponse(kind),
                            RouteDecision::Leave => GraphNode::Leave,
                            RouteDecision::HumanInLoop => GraphNode::HumanInLoop(kind),
                            RouteDecision::ExecuteTool => GraphNode::ToolExec(kind),
                        };
                    }
                },

                GraphNode::ToolExec(kind) => {
                    self.tool_exec.execute(state).await?;
                    node = GraphNode::Agent(kind);
                }

                GraphNode::HumanInLoop(kind) => match human_node::engage(state)? {
                    HumanNodeOutcome::Suspended { prompt } => {
                        return Ok(TurnOutcome::Suspended { prompt });
                    }
                    HumanNodeOutcome::Rerouted => {
                        guard_reroutes += 1;
                        if self.guard_ceiling_hit(state, guard_reroutes) {
                            return Ok(TurnOutcome::Completed);
                        }
                        node = GraphNode::Agent(kind);
                    }
                },

                GraphNode::FinalResponse(kind) => {
                    match self.final_response.review(state).await? {
                        FinalOutcome::Completed => return Ok(TurnOutcome::Completed),
                        FinalOutcome::Reroute => {
                            guard_reroutes += 1;
                            if self.guard_ceiling_hit(state, guard_reroutes) {
                                return Ok(TurnOutcome::Completed);
                            }
                            node = GraphNode::Agent(kind);
                        }
                    }
                }

                GraphNode::SupervisorFinalResponse => {
                    self.final_response.review_supervisor(state).await?;
                    return Ok(TurnOutcome::Completed);
                }

                GraphNode::Leave => {
                    leave::leave(state)?;
                    node = GraphNode::Supervisor;
                }
            }
        }
    }

    /// Tell the incoming agent it now owns the dialog, correlated to the
    /// supervisor's routing call.
    fn inject_transition(&self, state: &mut ConversationState) {
        if let Some(call) = state.last_message().and_then(MessageEntry::tool_call).cloned() {
            info!("Injecting control-transfer tool result");
            state.push(MessageEntry::tool_result(
                call.id,
                call.name,
                TRANSITION_MESSAGE,
            ));
        }
    }

    fn guard_ceiling_hit(&self, state: &mut ConversationState, reroutes: u32) -> bool {
        if reroutes > self.limits.max_guard_reroutes {
            warn!(
                reroutes,
                "Guard-reroute ceiling exceeded, degrading to apology"
            );
            state.response = Some(AgentOutput::apology());
            return true;
        }
        false
    }
}
