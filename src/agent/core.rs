//! Core Agent struct.
//!
//! An `Agent` is one worker of a crew: a persona (role, goal, backstory), the
//! tools bound to it, and the reasoning engine it calls. Agents are built
//! fresh for every crew execution and shared by reference between all work
//! items assigned to them.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::crew_agent_executor::{AgentExecution, CrewAgentExecutor};
use crate::llms::base_llm::{BaseLLM, LLMMessage};
use crate::task::Task;
use crate::tools::BaseTool;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::CrewError;

/// Default iteration cap for the reasoning loop.
pub const DEFAULT_MAX_ITER: u32 = 25;

/// Identity of a worker within one crew.
///
/// Stored workers carry the key they have in the definition source. The
/// manager and the compiler are never stored, so they get their own variants
/// and cannot collide with a stored key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKey {
    Stored(String),
    Manager,
    Compiler,
}

impl WorkerKey {
    pub fn stored(id: impl Into<String>) -> Self {
        WorkerKey::Stored(id.into())
    }
}

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKey::Stored(id) => write!(f, "{}", id),
            WorkerKey::Manager => write!(f, "<manager>"),
            WorkerKey::Compiler => write!(f, "<compiler>"),
        }
    }
}

/// Per-execution mutable state of an agent.
#[derive(Debug, Default)]
struct AgentState {
    /// Prompt/answer pairs replayed on the next call when memory is on.
    history: Vec<LLMMessage>,
    usage: UsageMetrics,
    executions: usize,
}

/// Represents a worker in a crew.
pub struct Agent {
    /// Unique identifier for this instance.
    pub id: Uuid,
    /// Key the crew's work items use to reference this agent.
    pub key: WorkerKey,
    /// Role label, also the key of this agent's ledger entry.
    pub role: String,
    /// Objective of the agent.
    pub goal: String,
    /// Backstory of the agent.
    pub backstory: String,
    /// Tools bound to this agent, in requested order.
    pub tools: Vec<Arc<dyn BaseTool>>,
    /// Whether the agent may hand work off to others. Advisory only.
    pub allow_delegation: bool,
    /// Whether earlier answers in this execution are replayed to the agent.
    pub memory: bool,
    /// Iteration cap for the reasoning loop.
    pub max_iter: u32,
    /// Reasoning engine.
    pub llm: Arc<dyn BaseLLM>,
    state: Mutex<AgentState>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("key", &self.key)
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("tools", &self.tool_names())
            .field("allow_delegation", &self.allow_delegation)
            .field("memory", &self.memory)
            .field("max_iter", &self.max_iter)
            .field("llm", &self.llm.model())
            .finish()
    }
}

impl Agent {
    /// Create a new agent with no tools, delegation off and memory on.
    pub fn new(
        key: WorkerKey,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        llm: Arc<dyn BaseLLM>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            allow_delegation: false,
            memory: true,
            max_iter: DEFAULT_MAX_ITER,
            llm,
            state: Mutex::new(AgentState::default()),
        }
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn BaseTool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_allow_delegation(mut self, allow_delegation: bool) -> Self {
        self.allow_delegation = allow_delegation;
        self
    }

    pub fn with_memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Execute a task, optionally with context from earlier work.
    pub async fn execute_task(
        &self,
        task: &Task,
        context: Option<&str>,
    ) -> Result<AgentExecution, CrewError> {
        log::debug!(
            "Agent '{}' executing task '{}'",
            self.role,
            task.name.as_deref().unwrap_or(&task.key)
        );
        let mut executor = CrewAgentExecutor::new(self, task.prompt(context));
        let execution = executor.invoke().await?;
        self.state.lock().executions += 1;
        Ok(execution)
    }

    /// Names of the bound tools, in order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Find a bound tool by name. Falls back to a case-insensitive match.
    pub fn find_tool(&self, name: &str) -> Option<&Arc<dyn BaseTool>> {
        let name = name.trim();
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .or_else(|| self.tools.iter().find(|t| t.name().eq_ignore_ascii_case(name)))
    }

    /// Usage accumulated by this agent so far.
    pub fn usage_metrics(&self) -> UsageMetrics {
        self.state.lock().usage.clone()
    }

    /// Number of completed task executions.
    pub fn execution_count(&self) -> usize {
        self.state.lock().executions
    }

    /// Messages replayed before the next call. Empty when memory is off.
    pub fn memory_messages(&self) -> Vec<LLMMessage> {
        if !self.memory {
            return Vec::new();
        }
        self.state.lock().history.clone()
    }

    pub(crate) fn remember(&self, prompt: &str, answer: &str) {
        if !self.memory {
            return;
        }
        let mut state = self.state.lock();
        state.history.push(LLMMessage::user(prompt));
        state.history.push(LLMMessage::assistant(answer));
    }

    pub(crate) fn record_usage(&self, usage: &UsageMetrics) {
        self.state.lock().usage.add_usage_metrics(usage);
    }
}
