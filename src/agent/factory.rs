//! Worker factory: agents from stored definitions, plus the manager and
//! compiler personas.

use std::sync::Arc;

use crate::capabilities::CapabilityRegistry;
use crate::llms::base_llm::BaseLLM;
use crate::store::WorkerDefinition;
use crate::utilities::config::WorkerDefaults;
use crate::utilities::errors::CrewError;
use crate::utilities::prompts;

use super::core::{Agent, WorkerKey, DEFAULT_MAX_ITER};

/// Builds the agents of one crew execution.
#[derive(Debug, Clone)]
pub struct WorkerFactory {
    registry: Arc<CapabilityRegistry>,
    llm: Arc<dyn BaseLLM>,
    defaults: WorkerDefaults,
    max_iter: u32,
}

impl WorkerFactory {
    pub fn new(registry: Arc<CapabilityRegistry>, llm: Arc<dyn BaseLLM>) -> Self {
        Self {
            registry,
            llm,
            defaults: WorkerDefaults::default(),
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    pub fn with_defaults(mut self, defaults: WorkerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Build a worker from its stored definition.
    ///
    /// Fails when role, goal or backstory is missing or blank. Unknown
    /// capability names are dropped by the registry.
    pub fn build(&self, definition: &WorkerDefinition) -> Result<Agent, CrewError> {
        let role = required(&definition.id, "role", &definition.role)?;
        let goal = required(&definition.id, "goal", &definition.goal)?;
        let backstory = required(&definition.id, "backstory", &definition.backstory)?;

        let tools = self.registry.resolve(&definition.capability_names);
        let agent = Agent::new(
            WorkerKey::stored(definition.id.clone()),
            role,
            goal,
            backstory,
            self.llm.clone(),
        )
        .with_tools(tools)
        .with_allow_delegation(
            definition
                .allow_delegation
                .unwrap_or(self.defaults.allow_delegation),
        )
        .with_memory(definition.memory.unwrap_or(self.defaults.enable_memory))
        .with_max_iter(self.max_iter);

        log::debug!(
            "Built worker {} '{}' with tools {:?}",
            agent.key,
            agent.role,
            agent.tool_names()
        );
        Ok(agent)
    }

    /// The manager: refines descriptions and coordinates, never uses tools.
    pub fn build_manager(&self) -> Agent {
        Agent::new(
            WorkerKey::Manager,
            prompts::MANAGER_ROLE,
            prompts::MANAGER_GOAL,
            prompts::MANAGER_BACKSTORY,
            self.llm.clone(),
        )
        .with_allow_delegation(true)
        .with_memory(true)
        .with_max_iter(self.max_iter)
    }

    /// The compiler: synthesizes the ledger. Never has tools.
    pub fn build_compiler(&self) -> Agent {
        Agent::new(
            WorkerKey::Compiler,
            prompts::COMPILER_ROLE,
            prompts::COMPILER_GOAL,
            prompts::COMPILER_BACKSTORY,
            self.llm.clone(),
        )
        .with_allow_delegation(false)
        .with_memory(false)
        .with_max_iter(self.max_iter)
    }
}

fn required(id: &str, field: &str, value: &Option<String>) -> Result<String, CrewError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CrewError::configuration(format!(
            "worker {} is missing required field '{}'",
            id, field
        ))),
    }
}
