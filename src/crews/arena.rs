//! The worker arena: every agent of one execution, by key.

use std::sync::Arc;

use crate::agent::core::{Agent, WorkerKey};
use crate::utilities::errors::CrewError;

/// Insertion-ordered map from [`WorkerKey`] to agent.
///
/// Tasks hold keys into the arena; the arena owns the agents for the
/// lifetime of the execution.
#[derive(Debug, Default, Clone)]
pub struct WorkerArena {
    workers: Vec<(WorkerKey, Arc<Agent>)>,
}

impl WorkerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent under its own key. Duplicate keys are rejected.
    pub fn insert(&mut self, agent: Agent) -> Result<Arc<Agent>, CrewError> {
        if self.contains(&agent.key) {
            return Err(CrewError::configuration(format!(
                "duplicate worker id {}",
                agent.key
            )));
        }
        let agent = Arc::new(agent);
        self.workers.push((agent.key.clone(), agent.clone()));
        Ok(agent)
    }

    pub fn get(&self, key: &WorkerKey) -> Option<&Arc<Agent>> {
        self.workers.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    pub fn contains(&self, key: &WorkerKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.workers.iter().map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
