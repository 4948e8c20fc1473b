//! In-process definition store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{DefinitionStore, TaskDefinition, WorkerDefinition};
use crate::utilities::errors::StoreError;

#[derive(Debug, Default, Clone)]
struct CrewRecords {
    workers: Vec<WorkerDefinition>,
    tasks: Vec<TaskDefinition>,
}

/// Definitions held in memory, returned in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryDefinitionStore {
    crews: RwLock<HashMap<i64, CrewRecords>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a crew's definitions.
    pub fn insert_crew(
        &self,
        crew_id: i64,
        workers: Vec<WorkerDefinition>,
        tasks: Vec<TaskDefinition>,
    ) {
        self.crews
            .write()
            .insert(crew_id, CrewRecords { workers, tasks });
    }

    /// Builder form of [`insert_crew`](Self::insert_crew).
    pub fn with_crew(
        self,
        crew_id: i64,
        workers: Vec<WorkerDefinition>,
        tasks: Vec<TaskDefinition>,
    ) -> Self {
        self.insert_crew(crew_id, workers, tasks);
        self
    }

    pub fn add_worker(&self, crew_id: i64, worker: WorkerDefinition) {
        self.crews.write().entry(crew_id).or_default().workers.push(worker);
    }

    pub fn add_task(&self, crew_id: i64, task: TaskDefinition) {
        self.crews.write().entry(crew_id).or_default().tasks.push(task);
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn list_workers(&self, crew_id: i64) -> Result<Vec<WorkerDefinition>, StoreError> {
        Ok(self
            .crews
            .read()
            .get(&crew_id)
            .map(|c| c.workers.clone())
            .unwrap_or_default())
    }

    async fn list_work_items(&self, crew_id: i64) -> Result<Vec<TaskDefinition>, StoreError> {
        Ok(self
            .crews
            .read()
            .get(&crew_id)
            .map(|c| c.tasks.clone())
            .unwrap_or_default())
    }
}
