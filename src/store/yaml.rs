//! Definitions read from a YAML file.
//!
//! ```yaml
//! crews:
//!   - id: 1
//!     agents:
//!       - id: 10
//!         role: Researcher
//!         goal: Gather facts
//!         backstory: A careful analyst
//!         agent_tools: [web_search]
//!     tasks:
//!       - id: 100
//!         agent_id: 10
//!         description: Research the topic
//!         expected_output: Bullet-point notes
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::{DefinitionStore, TaskDefinition, WorkerDefinition};
use crate::utilities::errors::StoreError;

#[derive(Debug, Clone, Deserialize)]
struct CrewFile {
    #[serde(default)]
    crews: Vec<CrewEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct CrewEntry {
    id: i64,
    #[serde(default)]
    agents: Vec<WorkerDefinition>,
    #[serde(default)]
    tasks: Vec<TaskDefinition>,
}

/// Crews loaded once from YAML, returned in file order.
#[derive(Debug, Clone)]
pub struct YamlDefinitionStore {
    crews: Vec<CrewEntry>,
}

impl YamlDefinitionStore {
    /// Parse crews from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, StoreError> {
        let file: CrewFile = serde_yaml::from_str(content)?;
        log::debug!("YamlDefinitionStore loaded {} crew(s)", file.crews.len());
        Ok(Self { crews: file.crews })
    }

    /// Load crews from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn crew(&self, crew_id: i64) -> Option<&CrewEntry> {
        self.crews.iter().find(|c| c.id == crew_id)
    }
}

#[async_trait]
impl DefinitionStore for YamlDefinitionStore {
    fn backend(&self) -> &str {
        "yaml"
    }

    async fn list_workers(&self, crew_id: i64) -> Result<Vec<WorkerDefinition>, StoreError> {
        Ok(self.crew(crew_id).map(|c| c.agents.clone()).unwrap_or_default())
    }

    async fn list_work_items(&self, crew_id: i64) -> Result<Vec<TaskDefinition>, StoreError> {
        Ok(self.crew(crew_id).map(|c| c.tasks.clone()).unwrap_or_default())
    }
}
