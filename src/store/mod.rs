//! Definition stores: where crews' worker and task definitions come from.
//!
//! Every store answers two queries for a crew id, both in stored order:
//! the worker definitions and the task definitions. Records use the hosted
//! schema's column names (`agent_tools`, `agent_id`) as aliases, and ids may
//! arrive as integers or strings.
//!
//! - [`memory`] - In-process store for tests and embedding
//! - [`sqlite`] - Local SQLite database
//! - [`supabase`] - Hosted PostgREST tables
//! - [`yaml`] - A YAML file of crews

pub mod memory;
pub mod sqlite;
pub mod supabase;
pub mod yaml;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utilities::errors::StoreError;

pub use memory::InMemoryDefinitionStore;
pub use sqlite::SqliteDefinitionStore;
pub use supabase::SupabaseDefinitionStore;
pub use yaml::YamlDefinitionStore;

/// A stored worker definition.
///
/// Required persona fields are optional here so a malformed record can be
/// reported as a configuration error when the worker is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerDefinition {
    #[serde(deserialize_with = "de_opaque_id")]
    pub id: String,
    #[serde(default)]
    pub crew_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub backstory: Option<String>,
    #[serde(default, alias = "agent_tools", deserialize_with = "de_string_list")]
    pub capability_names: Vec<String>,
    #[serde(default)]
    pub allow_delegation: Option<bool>,
    #[serde(default)]
    pub memory: Option<bool>,
}

impl WorkerDefinition {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: Some(role.into()),
            goal: Some(goal.into()),
            backstory: Some(backstory.into()),
            ..Default::default()
        }
    }

    pub fn with_capabilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capability_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A stored task definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(deserialize_with = "de_opaque_id")]
    pub id: String,
    #[serde(default)]
    pub crew_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default, alias = "agent_id", deserialize_with = "de_opaque_id_opt")]
    pub assigned_worker_id: Option<String>,
}

impl TaskDefinition {
    pub fn new(
        id: impl Into<String>,
        assigned_worker_id: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            assigned_worker_id: Some(assigned_worker_id.into()),
            description: Some(description.into()),
            expected_output: Some(expected_output.into()),
            ..Default::default()
        }
    }
}

/// Source of crew definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync + fmt::Debug {
    /// Short backend name for logs.
    fn backend(&self) -> &str;

    /// Worker definitions of a crew, in stored order.
    async fn list_workers(&self, crew_id: i64) -> Result<Vec<WorkerDefinition>, StoreError>;

    /// Task definitions of a crew, in stored order.
    async fn list_work_items(&self, crew_id: i64) -> Result<Vec<TaskDefinition>, StoreError>;
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

fn opaque_id(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(format!("expected an integer or string id, got {}", other)),
    }
}

/// Accept an integer or string id and keep its string form.
pub fn de_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    opaque_id(value)
        .map_err(serde::de::Error::custom)?
        .ok_or_else(|| serde::de::Error::custom("id must not be null"))
}

/// Like [`de_opaque_id`], allowing null.
pub fn de_opaque_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    opaque_id(value).map_err(serde::de::Error::custom)
}

/// Accept a list of names, null, a JSON-encoded list, or a comma-separated
/// string.
pub fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_string_list(value).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_string_list(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(format!("expected a string, got {}", other)),
            })
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                return serde_json::from_str::<Value>(trimmed)
                    .map_err(|e| e.to_string())
                    .and_then(parse_string_list);
            }
            Ok(trimmed
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }
        other => Err(format!("expected a list of names, got {}", other)),
    }
}
