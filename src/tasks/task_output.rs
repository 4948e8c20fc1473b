//! Task output representation and formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class that represents the result of a task.
///
/// # Fields
///
/// * `index` - Position of the task in the crew
/// * `description` - Description of the task as executed
/// * `name` - Optional name of the task
/// * `expected_output` - Expected output of the task
/// * `summary` - Summary of the task (auto-generated from description)
/// * `raw` - Raw output of the task
/// * `agent` - Role of the agent that executed the task
/// * `tools_used` - Tools the agent actually invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub index: usize,
    pub description: String,
    pub name: Option<String>,
    pub expected_output: Option<String>,
    pub summary: Option<String>,
    pub raw: String,
    pub agent: String,
    #[serde(default)]
    pub tools_used: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl TaskOutput {
    /// Create a new TaskOutput with summary auto-generated from description.
    pub fn new(index: usize, description: String, agent: String, raw: String) -> Self {
        let summary = Self::generate_summary(&description);
        Self {
            index,
            description,
            name: None,
            expected_output: None,
            summary: Some(summary),
            raw,
            agent,
            tools_used: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    /// Generate a summary from the first 10 words of the description.
    fn generate_summary(description: &str) -> String {
        let excerpt: String = description
            .split_whitespace()
            .take(10)
            .collect::<Vec<&str>>()
            .join(" ");
        format!("{}...", excerpt)
    }

    /// Whether the agent invoked any tool.
    pub fn used_tools(&self) -> bool {
        !self.tools_used.is_empty()
    }
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
