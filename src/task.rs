//! Main Task struct (a crew's work item).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::agent::core::{Agent, WorkerKey};
use crate::tasks::task_output::TaskOutput;
use crate::utilities::errors::CrewError;
use crate::utilities::prompts;

/// What a task contributes to the crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Built from a stored definition.
    Work,
    /// The appended report over the whole ledger.
    Compilation,
}

/// Lifecycle of a task within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Refining,
    Executing,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Refining => "refining",
            TaskStatus::Executing => "executing",
            TaskStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Represents a task to be executed by one agent.
///
/// A task references its agent by [`WorkerKey`]; the agent itself lives in
/// the crew's worker arena and is shared by every task assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this instance.
    pub id: Uuid,
    /// Key of the stored definition, or `compiler` for the compilation task.
    pub key: String,
    /// Optional name for the task.
    pub name: Option<String>,
    /// Descriptive text detailing the task's purpose. Rewritten by refinement.
    pub description: String,
    /// Description before refinement, once refinement has run.
    pub original_description: Option<String>,
    /// Clear definition of expected task outcome.
    pub expected_output: String,
    /// Agent responsible for execution.
    pub agent: WorkerKey,
    /// Always false: tasks of a crew run one at a time.
    pub async_execution: bool,
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// Refinement context fixed at build time (the user input), if any.
    pub refinement_context: Option<String>,
    /// Task output, set once completed.
    pub output: Option<TaskOutput>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a pending work task.
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: WorkerKey,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            name: None,
            description: description.into(),
            original_description: None,
            expected_output: expected_output.into(),
            agent,
            async_execution: false,
            kind: TaskKind::Work,
            status: TaskStatus::Pending,
            refinement_context: None,
            output: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_refinement_context(mut self, context: Option<String>) -> Self {
        self.refinement_context = context;
        self
    }

    pub fn is_compilation(&self) -> bool {
        self.kind == TaskKind::Compilation
    }

    /// Generate the task prompt, with context when given.
    pub fn prompt(&self, context: Option<&str>) -> String {
        prompts::task_prompt(&self.description, &self.expected_output, context)
    }

    /// Enter the refining state.
    pub fn begin_refinement(&mut self) {
        self.status = TaskStatus::Refining;
    }

    /// Replace the description with refined text, keeping the original.
    pub fn apply_refinement(&mut self, refined: impl Into<String>) {
        if self.original_description.is_none() {
            self.original_description = Some(self.description.clone());
        }
        self.description = refined.into();
    }

    /// Execute the task with its assigned agent.
    ///
    /// `index` is the task's position in the crew, recorded on the output.
    pub async fn execute(
        &mut self,
        agent: &Agent,
        context: Option<&str>,
        index: usize,
    ) -> Result<TaskOutput, CrewError> {
        self.status = TaskStatus::Executing;
        self.start_time = Some(Utc::now());

        let execution = agent.execute_task(self, context).await?;

        let end_time = Utc::now();
        let mut output = TaskOutput::new(
            index,
            self.description.clone(),
            agent.role.clone(),
            execution.output,
        );
        output.name = self.name.clone();
        output.expected_output = Some(self.expected_output.clone());
        output.tools_used = execution.tools_used;
        output.start_time = self.start_time;
        output.end_time = Some(end_time);

        self.output = Some(output.clone());
        self.end_time = Some(end_time);
        self.status = TaskStatus::Completed;
        Ok(output)
    }

    /// Get the execution duration in seconds, if both start and end times are set.
    pub fn execution_duration(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llms::providers::mock::{MockLLM, MockResponse};

    #[test]
    fn test_new_task_is_pending_and_sync() {
        let task = Task::new("1", "Research", "Notes", WorkerKey::stored("7"));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.async_execution);
        assert_eq!(task.kind, TaskKind::Work);
        assert!(task.output.is_none());
    }

    #[test]
    fn test_apply_refinement_keeps_first_original() {
        let mut task = Task::new("1", "v1", "out", WorkerKey::stored("7"));
        task.begin_refinement();
        task.apply_refinement("v2");
        task.apply_refinement("v3");
        assert_eq!(task.status, TaskStatus::Refining);
        assert_eq!(task.description, "v3");
        assert_eq!(task.original_description.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_execute_records_output() {
        let llm = Arc::new(MockLLM::new().with_response(MockResponse::text("Final Answer: notes")));
        let agent = Agent::new(WorkerKey::stored("7"), "Researcher", "g", "b", llm);
        let mut task = Task::new("1", "Research", "Notes", WorkerKey::stored("7"));

        let output = task.execute(&agent, Some("ctx"), 0).await.unwrap();
        assert_eq!(output.raw, "notes");
        assert_eq!(output.agent, "Researcher");
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.execution_duration().is_some());
        assert_eq!(agent.execution_count(), 1);
    }
}
