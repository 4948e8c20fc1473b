//! Main Crew struct.
//!
//! A `Crew` is one execution: the agents built for it, its task sequence,
//! and the refinement policy. Tasks run strictly one after another.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::agent::core::{Agent, WorkerKey};
use crate::crews::arena::WorkerArena;
use crate::crews::crew_output::CrewOutput;
use crate::crews::ledger::OutputLedger;
use crate::crews::refinement::RefinementStage;
use crate::task::Task;
use crate::tasks::task_output::TaskOutput;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::CrewError;

/// Separator between prior outputs handed to the next task.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Represents a group of agents and the tasks they perform, in order.
pub struct Crew {
    /// Unique identifier for this execution.
    pub id: Uuid,
    /// Identifier of the stored crew.
    pub crew_id: i64,
    /// Every agent of the execution, including the manager and compiler.
    pub workers: WorkerArena,
    /// Tasks in execution order. A compilation task, if any, is last.
    pub tasks: Vec<Task>,
    pub refinement: RefinementStage,
    /// Raw input of the request.
    pub user_input: String,
    /// Metrics for the LLM usage during all tasks execution.
    pub usage_metrics: Option<UsageMetrics>,
}

impl fmt::Debug for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crew")
            .field("id", &self.id)
            .field("crew_id", &self.crew_id)
            .field("workers", &self.workers.len())
            .field("tasks", &self.tasks.len())
            .field("refinement", &self.refinement)
            .finish()
    }
}

impl Crew {
    /// Assemble a crew, checking that the task sequence is runnable.
    ///
    /// * every task's agent is in `workers`
    /// * a compilation task only appears last
    /// * a manager is present when the refinement mode needs one
    pub fn new(
        crew_id: i64,
        workers: WorkerArena,
        tasks: Vec<Task>,
        refinement: RefinementStage,
        user_input: impl Into<String>,
    ) -> Result<Self, CrewError> {
        if tasks.is_empty() {
            return Err(CrewError::configuration(format!(
                "crew {} has no tasks to run",
                crew_id
            )));
        }
        for (index, task) in tasks.iter().enumerate() {
            if !workers.contains(&task.agent) {
                return Err(CrewError::Reference {
                    worker_id: task.agent.to_string(),
                    work_item_id: task.key.clone(),
                });
            }
            if task.is_compilation() && index + 1 != tasks.len() {
                return Err(CrewError::configuration(
                    "the compilation task must be the last task of the crew",
                ));
            }
        }
        if refinement.uses_manager() && !workers.contains(&WorkerKey::Manager) {
            return Err(CrewError::configuration(format!(
                "refinement mode '{}' requires a manager",
                refinement.mode
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            crew_id,
            workers,
            tasks,
            refinement,
            user_input: user_input.into(),
            usage_metrics: None,
        })
    }

    /// Run every task in order and return the crew output.
    ///
    /// Any failure aborts the whole run; no partial output is returned.
    pub async fn kickoff(&mut self) -> Result<CrewOutput, CrewError> {
        log::info!(
            "Crew {} ({}) starting: {} tasks, refinement {}",
            self.crew_id,
            self.id,
            self.tasks.len(),
            self.refinement.mode
        );
        let output = self.run_sequential_process().await?;
        self.usage_metrics = Some(output.token_usage.clone());
        Ok(output)
    }

    /// Execute tasks sequentially and return the final output.
    async fn run_sequential_process(&mut self) -> Result<CrewOutput, CrewError> {
        let manager = self.workers.get(&WorkerKey::Manager).cloned();
        let brief = self
            .refinement
            .coordination_brief(manager.as_deref(), &self.plan()?, &self.user_input)
            .await?;

        let mut ledger = OutputLedger::new();
        let mut task_outputs: Vec<TaskOutput> = Vec::new();
        let mut regular_outputs: Vec<String> = brief.into_iter().collect();

        for (index, task) in self.tasks.iter_mut().enumerate() {
            let agent = assigned_agent(&self.workers, task)?;

            let previous = self
                .refinement
                .previous_output(
                    task,
                    &agent.role,
                    &ledger,
                    task_outputs.last().map(|o| o.raw.as_str()),
                )
                .map(str::to_string);
            self.refinement
                .refine_task(manager.as_deref(), task, &agent.role, previous.as_deref())
                .await?;

            let context = if task.is_compilation() {
                Some(ledger.render()).filter(|c| !c.is_empty())
            } else if regular_outputs.is_empty() {
                None
            } else {
                Some(regular_outputs.join(CONTEXT_SEPARATOR))
            };

            let task_output = task.execute(&agent, context.as_deref(), index).await?;
            log::info!(
                "Task {} '{}' completed by {} in {:.3}s (tools used: {})",
                index + 1,
                task.key,
                agent.role,
                task.execution_duration().unwrap_or_default(),
                if task_output.used_tools() {
                    task_output.tools_used.join(", ")
                } else {
                    "none".to_string()
                }
            );

            ledger.record(&agent.role, task_output.raw.clone());
            if !task.is_compilation() {
                regular_outputs.push(task_output.raw.clone());
            }
            task_outputs.push(task_output);
        }

        self.create_crew_output(task_outputs, ledger)
    }

    /// Roles and descriptions of the regular tasks, for the coordinator.
    fn plan(&self) -> Result<Vec<(String, String)>, CrewError> {
        self.tasks
            .iter()
            .filter(|t| !t.is_compilation())
            .map(|t| Ok((assigned_agent(&self.workers, t)?.role.clone(), t.description.clone())))
            .collect()
    }

    /// Create CrewOutput from task outputs.
    fn create_crew_output(
        &self,
        task_outputs: Vec<TaskOutput>,
        ledger: OutputLedger,
    ) -> Result<CrewOutput, CrewError> {
        let token_usage = self.calculate_usage_metrics();
        CrewOutput::from_tasks(task_outputs, ledger, token_usage, self.id).ok_or_else(|| {
            CrewError::configuration("No task outputs available to create crew output.")
        })
    }

    /// Sum of the usage of every agent in the crew.
    pub fn calculate_usage_metrics(&self) -> UsageMetrics {
        let mut total = UsageMetrics::new();
        for agent in self.workers.iter() {
            total.add_usage_metrics(&agent.usage_metrics());
        }
        total
    }
}

/// Look the task's agent up again; the arena is the only owner.
fn assigned_agent(workers: &WorkerArena, task: &Task) -> Result<Arc<Agent>, CrewError> {
    workers
        .get(&task.agent)
        .cloned()
        .ok_or_else(|| CrewError::Reference {
            worker_id: task.agent.to_string(),
            work_item_id: task.key.clone(),
        })
}

impl fmt::Display for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Crew(id={}, crew_id={}, number_of_agents={}, number_of_tasks={})",
            self.id,
            self.crew_id,
            self.workers.len(),
            self.tasks.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crews::compiler::compiler_task;
    use crate::llms::providers::mock::{MockLLM, MockResponse};
    use crate::process::{RefinementContext, RefinementMode};
    use crate::task::TaskStatus;
    use crate::utilities::prompts;

    fn worker(id: &str, role: &str, llm: &Arc<MockLLM>) -> Agent {
        Agent::new(WorkerKey::stored(id), role, "goal", "backstory", llm.clone()).with_memory(false)
    }

    fn no_refinement() -> RefinementStage {
        RefinementStage::new(RefinementMode::None, RefinementContext::SameRole)
    }

    #[tokio::test]
    async fn test_outputs_flow_into_later_tasks() {
        let llm = Arc::new(
            MockLLM::new()
                .when("You are Researcher.", MockResponse::text("Final Answer: notes"))
                .when("You are Writer.", MockResponse::text("Final Answer: article")),
        );
        let mut workers = WorkerArena::new();
        workers.insert(worker("1", "Researcher", &llm)).unwrap();
        workers.insert(worker("2", "Writer", &llm)).unwrap();
        let tasks = vec![
            Task::new("10", "Research", "Notes", WorkerKey::stored("1")),
            Task::new("11", "Write", "Article", WorkerKey::stored("2")),
        ];

        let mut crew = Crew::new(7, workers, tasks, no_refinement(), "hello").unwrap();
        let output = crew.kickoff().await.unwrap();

        assert_eq!(output.raw, "article");
        assert_eq!(output.tasks_output.len(), 2);
        assert_eq!(output.ledger.get("Researcher"), Some("notes"));
        assert!(crew.tasks.iter().all(|t| t.status == TaskStatus::Completed));

        let writer = llm.requests_containing("You are Writer.");
        let prompt = &writer[0].last().unwrap().content;
        assert!(prompt.ends_with("This is the context you're working with:\nnotes"));
    }

    #[tokio::test]
    async fn test_compiler_receives_rendered_ledger() {
        let llm = Arc::new(
            MockLLM::new()
                .when("You are Researcher.", MockResponse::text("Final Answer: notes"))
                .when("You are Compiler.", MockResponse::text("Final Answer: report")),
        );
        let mut workers = WorkerArena::new();
        workers.insert(worker("1", "Researcher", &llm)).unwrap();
        workers
            .insert(Agent::new(
                WorkerKey::Compiler,
                prompts::COMPILER_ROLE,
                prompts::COMPILER_GOAL,
                prompts::COMPILER_BACKSTORY,
                llm.clone(),
            ))
            .unwrap();
        let tasks = vec![
            Task::new("10", "Research", "Notes", WorkerKey::stored("1")),
            compiler_task(&["Researcher".to_string()]),
        ];

        let mut crew = Crew::new(7, workers, tasks, no_refinement(), "").unwrap();
        let output = crew.kickoff().await.unwrap();

        assert_eq!(output.raw, "report");
        let compiler = llm.requests_containing("You are Compiler.");
        assert!(compiler[0].last().unwrap().content.ends_with("## Researcher\nnotes"));
    }

    #[test]
    fn test_new_validates_sequence() {
        let llm = Arc::new(MockLLM::new());
        let mut workers = WorkerArena::new();
        workers.insert(worker("1", "Researcher", &llm)).unwrap();

        let dangling = vec![Task::new("10", "Research", "Notes", WorkerKey::stored("2"))];
        let err = Crew::new(1, workers.clone(), dangling, no_refinement(), "").unwrap_err();
        assert_eq!(err.to_string(), "Worker 2 not found for work item 10");

        let tasks = vec![Task::new("10", "Research", "Notes", WorkerKey::stored("1"))];
        let err = Crew::new(1, workers.clone(), tasks, RefinementStage::default(), "").unwrap_err();
        assert!(matches!(err, CrewError::Configuration { .. }));

        assert!(Crew::new(1, workers, Vec::new(), no_refinement(), "").is_err());
    }

    #[tokio::test]
    async fn test_usage_is_summed_over_agents() {
        let llm = Arc::new(MockLLM::new());
        let mut workers = WorkerArena::new();
        workers.insert(worker("1", "Researcher", &llm)).unwrap();
        let tasks = vec![Task::new("10", "Research", "Notes", WorkerKey::stored("1"))];
        let mut crew = Crew::new(1, workers, tasks, no_refinement(), "").unwrap();

        let output = crew.kickoff().await.unwrap();
        assert_eq!(output.raw, "Completed: Research");
        assert_eq!(crew.usage_metrics.as_ref(), Some(&output.token_usage));
        assert!(crew.to_string().starts_with("Crew(id="));
    }
}
