//! Crew execution orchestrator.
//!
//! Turns a stored crew into a runnable [`Crew`]: fetch the definitions, build
//! the agents and the manager, build the tasks, append the compiler, then run
//! the sequence and return the final text.

use std::sync::Arc;

use crate::agent::factory::WorkerFactory;
use crate::capabilities::CapabilityRegistry;
use crate::crew::Crew;
use crate::crews::arena::WorkerArena;
use crate::crews::compiler::compiler_task;
use crate::crews::crew_output::CrewOutput;
use crate::crews::refinement::RefinementStage;
use crate::llms::base_llm::BaseLLM;
use crate::process::RefinementContext;
use crate::store::DefinitionStore;
use crate::tasks::task_builder::build_task;
use crate::utilities::config::OrchestratorConfig;
use crate::utilities::errors::CrewError;

/// Executes stored crews.
///
/// The registry and the reasoning engine are shared by every execution;
/// everything else (agents, tasks, ledger) is built per execution.
#[derive(Debug, Clone)]
pub struct CrewOrchestrator {
    store: Arc<dyn DefinitionStore>,
    registry: Arc<CapabilityRegistry>,
    llm: Arc<dyn BaseLLM>,
    config: OrchestratorConfig,
}

impl CrewOrchestrator {
    pub fn new(
        store: Arc<dyn DefinitionStore>,
        registry: Arc<CapabilityRegistry>,
        llm: Arc<dyn BaseLLM>,
    ) -> Self {
        Self {
            store,
            registry,
            llm,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Execute a crew and return the text of its final task.
    pub async fn execute(&self, crew_id: i64, input: &str) -> Result<String, CrewError> {
        Ok(self.execute_detailed(crew_id, input).await?.raw)
    }

    /// Execute a crew and return the full output.
    ///
    /// With a configured timeout, the in-flight call is dropped when it
    /// expires and the whole execution fails.
    pub async fn execute_detailed(
        &self,
        crew_id: i64,
        input: &str,
    ) -> Result<CrewOutput, CrewError> {
        log::info!(
            "Executing crew {} from {} store (refinement {}, context {}, compile {})",
            crew_id,
            self.store.backend(),
            self.config.refinement_mode,
            self.config.refinement_context,
            self.config.compile_final_report
        );
        let run = async {
            let mut crew = self.prepare(crew_id, input).await?;
            crew.kickoff().await
        };
        let result = match self.config.execution_timeout() {
            Some(limit) => tokio::time::timeout(limit, run).await.unwrap_or_else(|_| {
                Err(CrewError::Timeout {
                    crew_id,
                    seconds: limit.as_secs(),
                })
            }),
            None => run.await,
        };
        match &result {
            Ok(output) => log::info!(
                "Crew {} finished: {} tasks, {} tokens",
                crew_id,
                output.tasks_output.len(),
                output.token_usage.total_tokens
            ),
            Err(e) => log::error!("Crew {} failed: {}", crew_id, e),
        }
        result
    }

    /// Fetch the definitions and build the crew without running it.
    pub async fn prepare(&self, crew_id: i64, input: &str) -> Result<Crew, CrewError> {
        let worker_definitions = self.store.list_workers(crew_id).await?;
        let task_definitions = self.store.list_work_items(crew_id).await?;
        if worker_definitions.is_empty() {
            return Err(CrewError::NotFound {
                crew_id,
                what: "workers".to_string(),
            });
        }
        if task_definitions.is_empty() {
            return Err(CrewError::NotFound {
                crew_id,
                what: "work items".to_string(),
            });
        }
        log::debug!(
            "Crew {}: {} worker definitions, {} task definitions",
            crew_id,
            worker_definitions.len(),
            task_definitions.len()
        );

        let factory = WorkerFactory::new(self.registry.clone(), self.llm.clone())
            .with_defaults(self.config.worker_defaults)
            .with_max_iter(self.config.max_iter);

        let mut workers = WorkerArena::new();
        for definition in &worker_definitions {
            workers.insert(factory.build(definition)?)?;
        }
        if self.config.refinement_mode.uses_manager() {
            workers.insert(factory.build_manager())?;
        }

        let seeded_context = match self.config.refinement_context {
            RefinementContext::UserInput => Some(input),
            _ => None,
        };
        let mut tasks = Vec::with_capacity(task_definitions.len() + 1);
        for (index, definition) in task_definitions.iter().enumerate() {
            tasks.push(build_task(
                definition,
                &workers,
                index == 0,
                input,
                seeded_context,
            )?);
        }

        if self.config.compile_final_report {
            let mut roles: Vec<String> = Vec::new();
            for task in &tasks {
                if let Some(agent) = workers.get(&task.agent) {
                    if !roles.contains(&agent.role) {
                        roles.push(agent.role.clone());
                    }
                }
            }
            workers.insert(factory.build_compiler())?;
            tasks.push(compiler_task(&roles));
        }

        let refinement =
            RefinementStage::new(self.config.refinement_mode, self.config.refinement_context);
        Crew::new(crew_id, workers, tasks, refinement, input)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llms::base_llm::{LLMMessage, MessageRole};
    use crate::llms::providers::mock::{MockLLM, MockResponse};
    use crate::process::RefinementMode;
    use crate::store::{InMemoryDefinitionStore, TaskDefinition, WorkerDefinition};
    use crate::tools::Tool;

    fn three_step_store() -> InMemoryDefinitionStore {
        InMemoryDefinitionStore::new().with_crew(
            1,
            vec![
                WorkerDefinition::new("1", "Researcher", "find facts", "curious"),
                WorkerDefinition::new("2", "Writer", "write well", "wordsmith"),
                WorkerDefinition::new("3", "Editor", "polish", "strict"),
            ],
            vec![
                TaskDefinition::new("10", "1", "Research the topic", "Notes"),
                TaskDefinition::new("11", "2", "Write the article", "Article"),
                TaskDefinition::new("12", "3", "Edit the article", "Final text"),
            ],
        )
    }

    fn orchestrator(
        store: InMemoryDefinitionStore,
        llm: Arc<MockLLM>,
        config: OrchestratorConfig,
    ) -> CrewOrchestrator {
        CrewOrchestrator::new(Arc::new(store), Arc::new(CapabilityRegistry::new()), llm)
            .with_config(config)
    }

    fn no_refinement() -> OrchestratorConfig {
        OrchestratorConfig::default().with_refinement_mode(RefinementMode::None)
    }

    fn system_prompt(messages: &[LLMMessage]) -> &str {
        messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    fn persona_sequence(llm: &MockLLM) -> Vec<String> {
        llm.requests()
            .iter()
            .map(|messages| {
                let system = system_prompt(messages);
                system
                    .strip_prefix("You are ")
                    .and_then(|rest| rest.split('.').next())
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_runs_each_item_once_in_stored_order() {
        let llm = Arc::new(MockLLM::new());
        let orch = orchestrator(three_step_store(), llm.clone(), no_refinement());

        let result = orch.execute(1, "hello").await.unwrap();
        assert_eq!(result, "Completed: Edit the article");
        assert_eq!(persona_sequence(&llm), vec!["Researcher", "Writer", "Editor"]);
    }

    #[tokio::test]
    async fn test_refines_each_item_once_before_it_runs() {
        let llm = Arc::new(MockLLM::new());
        let orch = orchestrator(three_step_store(), llm.clone(), OrchestratorConfig::default());

        let output = orch.execute_detailed(1, "hello").await.unwrap();
        assert_eq!(
            persona_sequence(&llm),
            vec!["Manager", "Researcher", "Manager", "Writer", "Manager", "Editor"]
        );
        // the manager remembers its earlier requests, so the Writer's
        // refinement shows up again in the Editor's
        assert_eq!(
            llm.requests_containing("Manager is refining this task for the Writer.").len(),
            2
        );
        assert_eq!(output.tasks_output[1].description, "Completed: Write the article");
    }

    #[tokio::test]
    async fn test_ledger_keeps_latest_output_of_shared_role() {
        let store = InMemoryDefinitionStore::new().with_crew(
            1,
            vec![
                WorkerDefinition::new("1", "Writer", "write", "a"),
                WorkerDefinition::new("2", "Writer", "write", "b"),
            ],
            vec![
                TaskDefinition::new("10", "1", "First draft", "Draft"),
                TaskDefinition::new("11", "2", "Second draft", "Draft"),
            ],
        );
        let llm = Arc::new(MockLLM::new().when_sequence(
            "You are Writer.",
            vec![
                MockResponse::text("Final Answer: early"),
                MockResponse::text("Final Answer: late"),
            ],
        ));
        let output = orchestrator(store, llm, no_refinement())
            .execute_detailed(1, "")
            .await
            .unwrap();

        assert_eq!(output.ledger.len(), 1);
        assert_eq!(output.ledger.get("Writer"), Some("late"));
        assert_eq!(output.tasks_output.len(), 2);
    }

    #[tokio::test]
    async fn test_user_input_reaches_first_item_only() {
        let llm = Arc::new(MockLLM::new());
        let orch = orchestrator(three_step_store(), llm.clone(), no_refinement());

        let crew = orch.prepare(1, "hello").await.unwrap();
        let with_input: Vec<bool> = crew
            .tasks
            .iter()
            .map(|t| t.description.contains("hello"))
            .collect();
        assert_eq!(with_input, vec![true, false, false]);

        orch.execute(1, "hello").await.unwrap();
        assert_eq!(llm.requests_containing("hello").len(), 1);
    }

    #[tokio::test]
    async fn test_dangling_item_fails_whole_crew() {
        let store = InMemoryDefinitionStore::new().with_crew(
            1,
            vec![WorkerDefinition::new("1", "Researcher", "g", "b")],
            vec![
                TaskDefinition::new("10", "1", "Research", "Notes"),
                TaskDefinition::new("11", "42", "Write", "Article"),
            ],
        );
        let llm = Arc::new(MockLLM::new());
        let err = orchestrator(store, llm.clone(), no_refinement())
            .execute(1, "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, CrewError::Reference { .. }));
        assert_eq!(err.to_string(), "Worker 42 not found for work item 11");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_crew_is_not_found_before_construction() {
        let store = InMemoryDefinitionStore::new().with_crew(
            1,
            vec![WorkerDefinition {
                id: "1".to_string(),
                ..Default::default()
            }],
            Vec::new(),
        );
        let llm = Arc::new(MockLLM::new());
        let orch = orchestrator(store, llm.clone(), OrchestratorConfig::default());

        // the malformed worker is never built
        let err = orch.execute(1, "x").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No work items found for crew 1");

        let err = orch.execute(99, "x").await.unwrap_err();
        assert_eq!(err.to_string(), "No workers found for crew 99");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_compiler_runs_last_and_its_report_is_the_result() {
        let llm = Arc::new(
            MockLLM::new().when("You are Compiler.", MockResponse::text("Final Answer: REPORT")),
        );
        let config = no_refinement().with_compile_final_report(true);
        let output = orchestrator(three_step_store(), llm.clone(), config)
            .execute_detailed(1, "hello")
            .await
            .unwrap();

        assert_eq!(output.raw, "REPORT");
        assert_eq!(output.tasks_output.len(), 4);
        assert_eq!(
            persona_sequence(&llm),
            vec!["Researcher", "Writer", "Editor", "Compiler"]
        );
        let requests = llm.requests();
        let compiler_prompt = &requests[3].last().unwrap().content;
        assert!(compiler_prompt.contains("## Researcher\nCompleted: Research the topic"));
        assert!(compiler_prompt.contains("## Editor\nCompleted: Edit the article"));
    }

    #[tokio::test]
    async fn test_coordinator_brief_goes_to_every_item() {
        let llm = Arc::new(MockLLM::new().when(
            "Coordinate the crew",
            MockResponse::text("Final Answer: stay focused"),
        ));
        let config = OrchestratorConfig::default().with_refinement_mode(RefinementMode::Coordinator);
        let output = orchestrator(three_step_store(), llm.clone(), config)
            .execute_detailed(1, "hello")
            .await
            .unwrap();

        assert_eq!(llm.requests_containing("Coordinate the crew").len(), 1);
        assert_eq!(persona_sequence(&llm)[0], "Manager");
        assert_eq!(llm.call_count(), 4);
        assert_eq!(llm.requests_containing("stay focused").len(), 3);
        assert!(output.tasks_output[2]
            .description
            .starts_with("Manager assignment for the Editor:\n"));
    }

    #[tokio::test]
    async fn test_braced_user_input_survives_coordinator_brief() {
        let llm = Arc::new(MockLLM::new().when(
            "Coordinate the crew",
            MockResponse::text("Final Answer: BRIEF"),
        ));
        let config = OrchestratorConfig::default().with_refinement_mode(RefinementMode::Coordinator);
        orchestrator(three_step_store(), llm.clone(), config)
            .execute(1, "please expand {context} here")
            .await
            .unwrap();

        let requests = llm.requests();
        let researcher = requests
            .iter()
            .find(|messages| system_prompt(messages).starts_with("You are Researcher."))
            .unwrap();
        let prompt = &researcher.last().unwrap().content;
        assert!(prompt.contains("User input: please expand {context} here\n"));
        assert_eq!(prompt.matches("BRIEF").count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_executions_are_isolated() {
        let llm = Arc::new(
            MockLLM::new()
                .when("User input: aaa", MockResponse::text("Final Answer: notes for aaa"))
                .when("User input: bbb", MockResponse::text("Final Answer: notes for bbb")),
        );
        let orch = orchestrator(three_step_store(), llm.clone(), no_refinement());

        let (a, b) = tokio::join!(orch.execute_detailed(1, "aaa"), orch.execute_detailed(1, "bbb"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.execution_id, b.execution_id);
        assert_eq!(a.ledger.get("Researcher"), Some("notes for aaa"));
        assert_eq!(b.ledger.get("Researcher"), Some("notes for bbb"));
        assert_eq!(a.tasks_output.len(), 3);
        assert_eq!(b.tasks_output.len(), 3);
        assert_eq!(llm.call_count(), 6);

        assert_eq!(llm.requests_containing("User input: aaa").len(), 1);
        assert_eq!(llm.requests_containing("User input: bbb").len(), 1);
        let mixed = llm.requests().into_iter().filter(|messages| {
            let text: String = messages.iter().map(|m| m.content.as_str()).collect();
            text.contains("aaa") && text.contains("bbb")
        });
        assert_eq!(mixed.count(), 0);
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_for_completion() {
        let llm = Arc::new(MockLLM::new().when(
            "You are Researcher.",
            MockResponse::text("Final Answer: slow notes").with_latency(Duration::from_millis(50)),
        ));
        let config = no_refinement().with_execution_timeout_secs(Some(0));
        let output = orchestrator(three_step_store(), llm, config)
            .execute_detailed(1, "")
            .await
            .unwrap();
        assert_eq!(output.tasks_output[0].raw, "slow notes");
    }

    #[tokio::test]
    async fn test_previous_item_context_reaches_manager() {
        let llm = Arc::new(
            MockLLM::new()
                .when("You are Researcher.", MockResponse::text("Final Answer: raw notes"))
                .when("You are Manager.", MockResponse::text("Final Answer: refined")),
        );
        let config = OrchestratorConfig::default()
            .with_refinement_context(RefinementContext::PreviousItem);
        orchestrator(three_step_store(), llm.clone(), config)
            .execute(1, "hello")
            .await
            .unwrap();

        assert!(!llm
            .requests_containing("Previous task output to consider: raw notes")
            .is_empty());
    }

    #[tokio::test]
    async fn test_user_input_context_seeds_every_refinement() {
        let llm = Arc::new(MockLLM::new());
        let config =
            OrchestratorConfig::default().with_refinement_context(RefinementContext::UserInput);
        let crew = orchestrator(three_step_store(), llm, config)
            .prepare(1, "hello")
            .await
            .unwrap();
        assert!(crew
            .tasks
            .iter()
            .all(|t| t.refinement_context.as_deref() == Some("hello")));
    }

    #[tokio::test]
    async fn test_capability_failure_aborts_execution() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Tool::new("broken", "always fails", |_| {
            Err(crate::utilities::errors::ToolError::ExecutionFailed("down".to_string()))
        })));
        let store = InMemoryDefinitionStore::new().with_crew(
            1,
            vec![WorkerDefinition::new("1", "Researcher", "g", "b").with_capabilities(["broken"])],
            vec![TaskDefinition::new("10", "1", "Research", "Notes")],
        );
        let llm = Arc::new(MockLLM::new().with_response(MockResponse::text(
            "Thought: look it up\nAction: broken\nAction Input: {\"q\": \"x\"}",
        )));
        let err = CrewOrchestrator::new(Arc::new(store), Arc::new(registry), llm)
            .with_config(no_refinement())
            .execute(1, "")
            .await
            .unwrap_err();
        assert!(matches!(err, CrewError::CapabilityInvocation { .. }));
    }

    #[tokio::test]
    async fn test_engine_failure_is_execution_error() {
        let llm = Arc::new(MockLLM::new().when("You are Writer.", MockResponse::error("overloaded")));
        let err = orchestrator(three_step_store(), llm, no_refinement())
            .execute(1, "")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Execution failed for worker 'Writer': overloaded"
        );
    }

    #[tokio::test]
    async fn test_timeout_fails_execution() {
        let llm = Arc::new(MockLLM::new().when(
            "You are Researcher.",
            MockResponse::text("Final Answer: late").with_latency(Duration::from_secs(30)),
        ));
        let config = no_refinement().with_execution_timeout_secs(Some(1));
        let err = orchestrator(three_step_store(), llm, config)
            .execute(1, "")
            .await
            .unwrap_err();
        assert!(matches!(err, CrewError::Timeout { crew_id: 1, seconds: 1 }));
    }
}
