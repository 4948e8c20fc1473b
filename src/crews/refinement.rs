//! Refinement stage: how the manager shapes task descriptions.

use crate::agent::core::{Agent, WorkerKey};
use crate::crews::ledger::OutputLedger;
use crate::process::{RefinementContext, RefinementMode};
use crate::task::Task;
use crate::utilities::errors::CrewError;
use crate::utilities::prompts;

/// Ask the manager to rewrite one description.
///
/// Exactly one call into the manager's execution capability.
pub async fn refine(
    manager: &Agent,
    description: &str,
    role: &str,
    previous_output: Option<&str>,
) -> Result<String, CrewError> {
    let request = Task::new(
        "refinement",
        prompts::refinement_request(description, role, previous_output),
        prompts::REFINED_EXPECTED_OUTPUT,
        WorkerKey::Manager,
    );
    let execution = manager.execute_task(&request, None).await?;
    Ok(execution.output)
}

/// Policy pair selected for one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefinementStage {
    pub mode: RefinementMode,
    pub context: RefinementContext,
}

impl RefinementStage {
    pub fn new(mode: RefinementMode, context: RefinementContext) -> Self {
        Self { mode, context }
    }

    pub fn uses_manager(&self) -> bool {
        self.mode.uses_manager()
    }

    /// Pick the output the manager should consider for `task`.
    pub fn previous_output<'a>(
        &self,
        task: &'a Task,
        role: &str,
        ledger: &'a OutputLedger,
        last_output: Option<&'a str>,
    ) -> Option<&'a str> {
        match self.context {
            RefinementContext::SameRole => ledger.get(role),
            RefinementContext::PreviousItem => last_output,
            RefinementContext::UserInput => task.refinement_context.as_deref(),
        }
    }

    /// Run the refining state for one task.
    ///
    /// Compilation tasks and the `none` mode leave the description as is.
    pub async fn refine_task(
        &self,
        manager: Option<&Agent>,
        task: &mut Task,
        role: &str,
        previous_output: Option<&str>,
    ) -> Result<(), CrewError> {
        if task.is_compilation() {
            return Ok(());
        }
        match self.mode {
            RefinementMode::None => Ok(()),
            RefinementMode::Coordinator => {
                task.begin_refinement();
                let assigned = prompts::coordinator_assignment(&task.description, role);
                task.apply_refinement(assigned);
                Ok(())
            }
            RefinementMode::TextRefiner => {
                let manager = manager.ok_or_else(|| {
                    CrewError::configuration("text-refiner mode requires a manager")
                })?;
                task.begin_refinement();
                log::debug!("Manager refining task '{}' for {}", task.key, role);
                let refined = refine(manager, &task.description, role, previous_output).await?;
                task.apply_refinement(refined);
                Ok(())
            }
        }
    }

    /// The coordinator's brief over the whole plan, or `None` in other modes.
    pub async fn coordination_brief(
        &self,
        manager: Option<&Agent>,
        plan: &[(String, String)],
        user_input: &str,
    ) -> Result<Option<String>, CrewError> {
        if self.mode != RefinementMode::Coordinator {
            return Ok(None);
        }
        let manager = manager
            .ok_or_else(|| CrewError::configuration("coordinator mode requires a manager"))?;
        let request = Task::new(
            "coordination",
            prompts::coordination_request(plan, user_input),
            prompts::COORDINATION_EXPECTED_OUTPUT,
            WorkerKey::Manager,
        );
        let execution = manager.execute_task(&request, None).await?;
        Ok(Some(execution.output))
    }
}
