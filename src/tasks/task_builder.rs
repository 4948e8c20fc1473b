//! Work-item builder: tasks from stored definitions.

use crate::agent::core::WorkerKey;
use crate::crews::arena::WorkerArena;
use crate::store::TaskDefinition;
use crate::task::Task;
use crate::utilities::errors::CrewError;
use crate::utilities::prompts;

/// Build one task from its stored definition.
///
/// * The assigned worker must already be in `workers`, else the crew is
///   inconsistent and a reference error is returned.
/// * Only the first task gets `user_input` spliced into its description.
/// * `previous_output` is not put in the description; it is kept as the
///   task's refinement context for the manager.
pub fn build_task(
    definition: &TaskDefinition,
    workers: &WorkerArena,
    is_first: bool,
    user_input: &str,
    previous_output: Option<&str>,
) -> Result<Task, CrewError> {
    let worker_id = definition.assigned_worker_id.as_deref().ok_or_else(|| {
        CrewError::configuration(format!(
            "task {} is missing required field 'agent_id'",
            definition.id
        ))
    })?;
    let key = WorkerKey::stored(worker_id);
    if !workers.contains(&key) {
        return Err(CrewError::Reference {
            worker_id: worker_id.to_string(),
            work_item_id: definition.id.clone(),
        });
    }

    let description = required(&definition.id, "description", &definition.description)?;
    let expected_output = required(&definition.id, "expected_output", &definition.expected_output)?;

    let description = if is_first {
        prompts::with_user_input(&description, user_input)
    } else {
        description
    };

    Ok(Task::new(definition.id.clone(), description, expected_output, key)
        .with_name(definition.name.clone())
        .with_refinement_context(previous_output.map(str::to_string)))
}

fn required(id: &str, field: &str, value: &Option<String>) -> Result<String, CrewError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(CrewError::configuration(format!(
            "task {} is missing required field '{}'",
            id, field
        ))),
    }
}
