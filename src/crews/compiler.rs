//! Compiler stage: the final task that consolidates the ledger.

use crate::agent::core::WorkerKey;
use crate::task::{Task, TaskKind};
use crate::utilities::prompts;

/// Key of the appended compilation task.
pub const COMPILER_TASK_KEY: &str = "compiler";

/// Build the compilation task over the given roles.
///
/// The ledger itself is handed over as context at execution time, so the
/// task sees the final state of every role.
pub fn compiler_task(roles: &[String]) -> Task {
    Task::new(
        COMPILER_TASK_KEY,
        prompts::compiler_description(roles),
        prompts::COMPILER_EXPECTED_OUTPUT,
        WorkerKey::Compiler,
    )
    .with_name(Some("Compile final report".to_string()))
    .with_kind(TaskKind::Compilation)
}
