//! Crew output representation.
//!
//! Represents the result of a crew execution: the final text, every task
//! output, the per-role ledger and token usage.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::crews::ledger::OutputLedger;
use crate::tasks::task_output::TaskOutput;
use crate::types::usage_metrics::UsageMetrics;

/// Class that represents the result of a crew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Raw output of crew (the final task's raw text).
    pub raw: String,
    /// Output of each task, in execution order.
    pub tasks_output: Vec<TaskOutput>,
    /// Latest output per role.
    pub ledger: OutputLedger,
    /// Processed token summary across all agents.
    pub token_usage: UsageMetrics,
    /// Identifier of the execution that produced this output.
    pub execution_id: Uuid,
}

impl CrewOutput {
    /// Build the crew output from the task outputs.
    ///
    /// Returns `None` when no task ran.
    pub fn from_tasks(
        tasks_output: Vec<TaskOutput>,
        ledger: OutputLedger,
        token_usage: UsageMetrics,
        execution_id: Uuid,
    ) -> Option<Self> {
        let raw = tasks_output.last()?.raw.clone();
        Some(Self {
            raw,
            tasks_output,
            ledger,
            token_usage,
            execution_id,
        })
    }

    /// Output of the task at `index`.
    pub fn task(&self, index: usize) -> Option<&TaskOutput> {
        self.tasks_output.get(index)
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_is_last_task_output() {
        let outputs = vec![
            TaskOutput::new(0, "a".into(), "Researcher".into(), "notes".into()),
            TaskOutput::new(1, "b".into(), "Writer".into(), "article".into()),
        ];
        let output =
            CrewOutput::from_tasks(outputs, OutputLedger::new(), UsageMetrics::new(), Uuid::new_v4())
                .unwrap();
        assert_eq!(output.to_string(), "article");
        assert_eq!(output.task(0).unwrap().raw, "notes");

        assert!(CrewOutput::from_tasks(
            Vec::new(),
            OutputLedger::new(),
            UsageMetrics::new(),
            Uuid::new_v4()
        )
        .is_none());
    }
}
