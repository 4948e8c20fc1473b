//! Task sub-modules for task output and task construction.

pub mod task_builder;
pub mod task_output;

pub use task_builder::build_task;
pub use task_output::TaskOutput;
