//! Crew sub-modules: the per-execution containers and the stages of the
//! sequential pipeline.

pub mod arena;
pub mod compiler;
pub mod crew_output;
pub mod ledger;
pub mod refinement;

pub use arena::WorkerArena;
pub use compiler::compiler_task;
pub use crew_output::CrewOutput;
pub use ledger::OutputLedger;
pub use refinement::{refine, RefinementStage};
