//! # Crew Runner
//!
//! Executes stored crews of LLM-backed agents. A crew's worker and task
//! definitions are fetched from a definition store, turned into agents and
//! tasks, optionally refined by a manager agent, run strictly in sequence,
//! and optionally consolidated by a compiler agent into one final report.
//!
//! - [`orchestrator`] - fetch, build and run one crew
//! - [`crew`] / [`crews`] - the sequential executor, worker arena and ledger
//! - [`agent`] / [`agents`] - agents and their reasoning loop
//! - [`capabilities`] / [`tools`] - the tools agents may use
//! - [`store`] - definition stores
//! - [`server`] - the HTTP surface

pub mod agent;
pub mod agents;
pub mod capabilities;
pub mod crew;
pub mod crews;
pub mod llms;
pub mod orchestrator;
pub mod process;
pub mod server;
pub mod store;
pub mod task;
pub mod tasks;
pub mod tools;
pub mod types;
pub mod utilities;

pub use agent::{Agent, WorkerKey};
pub use capabilities::CapabilityRegistry;
pub use crew::Crew;
pub use crews::crew_output::CrewOutput;
pub use llms::base_llm::BaseLLM;
pub use orchestrator::CrewOrchestrator;
pub use process::{RefinementContext, RefinementMode};
pub use task::Task;
pub use tasks::task_output::TaskOutput;
pub use utilities::config::OrchestratorConfig;
pub use utilities::errors::CrewError;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
