//! Worker execution machinery.
//!
//! - [`crew_agent_executor`] - The ReAct loop behind `Agent::execute_task`
//! - [`parser`] - Parsing of `Action:` / `Final Answer:` responses

pub mod crew_agent_executor;
pub mod parser;

// Re-exports for convenience
pub use crew_agent_executor::{AgentExecution, CrewAgentExecutor};
pub use parser::{AgentAction, AgentFinish, OutputParserError};
