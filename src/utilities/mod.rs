//! Shared utilities.
//!
//! - [`config`] - Orchestrator configuration from YAML and environment
//! - [`errors`] - Error types for every layer
//! - [`prompts`] - Prompt text and personas

pub mod config;
pub mod errors;
pub mod prompts;

// Re-exports for convenience
pub use config::{OrchestratorConfig, WorkerDefaults};
pub use errors::{CrewError, LLMError, StoreError, ToolError};
