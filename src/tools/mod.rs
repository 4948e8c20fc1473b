//! Tools that workers can invoke while executing a work item.
//!
//! This module provides the base tool trait, a closure-backed tool, and the
//! built-in network tools registered by default.

pub mod base_tool;
pub mod contract_tools;
pub mod web_search;

// Re-exports for convenience
pub use base_tool::{BaseTool, Tool};
pub use contract_tools::{ContractFetchTool, ContractResource};
pub use web_search::WebSearchTool;
