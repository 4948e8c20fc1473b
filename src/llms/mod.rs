//! Reasoning engines behind workers and the manager.
//!
//! - [`base_llm`] - The trait every engine implements
//! - [`providers`] - Concrete engines (OpenAI-compatible, scripted mock)

pub mod base_llm;
pub mod providers;

pub use base_llm::{BaseLLM, LLMMessage, LLMResponse, MessageRole};
pub use providers::mock::{MockLLM, MockResponse};
pub use providers::openai::OpenAICompletion;

use std::sync::Arc;

/// Build an engine from a model name. `mock` selects [`MockLLM`].
pub fn create_llm(model: &str) -> Arc<dyn BaseLLM> {
    match model.trim() {
        "mock" => Arc::new(MockLLM::new()),
        "" => Arc::new(OpenAICompletion::default_model()),
        other => Arc::new(OpenAICompletion::new(other, None, None)),
    }
}
