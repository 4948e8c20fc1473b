//! LLM provider implementations.
//!
//! Each provider implements [`BaseLLM`](crate::llms::base_llm::BaseLLM).
//!
//! | Provider | Module |
//! |----------|--------|
//! | OpenAI-compatible chat completions | [`openai`] |
//! | Scripted, deterministic responses | [`mock`] |

pub mod mock;
pub mod openai;
