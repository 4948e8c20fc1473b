//! Base trait for the reasoning engine behind every worker.
//!
//! Both work-item execution and manager refinement go through this single
//! interface, so the orchestrator never depends on what backs it.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::LLMError;

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Speaker of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LLMMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Text completion plus the usage the provider reported for it.
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    pub content: String,
    pub usage: UsageMetrics,
}

impl LLMResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: UsageMetrics {
                successful_requests: 1,
                ..UsageMetrics::default()
            },
        }
    }
}

/// Trait for LLM implementations.
///
/// Implementations may be slow and non-deterministic. Any error is treated
/// as fatal for the work item that triggered the call.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// Get the model identifier/name.
    fn model(&self) -> &str;

    /// Get the provider name.
    fn provider(&self) -> &str {
        "openai"
    }

    /// Run one completion over the full message list.
    async fn call(&self, messages: Vec<LLMMessage>) -> Result<LLMResponse, LLMError>;
}
