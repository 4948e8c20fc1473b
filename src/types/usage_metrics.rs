//! Token usage accounting across one crew execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token counters reported by the reasoning engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Total number of tokens used.
    pub total_tokens: i64,
    /// Number of tokens used in prompts.
    pub prompt_tokens: i64,
    /// Number of tokens used in completions.
    pub completion_tokens: i64,
    /// Number of successful requests made.
    pub successful_requests: i64,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an OpenAI-style `usage` object. Missing counters are zero.
    pub fn from_usage_value(usage: &Value) -> Self {
        let field = |name: &str| usage.get(name).and_then(Value::as_i64).unwrap_or(0);
        Self {
            total_tokens: field("total_tokens"),
            prompt_tokens: field("prompt_tokens"),
            completion_tokens: field("completion_tokens"),
            successful_requests: 1,
        }
    }

    /// Add usage metrics from another UsageMetrics object.
    pub fn add_usage_metrics(&mut self, other: &UsageMetrics) {
        self.total_tokens += other.total_tokens;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.successful_requests += other.successful_requests;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_usage_value_counts_one_request() {
        let usage = serde_json::json!({
            "prompt_tokens": 12,
            "completion_tokens": 30,
            "total_tokens": 42
        });
        let metrics = UsageMetrics::from_usage_value(&usage);
        assert_eq!(metrics.total_tokens, 42);
        assert_eq!(metrics.prompt_tokens, 12);
        assert_eq!(metrics.completion_tokens, 30);
        assert_eq!(metrics.successful_requests, 1);
    }

    #[test]
    fn test_add_usage_metrics() {
        let mut total = UsageMetrics::new();
        let one = UsageMetrics {
            total_tokens: 10,
            prompt_tokens: 4,
            completion_tokens: 6,
            successful_requests: 1,
        };
        total.add_usage_metrics(&one);
        total.add_usage_metrics(&one);
        assert_eq!(total.total_tokens, 20);
        assert_eq!(total.successful_requests, 2);
    }
}
