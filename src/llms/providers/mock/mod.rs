//! Scripted LLM for deterministic runs.
//!
//! Responses are chosen in this order: the first rule whose pattern occurs
//! in any message of the request, then the front of the queue, then an echo
//! of the request. Every request is recorded for later inspection.
//!
//! ```rust
//! use crew_runner::llms::providers::mock::{MockLLM, MockResponse};
//!
//! let llm = MockLLM::new()
//!     .when("You are Researcher.", MockResponse::text("Final Answer: notes"))
//!     .with_response(MockResponse::error("provider down"));
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::llms::base_llm::{BaseLLM, LLMMessage, LLMResponse, MessageRole};
use crate::utilities::errors::LLMError;

/// One scripted reply.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    /// Text content to return.
    pub content: String,
    /// When set, the call fails with this message instead.
    pub should_fail: Option<String>,
    /// Simulated latency.
    pub latency: Option<Duration>,
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            should_fail: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// Pattern-triggered replies. The last reply repeats once the rest are used.
#[derive(Debug)]
struct MockRule {
    pattern: String,
    replies: Mutex<VecDeque<MockResponse>>,
}

impl MockRule {
    fn next_reply(&self) -> MockResponse {
        let mut replies = self.replies.lock();
        if replies.len() > 1 {
            replies.pop_front().unwrap_or_default()
        } else {
            replies.front().cloned().unwrap_or_default()
        }
    }
}

/// Deterministic [`BaseLLM`] stand-in.
#[derive(Debug)]
pub struct MockLLM {
    model: String,
    rules: Vec<MockRule>,
    queue: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<Vec<LLMMessage>>>,
}

impl Default for MockLLM {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLLM {
    pub fn new() -> Self {
        Self {
            model: "mock".to_string(),
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `response` whenever `pattern` occurs in the request.
    pub fn when(self, pattern: impl Into<String>, response: MockResponse) -> Self {
        self.when_sequence(pattern, vec![response])
    }

    /// Reply with `responses` in order whenever `pattern` occurs; the last
    /// one repeats.
    pub fn when_sequence(mut self, pattern: impl Into<String>, responses: Vec<MockResponse>) -> Self {
        self.rules.push(MockRule {
            pattern: pattern.into(),
            replies: Mutex::new(responses.into()),
        });
        self
    }

    /// Queue a reply for the next request that matches no rule.
    pub fn with_response(self, response: MockResponse) -> Self {
        self.queue.lock().push_back(response);
        self
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<LLMMessage>> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests whose messages contain `pattern`.
    pub fn requests_containing(&self, pattern: &str) -> Vec<Vec<LLMMessage>> {
        self.requests
            .lock()
            .iter()
            .filter(|messages| messages.iter().any(|m| m.content.contains(pattern)))
            .cloned()
            .collect()
    }

    fn echo(messages: &[LLMMessage]) -> MockResponse {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let first_line = last_user.lines().next().unwrap_or_default();
        MockResponse::text(format!("Final Answer: Completed: {}", first_line))
    }

    fn pick(&self, messages: &[LLMMessage]) -> MockResponse {
        for rule in &self.rules {
            if messages.iter().any(|m| m.content.contains(&rule.pattern)) {
                return rule.next_reply();
            }
        }
        if let Some(queued) = self.queue.lock().pop_front() {
            return queued;
        }
        Self::echo(messages)
    }
}

#[async_trait]
impl BaseLLM for MockLLM {
    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "mock"
    }

    async fn call(&self, messages: Vec<LLMMessage>) -> Result<LLMResponse, LLMError> {
        let response = self.pick(&messages);
        self.requests.lock().push(messages);

        if let Some(latency) = response.latency {
            tokio::time::sleep(latency).await;
        }
        match response.should_fail {
            Some(message) => Err(LLMError::Other(message)),
            None => Ok(LLMResponse::text(response.content)),
        }
    }
}
