//! OpenAI-compatible Chat Completions provider.
//!
//! Works against any endpoint that speaks the `/chat/completions` protocol
//! (OpenAI itself, Azure-style gateways, local servers).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llms::base_llm::{BaseLLM, LLMMessage, LLMResponse, DEFAULT_MODEL};
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::LLMError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI Chat Completions client.
#[derive(Debug, Clone)]
pub struct OpenAICompletion {
    /// Model name (e.g. "gpt-4o-mini").
    pub model: String,
    /// API key sent as a bearer token.
    api_key: Option<String>,
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Optional sampling temperature.
    pub temperature: Option<f64>,
    /// Retries after the first attempt for 429, 5xx and transport errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub retry_delay: Duration,
    client: reqwest::Client,
}

impl OpenAICompletion {
    /// Create a new provider.
    ///
    /// `api_key` defaults to `OPENAI_API_KEY`, `base_url` to `OPENAI_BASE_URL`
    /// and then to the public endpoint.
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        let api_key = api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok());
        let base_url = base_url
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            model: model.into(),
            api_key,
            base_url,
            temperature: None,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            client,
        }
    }

    /// Provider for the default model.
    pub fn default_model() -> Self {
        Self::new(DEFAULT_MODEL, None, None)
    }

    fn build_request_body(&self, messages: &[LLMMessage]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    fn parse_completions_response(response: &Value) -> Result<LLMResponse, LLMError> {
        let content = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| LLMError::InvalidResponse("No message content in response".to_string()))?;

        let usage = match response.get("usage") {
            Some(usage) => UsageMetrics::from_usage_value(usage),
            None => UsageMetrics {
                successful_requests: 1,
                ..UsageMetrics::default()
            },
        };

        log::debug!(
            "OpenAI token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        );

        Ok(LLMResponse {
            content: content.to_string(),
            usage,
        })
    }
}

#[async_trait]
impl BaseLLM for OpenAICompletion {
    fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, messages: Vec<LLMMessage>) -> Result<LLMResponse, LLMError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LLMError::Authentication(
                "OpenAI API key not set. Set OPENAI_API_KEY or pass api_key to the constructor."
                    .to_string(),
            )
        })?;

        log::debug!(
            "OpenAICompletion.call: model={}, messages={}",
            self.model,
            messages.len()
        );

        let endpoint = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&messages);

        let mut last_error = LLMError::Other("no attempt made".to_string());
        let mut retry_delay = self.retry_delay;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!("OpenAI API retry attempt {} after {:?}", attempt, retry_delay);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let response = match self
                .client
                .post(&endpoint)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = LLMError::Http(e);
                    continue;
                }
            };

            let status = response.status();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = LLMError::Http(e);
                    continue;
                }
            };

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = LLMError::Api {
                    status: status.as_u16(),
                    body: text,
                };
                continue;
            }

            if !status.is_success() {
                return Err(LLMError::Api {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let json: Value = serde_json::from_str(&text).map_err(|e| {
                LLMError::InvalidResponse(format!(
                    "{} - Body: {}",
                    e,
                    text.chars().take(500).collect::<String>()
                ))
            })?;
            return Self::parse_completions_response(&json);
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAICompletion {
        let mut llm = OpenAICompletion::new("gpt-4o-mini", Some("sk-test".to_string()), Some(server.uri()));
        llm.retry_delay = Duration::from_millis(1);
        llm
    }

    fn completion(content: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
        })
    }

    #[tokio::test]
    async fn test_call_returns_content_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Final Answer: 4")))
            .expect(1)
            .mount(&server)
            .await;

        let llm = provider_for(&server);
        let response = llm.call(vec![LLMMessage::user("2+2?")]).await.unwrap();
        assert_eq!(response.content, "Final Answer: 4");
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[tokio::test]
    async fn test_call_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let llm = provider_for(&server);
        let response = llm.call(vec![LLMMessage::user("hi")]).await.unwrap();
        assert_eq!(response.content, "ok");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let llm = provider_for(&server);
        let err = llm.call(vec![LLMMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LLMError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let mut llm = OpenAICompletion::new("gpt-4o-mini", None, Some("http://127.0.0.1:9".to_string()));
        llm.api_key = None;
        let err = llm.call(vec![LLMMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LLMError::Authentication(_)));
    }
}
