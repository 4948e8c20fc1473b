//! Web search through the Serper Google Search API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::base_tool::{string_arg, BaseTool};
use crate::utilities::errors::ToolError;

/// Default Serper endpoint.
pub const SERPER_BASE_URL: &str = "https://google.serper.dev";

/// Searches the web and returns the top organic results as text.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    api_key: Option<String>,
    base_url: String,
    /// Number of results requested.
    pub n_results: usize,
    client: reqwest::Client,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl WebSearchTool {
    /// `api_key` defaults to `SERPER_API_KEY`.
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.or_else(|| std::env::var("SERPER_API_KEY").ok()),
            base_url: base_url
                .unwrap_or_else(|| SERPER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            n_results: 10,
            client,
        }
    }

    fn format_results(body: &Value) -> String {
        let Some(organic) = body.get("organic").and_then(Value::as_array) else {
            return "No results found.".to_string();
        };
        if organic.is_empty() {
            return "No results found.".to_string();
        }
        organic
            .iter()
            .map(|item| {
                let field = |name: &str| item.get(name).and_then(Value::as_str).unwrap_or_default();
                format!(
                    "Title: {}\nLink: {}\nSnippet: {}",
                    field("title"),
                    field("link"),
                    field("snippet")
                )
            })
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

#[async_trait]
impl BaseTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the internet with a query and return the most relevant results."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search_query": {"type": "string", "description": "Query to search the internet with"}
            },
            "required": ["search_query"]
        })
    }

    async fn run(&self, args: Value) -> Result<String, ToolError> {
        let query = string_arg(&args, "search_query")
            .or_else(|| string_arg(&args, "query"))
            .ok_or_else(|| ToolError::InvalidArguments("search_query is required".to_string()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingConfig("SERPER_API_KEY is not set".to_string()))?;

        log::debug!("web_search: query={:?}", query);

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&json!({"q": query, "num": self.n_results}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(format!("Search failed with status {}", status.as_u16()));
        }
        let body: Value = response.json().await?;
        Ok(Self::format_results(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_formats_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    {"title": "Rust", "link": "https://rust-lang.org", "snippet": "A language"},
                    {"title": "Crates", "link": "https://crates.io", "snippet": "Registry"}
                ]
            })))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(Some("key".to_string()), Some(server.uri()));
        let out = tool.run(json!({"search_query": "rust"})).await.unwrap();
        assert!(out.starts_with("Title: Rust\nLink: https://rust-lang.org"));
        assert!(out.contains("\n---\nTitle: Crates"));
    }

    #[tokio::test]
    async fn test_search_status_failure_is_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(Some("key".to_string()), Some(server.uri()));
        let out = tool.run(json!({"input": "rust"})).await.unwrap();
        assert_eq!(out, "Search failed with status 403");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let tool = WebSearchTool::new(Some("key".to_string()), Some("http://127.0.0.1:9".to_string()));
        let err = tool.run(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
