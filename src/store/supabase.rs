//! Definitions read from hosted Supabase tables over PostgREST.
//!
//! Requests look like
//! `GET {url}/rest/v1/agents?select=*&crew_id=eq.{id}&order=id.asc`
//! with the service key sent both as `apikey` and as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{DefinitionStore, TaskDefinition, WorkerDefinition};
use crate::utilities::errors::StoreError;

/// PostgREST-backed definition store.
#[derive(Debug, Clone)]
pub struct SupabaseDefinitionStore {
    /// Project URL without trailing slash.
    pub url: String,
    service_key: String,
    client: reqwest::Client,
}

impl SupabaseDefinitionStore {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client,
        }
    }

    /// Read `SUPABASE_URL` and `SUPABASE_SERVICE_KEY`.
    pub fn from_env() -> Result<Self, StoreError> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| StoreError::NotConfigured("SUPABASE_URL is not set".to_string()))?;
        let key = std::env::var("SUPABASE_SERVICE_KEY")
            .map_err(|_| StoreError::NotConfigured("SUPABASE_SERVICE_KEY is not set".to_string()))?;
        Ok(Self::new(url, key))
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, crew_id: i64) -> Result<Vec<T>, StoreError> {
        let endpoint = format!("{}/rest/v1/{}", self.url, table);
        let crew_filter = format!("eq.{}", crew_id);
        log::debug!("Supabase select: table={}, crew_id={}", table, crew_id);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("select", "*"), ("crew_id", crew_filter.as_str()), ("order", "id.asc")])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(format!("{}: {}", table, e)))
    }
}

#[async_trait]
impl DefinitionStore for SupabaseDefinitionStore {
    fn backend(&self) -> &str {
        "supabase"
    }

    async fn list_workers(&self, crew_id: i64) -> Result<Vec<WorkerDefinition>, StoreError> {
        self.select("agents", crew_id).await
    }

    async fn list_work_items(&self, crew_id: i64) -> Result<Vec<TaskDefinition>, StoreError> {
        self.select("tasks", crew_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_lists_rows_with_filters_and_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/agents"))
            .and(query_param("crew_id", "eq.7"))
            .and(query_param("order", "id.asc"))
            .and(header("apikey", "service"))
            .and(header("authorization", "Bearer service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "crew_id": 7, "role": "Researcher", "goal": "g", "backstory": "b", "agent_tools": ["web_search"]}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 3, "crew_id": 7, "agent_id": 1, "description": "d", "expected_output": "e"}
            ])))
            .mount(&server)
            .await;

        let store = SupabaseDefinitionStore::new(format!("{}/", server.uri()), "service");
        let workers = store.list_workers(7).await.unwrap();
        assert_eq!(workers[0].id, "1");
        assert_eq!(workers[0].capability_names, vec!["web_search"]);

        let tasks = store.list_work_items(7).await.unwrap();
        assert_eq!(tasks[0].assigned_worker_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_error_status_is_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let store = SupabaseDefinitionStore::new(server.uri(), "bad");
        let err = store.list_workers(1).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 401, ref body } if body == "invalid key"));
    }

    #[tokio::test]
    async fn test_empty_result_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = SupabaseDefinitionStore::new(server.uri(), "k");
        assert!(store.list_work_items(1).await.unwrap().is_empty());
    }
}
