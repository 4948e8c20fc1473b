//! Axum route handlers for the crew execution server.
//!
//! # Routes
//!
//! - `GET  /`                       - Banner
//! - `GET  /health`                 - Returns `{"status": "ok", "version": ...}`
//! - `POST /execute_crew/:crew_id`  - Runs a stored crew, returns `{"result": ...}`

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::orchestrator::CrewOrchestrator;
use crate::utilities::errors::CrewError;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<CrewOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: CrewOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Body of `POST /execute_crew/:crew_id`: a bare JSON string or
/// `{"input": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExecuteCrewRequest {
    Plain(String),
    Wrapped { input: String },
}

impl ExecuteCrewRequest {
    pub fn into_input(self) -> String {
        match self {
            ExecuteCrewRequest::Plain(input) | ExecuteCrewRequest::Wrapped { input } => input,
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/execute_crew/:crew_id", post(execute_crew_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - banner.
async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Crew execution API is running!" }))
}

/// GET /health - liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// POST /execute_crew/:crew_id - run a stored crew with the given input.
///
/// Never returns a partial result: the body is either `{"result"}` or
/// `{"detail"}`.
async fn execute_crew_handler(
    State(state): State<AppState>,
    Path(crew_id): Path<i64>,
    Json(request): Json<ExecuteCrewRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let input = request.into_input();
    match state.orchestrator.execute(crew_id, &input).await {
        Ok(result) => Ok(Json(json!({ "result": result }))),
        Err(e) => {
            tracing::warn!(crew_id, error = %e, "crew execution failed");
            Err((status_for(&e), Json(json!({ "detail": e.to_string() }))))
        }
    }
}

fn status_for(error: &CrewError) -> StatusCode {
    if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
