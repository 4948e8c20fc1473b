//! HTTP server for crew execution.
//!
//! Exposes the orchestrator as an HTTP service.
//!
//! # Endpoints
//!
//! - `GET  /`                      - Banner
//! - `GET  /health`                - Liveness probe
//! - `POST /execute_crew/:crew_id` - Execute a stored crew

pub mod routes;

pub use routes::{app_router, AppState, ExecuteCrewRequest};
