//! Crew execution HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8080)
//! - `CREW_STORE` - Definition store: "sqlite" (default), "supabase", "yaml" or
//!   "memory" (starts empty, for smoke tests only)
//! - `CREW_SQLITE_PATH` - SQLite file (default: "crews.db")
//! - `CREW_YAML_PATH` - YAML crew file (default: "crews.yaml")
//! - `SUPABASE_URL`, `SUPABASE_SERVICE_KEY` - required if CREW_STORE=supabase
//! - `CREW_LLM` - Model name, or "mock" for a dry run (default: gpt-4o-mini)
//! - `CREW_CONFIG` and `CREW_*` - Orchestrator policy, see `OrchestratorConfig`
//! - `RUST_LOG` - Tracing filter (default: "info,crew_runner=debug")
//!
//! # Usage
//!
//! ```bash
//! CREW_SQLITE_PATH=./crews.db cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use crew_runner::capabilities::CapabilityRegistry;
use crew_runner::llms::create_llm;
use crew_runner::server::{app_router, AppState};
use crew_runner::store::{
    DefinitionStore, InMemoryDefinitionStore, SqliteDefinitionStore, SupabaseDefinitionStore,
    YamlDefinitionStore,
};
use crew_runner::{CrewOrchestrator, OrchestratorConfig};

const DEFAULT_STORE: &str = "sqlite";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Open the definition store named by `CREW_STORE`, reading settings through
/// `lookup`.
fn open_store<F>(lookup: F) -> anyhow::Result<Arc<dyn DefinitionStore>>
where
    F: Fn(&str) -> Option<String>,
{
    let setting = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    let backend = setting("CREW_STORE", DEFAULT_STORE);
    let store: Arc<dyn DefinitionStore> = match backend.as_str() {
        "memory" => {
            tracing::warn!("CREW_STORE=memory: no crews are defined until some are inserted");
            Arc::new(InMemoryDefinitionStore::new())
        }
        "sqlite" => {
            let path = setting("CREW_SQLITE_PATH", "crews.db");
            let store = SqliteDefinitionStore::open(&path)
                .with_context(|| format!("opening sqlite store {}", path))?;
            store.migrate().context("migrating sqlite store")?;
            Arc::new(store)
        }
        "supabase" => Arc::new(SupabaseDefinitionStore::from_env()?),
        "yaml" => {
            let path = setting("CREW_YAML_PATH", "crews.yaml");
            Arc::new(
                YamlDefinitionStore::load(&path)
                    .with_context(|| format!("loading crew file {}", path))?,
            )
        }
        other => anyhow::bail!("unknown CREW_STORE '{}'", other),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crew_runner=debug".into()),
        )
        .init();

    let config = OrchestratorConfig::from_env()?;
    let store = open_store(|key| std::env::var(key).ok())?;
    let llm = create_llm(&env_or("CREW_LLM", ""));
    tracing::info!(
        store = store.backend(),
        model = llm.model(),
        refinement = %config.refinement_mode,
        context = %config.refinement_context,
        compile = config.compile_final_report,
        "orchestrator configured"
    );

    let orchestrator =
        CrewOrchestrator::new(store, Arc::new(CapabilityRegistry::with_defaults()), llm)
            .with_config(config);
    let app = app_router(AppState::new(orchestrator));

    let bind_addr = format!("0.0.0.0:{}", env_or("PORT", "8080"));
    tracing::info!("crew-runner server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                - liveness probe");
    tracing::info!("  POST /execute_crew/:crew_id - run a stored crew");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
