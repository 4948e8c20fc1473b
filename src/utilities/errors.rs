//! Error types for crew execution.
//!
//! Every failure aborts the whole crew execution; nothing here is recovered
//! locally. The HTTP surface renders any of these as a single message.

use thiserror::Error;

/// Errors raised by a definition store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite backend failure.
    #[error("Database operation error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Remote table store request failed.
    #[error("Database connection error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote table store answered with a non-success status.
    #[error("Database query error ({status}): {body}")]
    Status { status: u16, body: String },

    /// A stored row could not be decoded.
    #[error("Malformed record: {0}")]
    Decode(String),

    /// Definition file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Definition file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Store settings are missing.
    #[error("Store not configured: {0}")]
    NotConfigured(String),

    /// Connection lock was poisoned by a panicking holder.
    #[error("Failed to acquire database lock")]
    Lock,
}

/// Errors raised by a bound capability.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match what the tool accepts.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A required credential or setting is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Network failure while the tool was running.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other tool-specific failure.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Errors raised by the reasoning engine.
#[derive(Debug, Error)]
pub enum LLMError {
    /// The provider rejected the request.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Transport failure after all retries.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials are not configured.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A scripted engine ran out of responses, or a stub was told to fail.
    #[error("{0}")]
    Other(String),
}

/// Top-level error for one crew execution.
#[derive(Debug, Error)]
pub enum CrewError {
    /// A stored worker or work-item definition is missing a required field.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A work item references a worker that is not part of the crew.
    #[error("Worker {worker_id} not found for work item {work_item_id}")]
    Reference {
        worker_id: String,
        work_item_id: String,
    },

    /// No worker or work-item definitions exist for the crew.
    #[error("No {what} found for crew {crew_id}")]
    NotFound { crew_id: i64, what: String },

    /// A bound capability failed while a worker was using it.
    #[error("Capability '{capability}' failed: {source}")]
    CapabilityInvocation {
        capability: String,
        #[source]
        source: ToolError,
    },

    /// The worker's reasoning-engine call failed.
    #[error("Execution failed for worker '{role}': {source}")]
    Execution {
        role: String,
        #[source]
        source: LLMError,
    },

    /// The crew did not finish within the configured time.
    #[error("Crew {crew_id} timed out after {seconds}s")]
    Timeout { crew_id: i64, seconds: u64 },

    /// Definitions could not be fetched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CrewError {
    /// Shorthand for a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        CrewError::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error means the crew simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CrewError::NotFound { .. })
    }
}
