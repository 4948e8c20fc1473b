//! # Capability Registry
//!
//! Maps capability names, as stored on worker definitions, to live tool
//! handles. A worker definition that declares
//!
//! ```yaml
//! agent_tools:
//!   - web_search
//!   - fetch_contract_code
//! ```
//!
//! gets both tools bound, in that order, when it is built. Names the registry
//! does not know are logged and dropped so a worker never fails to build
//! because an optional tool is unavailable.
//!
//! The registry is built once at startup and shared read-only (behind `Arc`)
//! by every crew execution.

pub mod registry;

pub use registry::CapabilityRegistry;
