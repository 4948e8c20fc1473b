//! Base tool definitions.
//!
//! Provides the `BaseTool` trait every capability implements and the concrete
//! `Tool` struct that wraps a callable function.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::utilities::errors::ToolError;

// ---------------------------------------------------------------------------
// BaseTool trait
// ---------------------------------------------------------------------------

/// A named, externally-callable function a worker may invoke while executing.
///
/// Implementations may perform network I/O and may fail; the executor treats
/// any error as fatal for the running work item.
#[async_trait]
pub trait BaseTool: Send + Sync + fmt::Debug {
    /// The unique name of the tool that clearly communicates its purpose.
    fn name(&self) -> &str;

    /// Description used to tell the model how/when/why to use the tool.
    fn description(&self) -> &str;

    /// JSON schema for the arguments that the tool accepts.
    fn args_schema(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Execute the tool with JSON arguments and return its observation text.
    async fn run(&self, args: Value) -> Result<String, ToolError>;
}

/// Render the tool list the way it is shown to the model.
pub fn render_tool_descriptions(tools: &[Arc<dyn BaseTool>]) -> String {
    tools
        .iter()
        .map(|t| {
            format!(
                "Tool Name: {}\nTool Arguments: {}\nTool Description: {}",
                t.name(),
                t.args_schema(),
                t.description()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Read a string argument, accepting the bare `{"input": ...}` fallback too.
pub fn string_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .or_else(|| args.get("input"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| args.as_str().map(str::to_string))
}

// ---------------------------------------------------------------------------
// Tool struct (wraps a callable function)
// ---------------------------------------------------------------------------

/// Type alias for a shared synchronous tool function.
pub type ToolFn = Arc<dyn Fn(Value) -> Result<String, ToolError> + Send + Sync>;

/// Concrete tool that wraps a callable function.
#[derive(Clone)]
pub struct Tool {
    tool_name: String,
    tool_description: String,
    tool_args_schema: Value,
    /// The wrapped function.
    pub func: ToolFn,
    usage_count: Arc<AtomicU32>,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.tool_name)
            .field("description", &self.tool_description)
            .field("usage_count", &self.usage_count())
            .finish()
    }
}

impl Tool {
    /// Create a new Tool wrapping the given function.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        func: impl Fn(Value) -> Result<String, ToolError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            tool_name: name.into(),
            tool_description: description.into(),
            tool_args_schema: Value::Object(serde_json::Map::new()),
            func: Arc::new(func),
            usage_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Builder method to set the args schema.
    pub fn with_args_schema(mut self, schema: Value) -> Self {
        self.tool_args_schema = schema;
        self
    }

    /// Number of successful runs so far.
    pub fn usage_count(&self) -> u32 {
        self.usage_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseTool for Tool {
    fn name(&self) -> &str {
        &self.tool_name
    }

    fn description(&self) -> &str {
        &self.tool_description
    }

    fn args_schema(&self) -> Value {
        self.tool_args_schema.clone()
    }

    async fn run(&self, args: Value) -> Result<String, ToolError> {
        let result = (self.func)(args)?;
        self.usage_count.fetch_add(1, Ordering::SeqCst);
        Ok(result)
    }
}
