//! Capability Registry: name → tool handle.
//!
//! The registry holds:
//! 1. Built-in tools (`with_defaults`)
//! 2. Programmatically registered tools
//! 3. Name aliases (e.g., "search_web" -> "web_search")

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::tools::{BaseTool, ContractFetchTool, WebSearchTool};

/// Process-wide registry of invocable tools.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn BaseTool>>,

    /// Name aliases
    aliases: HashMap<String, String>,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort();
        f.debug_struct("CapabilityRegistry")
            .field("tools", &names)
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl CapabilityRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in tools.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(WebSearchTool::default()));
        reg.register(Arc::new(ContractFetchTool::contract_code()));
        reg.register(Arc::new(ContractFetchTool::interface_data()));
        reg.add_alias("search_web", "web_search");
        reg
    }

    /// Register a tool under its own name. A later tool with the same name
    /// replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn BaseTool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            log::debug!("Capability '{}' re-registered", name);
        }
    }

    /// Register an alternative name for a registered tool.
    pub fn add_alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    /// Look up one tool by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn BaseTool>> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.tools.get(name).cloned()
    }

    /// Resolve requested names to tool handles.
    ///
    /// Input order is preserved and duplicates are kept. Unknown names are
    /// logged and skipped.
    pub fn resolve(&self, names: &[String]) -> Vec<Arc<dyn BaseTool>> {
        names
            .iter()
            .filter_map(|name| {
                let tool = self.get(name);
                if tool.is_none() {
                    log::warn!("Capability '{}' is not registered; skipping", name);
                }
                tool
            })
            .collect()
    }

    /// Names of all registered tools (unordered).
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Get the total number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;

    fn named(name: &str) -> Arc<dyn BaseTool> {
        Arc::new(Tool::new(name, format!("{} tool", name), |_| Ok(String::new())))
    }

    fn names_of(tools: &[Arc<dyn BaseTool>]) -> Vec<String> {
        tools.iter().map(|t| t.name().to_string()).collect()
    }

    #[test]
    fn test_resolve_preserves_order_and_drops_unknown() {
        let mut reg = CapabilityRegistry::new();
        reg.register(named("b"));
        reg.register(named("a"));

        let requested = vec!["a".to_string(), "missing".to_string(), "b".to_string()];
        assert_eq!(names_of(&reg.resolve(&requested)), vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_keeps_duplicates_and_follows_aliases() {
        let mut reg = CapabilityRegistry::new();
        reg.register(named("web_search"));
        reg.add_alias("search_web", "web_search");

        let requested = vec!["search_web".to_string(), "web_search".to_string()];
        assert_eq!(names_of(&reg.resolve(&requested)), vec!["web_search", "web_search"]);
        assert!(reg.resolve(&[]).is_empty());
    }

    #[test]
    fn test_with_defaults_registers_builtin_tools() {
        let reg = CapabilityRegistry::with_defaults();
        assert_eq!(reg.len(), 3);
        for name in ["web_search", "fetch_contract_code", "fetch_interface_data"] {
            assert!(reg.get(name).is_some(), "{} missing", name);
        }
    }
}
