//! Orchestrator configuration.
//!
//! Loaded from YAML (`CREW_CONFIG`) when present, then overridden by
//! individual `CREW_*` environment variables.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::core::DEFAULT_MAX_ITER;
use crate::process::{RefinementContext, RefinementMode};
use crate::utilities::errors::CrewError;

/// Defaults applied to every stored worker unless its definition overrides
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerDefaults {
    pub allow_delegation: bool,
    pub enable_memory: bool,
}

impl Default for WorkerDefaults {
    fn default() -> Self {
        Self {
            allow_delegation: false,
            enable_memory: true,
        }
    }
}

/// Policy switches for one orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub refinement_mode: RefinementMode,
    pub refinement_context: RefinementContext,
    /// Append a compiler task that turns the ledger into one report.
    pub compile_final_report: bool,
    pub worker_defaults: WorkerDefaults,
    /// Iteration cap for every worker's reasoning loop.
    pub max_iter: u32,
    /// Whole-execution timeout. `None` or `0` waits indefinitely.
    pub execution_timeout_secs: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            refinement_mode: RefinementMode::default(),
            refinement_context: RefinementContext::default(),
            compile_final_report: false,
            worker_defaults: WorkerDefaults::default(),
            max_iter: DEFAULT_MAX_ITER,
            execution_timeout_secs: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_refinement_mode(mut self, mode: RefinementMode) -> Self {
        self.refinement_mode = mode;
        self
    }

    pub fn with_refinement_context(mut self, context: RefinementContext) -> Self {
        self.refinement_context = context;
        self
    }

    pub fn with_compile_final_report(mut self, compile: bool) -> Self {
        self.compile_final_report = compile;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_execution_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.execution_timeout_secs = secs;
        self
    }

    /// Effective whole-execution timeout. Zero means none.
    pub fn execution_timeout(&self) -> Option<Duration> {
        self.execution_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, CrewError> {
        serde_yaml::from_str(content)
            .map_err(|e| CrewError::configuration(format!("invalid orchestrator config: {}", e)))
    }

    /// Load a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CrewError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrewError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Defaults, then the `CREW_CONFIG` file, then `CREW_*` variables.
    pub fn from_env() -> Result<Self, CrewError> {
        let base = match std::env::var("CREW_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim())?,
            _ => Self::default(),
        };
        base.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `CREW_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, CrewError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CREW_REFINEMENT_MODE") {
            self.refinement_mode = parse_setting("CREW_REFINEMENT_MODE", &v)?;
        }
        if let Some(v) = lookup("CREW_REFINEMENT_CONTEXT") {
            self.refinement_context = parse_setting("CREW_REFINEMENT_CONTEXT", &v)?;
        }
        if let Some(v) = lookup("CREW_COMPILE_REPORT") {
            self.compile_final_report = parse_bool("CREW_COMPILE_REPORT", &v)?;
        }
        if let Some(v) = lookup("CREW_ALLOW_DELEGATION") {
            self.worker_defaults.allow_delegation = parse_bool("CREW_ALLOW_DELEGATION", &v)?;
        }
        if let Some(v) = lookup("CREW_ENABLE_MEMORY") {
            self.worker_defaults.enable_memory = parse_bool("CREW_ENABLE_MEMORY", &v)?;
        }
        if let Some(v) = lookup("CREW_MAX_ITER") {
            self.max_iter = parse_setting("CREW_MAX_ITER", &v)?;
        }
        if let Some(v) = lookup("CREW_EXECUTION_TIMEOUT_SECS") {
            self.execution_timeout_secs = match v.trim() {
                "" | "none" => None,
                other => Some(parse_setting("CREW_EXECUTION_TIMEOUT_SECS", other)?),
            };
        }
        Ok(self)
    }
}

fn parse_setting<T>(key: &str, value: &str) -> Result<T, CrewError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CrewError::configuration(format!("{}={:?}: {}", key, value, e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CrewError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CrewError::configuration(format!(
            "{}={:?}: expected a boolean",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.refinement_mode, RefinementMode::TextRefiner);
        assert_eq!(config.refinement_context, RefinementContext::SameRole);
        assert!(!config.compile_final_report);
        assert!(!config.worker_defaults.allow_delegation);
        assert!(config.worker_defaults.enable_memory);
        assert_eq!(config.max_iter, 25);
        assert_eq!(config.execution_timeout_secs, None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = OrchestratorConfig::from_yaml(
            "refinement_mode: coordinator\ncompile_final_report: true\nworker_defaults:\n  enable_memory: false\n",
        )
        .unwrap();
        assert_eq!(config.refinement_mode, RefinementMode::Coordinator);
        assert!(config.compile_final_report);
        assert!(!config.worker_defaults.enable_memory);
        assert!(!config.worker_defaults.allow_delegation);
        assert_eq!(config.max_iter, 25);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CREW_REFINEMENT_MODE", "none"),
            ("CREW_REFINEMENT_CONTEXT", "previous-item"),
            ("CREW_COMPILE_REPORT", "yes"),
            ("CREW_ALLOW_DELEGATION", "1"),
            ("CREW_MAX_ITER", "5"),
            ("CREW_EXECUTION_TIMEOUT_SECS", "30"),
        ]
        .into_iter()
        .collect();
        let config = OrchestratorConfig::default()
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.refinement_mode, RefinementMode::None);
        assert_eq!(config.refinement_context, RefinementContext::PreviousItem);
        assert!(config.compile_final_report);
        assert!(config.worker_defaults.allow_delegation);
        assert_eq!(config.max_iter, 5);
        assert_eq!(config.execution_timeout_secs, Some(30));
    }

    #[test]
    fn test_zero_timeout_means_none_from_yaml_and_env() {
        let from_yaml = OrchestratorConfig::from_yaml("execution_timeout_secs: 0\n").unwrap();
        assert_eq!(from_yaml.execution_timeout(), None);

        let from_env = OrchestratorConfig::default()
            .apply_overrides(|k| (k == "CREW_EXECUTION_TIMEOUT_SECS").then(|| "0".to_string()))
            .unwrap();
        assert_eq!(from_env.execution_timeout(), None);

        let builder = OrchestratorConfig::default().with_execution_timeout_secs(Some(0));
        assert_eq!(builder.execution_timeout(), None);
        assert_eq!(
            OrchestratorConfig::from_yaml("execution_timeout_secs: 45\n")
                .unwrap()
                .execution_timeout(),
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    fn test_bad_override_is_configuration_error() {
        let err = OrchestratorConfig::default()
            .apply_overrides(|k| (k == "CREW_COMPILE_REPORT").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, CrewError::Configuration { .. }));
    }
}
