//! Refinement policies for crew execution.
//!
//! A crew always runs its tasks sequentially. What varies is whether and how
//! a manager shapes the task descriptions, and what context the manager gets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the manager takes part in an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefinementMode {
    /// No manager; descriptions run as stored.
    None,
    /// The manager rewrites each description right before it executes.
    TextRefiner,
    /// Descriptions get a static assignment prefix; the manager writes one
    /// coordination brief that every task receives as context.
    Coordinator,
}

impl RefinementMode {
    /// Whether this mode builds a manager.
    pub fn uses_manager(self) -> bool {
        !matches!(self, RefinementMode::None)
    }
}

impl fmt::Display for RefinementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefinementMode::None => write!(f, "none"),
            RefinementMode::TextRefiner => write!(f, "text-refiner"),
            RefinementMode::Coordinator => write!(f, "coordinator"),
        }
    }
}

impl Default for RefinementMode {
    fn default() -> Self {
        RefinementMode::TextRefiner
    }
}

impl FromStr for RefinementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "none" | "off" | "disabled" => Ok(RefinementMode::None),
            "text-refiner" | "refiner" => Ok(RefinementMode::TextRefiner),
            "coordinator" => Ok(RefinementMode::Coordinator),
            other => Err(format!(
                "unknown refinement mode '{}' (expected none, text-refiner or coordinator)",
                other
            )),
        }
    }
}

/// What the manager sees as "previous output" when refining a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefinementContext {
    /// The latest output of the target agent's role, from the ledger.
    SameRole,
    /// The output of the task just before.
    PreviousItem,
    /// The raw user input, for every task.
    UserInput,
}

impl fmt::Display for RefinementContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefinementContext::SameRole => write!(f, "same-role"),
            RefinementContext::PreviousItem => write!(f, "previous-item"),
            RefinementContext::UserInput => write!(f, "user-input"),
        }
    }
}

impl Default for RefinementContext {
    fn default() -> Self {
        RefinementContext::SameRole
    }
}

impl FromStr for RefinementContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "same-role" => Ok(RefinementContext::SameRole),
            "previous-item" => Ok(RefinementContext::PreviousItem),
            "user-input" => Ok(RefinementContext::UserInput),
            other => Err(format!(
                "unknown refinement context '{}' (expected same-role, previous-item or user-input)",
                other
            )),
        }
    }
}
