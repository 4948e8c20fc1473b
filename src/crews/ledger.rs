//! Per-role output ledger.

use serde::{Deserialize, Serialize};

/// Latest output of every role, in the order roles first produced output.
///
/// A later output of the same role replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLedger {
    entries: Vec<(String, String)>,
}

impl OutputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `output` for `role`, replacing any earlier output of that role.
    pub fn record(&mut self, role: &str, output: impl Into<String>) {
        let output = output.into();
        match self.entries.iter_mut().find(|(r, _)| r == role) {
            Some(entry) => {
                log::debug!("Ledger: overwriting output of role '{}'", role);
                entry.1 = output;
            }
            None => self.entries.push((role.to_string(), output)),
        }
    }

    pub fn get(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, o)| o.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Markdown rendering handed to the compiler.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(role, output)| format!("## {}\n{}", role, output))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
