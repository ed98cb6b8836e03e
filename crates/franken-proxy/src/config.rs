//! Engine configuration.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::capability_probe::EnvironmentProfile;

/// What happens when an assignment has no effect: a `set` trap returning a
/// falsish value, or a write to a sealed or read-only slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Silently ignore the failed assignment.
    #[default]
    Sloppy,
    /// Raise a TypeError-class error.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Native primitives assumed present in the host.
    pub environment: EnvironmentProfile,
    pub assignment_mode: AssignmentMode,
    /// Trace id stamped on every audit event.
    pub trace_id: String,
    pub audit_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentProfile::modern(),
            assignment_mode: AssignmentMode::Sloppy,
            trace_id: "proxy-facade".to_string(),
            audit_enabled: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing engine config {}", path.display()))
    }

    pub fn with_environment(mut self, environment: EnvironmentProfile) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_assignment_mode(mut self, mode: AssignmentMode) -> Self {
        self.assignment_mode = mode;
        self
    }
}
