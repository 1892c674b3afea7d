use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::error::MgitError;
use crate::common::result::MgitResult;

/// Name of the optional settings file at the workspace root.
pub const SETTINGS_FILE: &str = "mgit.yml";

/// Workspace-level defaults, overridable per invocation from the command
/// line or `MGIT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Production tracking reference used by the non-prod selection filter.
    pub prod_branch: String,

    /// Worker count for the dispatcher. Absent means one repository at a
    /// time; `0` means one worker per CPU.
    pub jobs: Option<usize>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            prod_branch: "origin/main".to_string(),
            jobs: None,
        }
    }
}

impl WorkspaceSettings {
    /// Load settings from `<root>/mgit.yml`, falling back to defaults when
    /// the file does not exist. A malformed file is a configuration error.
    pub fn load(root: &Path) -> MgitResult<Self> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|e| {
            MgitError::io(format!("failed to read '{}'", path.display()), e)
        })?;
        let settings: Self = serde_yaml::from_str(&text).map_err(|e| {
            MgitError::config_with_source(
                format!("invalid settings file '{}'", path.display()),
                e,
            )
        })?;
        debug!(path = %path.display(), ?settings, "loaded workspace settings");
        Ok(settings)
    }

    /// Resolve the worker count, giving precedence to a per-invocation
    /// override.
    pub fn effective_jobs(&self, cli_override: Option<usize>) -> usize {
        match cli_override.or(self.jobs) {
            Some(0) => num_cpus::get(),
            Some(jobs) => jobs,
            None => 1,
        }
    }
}
