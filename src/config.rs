use std::path::Path;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::branch::DEFAULT_INTEGRATION_BRANCH_TEMPLATE;
use crate::error::ExitError;

/// Top-level rig settings document (`settings/config.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RigSettings {
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub merge_queue: Option<MergeQueueConfig>,
}

/// Merge-queue options nested under `merge_queue`.
///
/// The three `integration_branch_*` flags are tri-state: a missing key means
/// "use the default", which differs per flag. Plain bools would erase the
/// distinction between "absent" and "false".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MergeQueueConfig {
    /// Branch-name template; `{epic}`, `{prefix}`, `{user}` placeholders.
    #[serde(default)]
    pub integration_branch_template: String,
    /// Polecats source their worktrees from integration branches. Default true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_branch_polecat_enabled: Option<bool>,
    /// MR-target auto-detection; also gates auto-land. Default true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_branch_refinery_enabled: Option<bool>,
    /// The refinery patrol may land eligible epics. Default false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_branch_auto_land: Option<bool>,
    #[serde(default = "default_true")]
    pub run_tests: bool,
    /// Command run in the land worktree before pushing. Empty skips tests.
    #[serde(default)]
    pub test_command: String,
    #[serde(default = "default_target_branch")]
    pub target_branch: String,
    #[serde(default = "default_true")]
    pub delete_merged_branches: bool,
}

impl Default for MergeQueueConfig {
    fn default() -> Self {
        Self {
            integration_branch_template: String::new(),
            integration_branch_polecat_enabled: None,
            integration_branch_refinery_enabled: None,
            integration_branch_auto_land: None,
            run_tests: default_true(),
            test_command: String::new(),
            target_branch: default_target_branch(),
            delete_merged_branches: default_true(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}
fn default_target_branch() -> String {
    "main".into()
}

impl MergeQueueConfig {
    pub fn is_polecat_enabled(&self) -> bool {
        self.integration_branch_polecat_enabled.unwrap_or(true)
    }

    pub fn is_refinery_enabled(&self) -> bool {
        self.integration_branch_refinery_enabled.unwrap_or(true)
    }

    pub fn is_auto_land_enabled(&self) -> bool {
        self.integration_branch_auto_land.unwrap_or(false)
    }
}

impl RigSettings {
    /// Load settings from a config.json file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents)
    }

    /// Parse settings from a JSON string.
    pub fn parse(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExitError::Config(format!("invalid rig settings: {e}")).into())
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// malformed. Every consumer of rig settings must keep working on a rig
    /// that has never been configured.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// The effective merge-queue config (defaults when the section is absent).
    pub fn merge_queue(&self) -> MergeQueueConfig {
        self.merge_queue.clone().unwrap_or_default()
    }
}

/// Resolve the integration branch template for a rig.
/// Priority: CLI flag > rig config > default.
pub fn integration_branch_template(settings_path: &Path, cli_override: Option<&str>) -> String {
    if let Some(t) = cli_override
        && !t.is_empty()
    {
        return t.to_string();
    }

    let settings = RigSettings::load_or_default(settings_path);
    if let Some(mq) = settings.merge_queue
        && !mq.integration_branch_template.is_empty()
    {
        return mq.integration_branch_template;
    }

    DEFAULT_INTEGRATION_BRANCH_TEMPLATE.to_string()
}

/// The test command configured for land, or empty when none.
pub fn test_command(settings_path: &Path) -> String {
    RigSettings::load_or_default(settings_path)
        .merge_queue
        .map(|mq| mq.test_command)
        .unwrap_or_default()
}
