//! Client for the beads issue store, via the `bd` executable.
//!
//! All integration-branch metadata lives inside issue descriptions and
//! labels (see [`fields`]); there is no direct storage access.

pub mod detect;
pub mod fields;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::subprocess::Tool;

/// Label that authoritatively marks an issue as a merge request. The
/// `type` field is advisory: agent workflows create MRs with `type=task`
/// but always apply this label.
pub const MERGE_REQUEST_LABEL: &str = "gt:merge-request";

/// An issue as returned by `bd --json`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", alias = "issue_type", default)]
    pub issue_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Issue {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn is_merge_request(&self) -> bool {
        self.has_label(MERGE_REQUEST_LABEL)
    }
}

/// Sentinel error for a missing issue, recoverable via `downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("issue not found")]
pub struct NotFound;

/// Filters for [`Beads::list`]. `status: Some("all")` returns both open
/// and closed issues.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub issue_type: Option<String>,
    pub status: Option<String>,
    pub parent: Option<String>,
    pub label: Option<String>,
}

/// Handle on the rig's issue store.
pub struct Beads {
    rig_path: PathBuf,
}

impl Beads {
    pub fn new(rig_path: impl Into<PathBuf>) -> Self {
        Self {
            rig_path: rig_path.into(),
        }
    }

    fn bd(&self) -> Tool {
        Tool::new("bd").current_dir(&self.rig_path)
    }

    /// Fetch a single issue. Returns [`NotFound`] when the id is unknown.
    pub fn show(&self, id: &str) -> anyhow::Result<Issue> {
        let output = self.bd().args(&["show", id, "--json"]).run()?;
        if !output.success() {
            if output.stderr.to_ascii_lowercase().contains("not found") {
                return Err(NotFound.into());
            }
            anyhow::bail!("bd show {id} failed: {}", output.stderr.trim());
        }
        parse_issue(&output.stdout)
    }

    /// List issues matching the filters.
    pub fn list(&self, opts: &ListOptions) -> anyhow::Result<Vec<Issue>> {
        let mut tool = self.bd().args(&["list", "--json"]);
        if let Some(ref t) = opts.issue_type {
            tool = tool.args(&["--type", t]);
        }
        if let Some(ref s) = opts.status {
            tool = tool.args(&["--status", s]);
        }
        if let Some(ref p) = opts.parent {
            tool = tool.args(&["--parent", p]);
        }
        if let Some(ref l) = opts.label {
            tool = tool.args(&["--label", l]);
        }

        let output = tool.run_ok()?;
        parse_issue_list(&output.stdout)
    }

    /// Replace an issue's description.
    pub fn update_description(&self, id: &str, description: &str) -> anyhow::Result<()> {
        self.bd()
            .args(&["update", id, "--description", description])
            .run_ok()?;
        Ok(())
    }

    /// Close an issue.
    pub fn close(&self, id: &str) -> anyhow::Result<()> {
        self.bd().args(&["close", id]).run_ok()?;
        Ok(())
    }
}

impl detect::IssueShower for Beads {
    fn show(&self, id: &str) -> anyhow::Result<Issue> {
        Beads::show(self, id)
    }
}

/// Parse a single issue: a bare object, or the first element of an array
/// (older bd versions wrap show output in a list).
fn parse_issue(json: &str) -> anyhow::Result<Issue> {
    let value: serde_json::Value = serde_json::from_str(json.trim())
        .map_err(|e| anyhow::anyhow!("parsing bd show output: {e}"))?;
    let obj = match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.remove(0),
        other => other,
    };
    serde_json::from_value(obj).map_err(|e| anyhow::anyhow!("parsing bd issue: {e}"))
}

/// Parse a list response: a bare array, or wrapped under `issues`.
fn parse_issue_list(json: &str) -> anyhow::Result<Vec<Issue>> {
    let value: serde_json::Value = serde_json::from_str(json.trim())
        .map_err(|e| anyhow::anyhow!("parsing bd list output: {e}"))?;
    let items = if let Some(arr) = value.as_array() {
        arr.clone()
    } else if let Some(arr) = value["issues"].as_array() {
        arr.clone()
    } else {
        anyhow::bail!("unexpected bd list output shape");
    };
    items
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(|e| anyhow::anyhow!("parsing bd issue: {e}")))
        .collect()
}
