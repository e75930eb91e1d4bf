use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::beads::fields::{get_integration_branch_field, parse_mr_fields};
use crate::beads::{Beads, Issue, ListOptions, MERGE_REQUEST_LABEL, NotFound};
use crate::branch::build_integration_branch_name;
use crate::rig::Rig;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Epic to report on
    pub epic_id: String,
    /// Emit a machine-readable snapshot
    #[arg(long)]
    pub json: bool,
    /// Rig directory (defaults to the nearest enclosing rig)
    #[arg(long)]
    pub rig: Option<PathBuf>,
}

/// Readiness snapshot for an epic's integration branch. Field names are
/// part of the JSON wire format.
#[derive(Debug, Serialize, Deserialize)]
pub struct IntegrationStatus {
    pub epic: String,
    pub branch: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub created: String,
    pub ahead_of_main: u32,
    pub merged_mrs: Vec<MrSummary>,
    pub pending_mrs: Vec<MrSummary>,
    pub ready_to_land: bool,
    pub auto_land_enabled: bool,
    pub children_total: usize,
    pub children_closed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MrSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub status: String,
}

impl StatusArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let rig = Rig::find(self.rig.as_deref())?;
        let status = collect(&rig, &self.epic_id)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }
        print_status(&status);
        Ok(())
    }
}

/// Compute the readiness snapshot for an epic. Pure read: fetches origin
/// best-effort, never mutates refs or issues.
pub fn collect(rig: &Rig, epic_id: &str) -> anyhow::Result<IntegrationStatus> {
    let bd = Beads::new(&rig.path);

    let epic = bd.show(epic_id).map_err(|e| {
        if e.downcast_ref::<NotFound>().is_some() {
            anyhow::anyhow!("epic '{epic_id}' not found")
        } else {
            e.context("fetching epic")
        }
    })?;

    // Branch name stored at create time; default template covers epics
    // annotated before metadata existed.
    let branch = {
        let stored = get_integration_branch_field(&epic.description);
        if stored.is_empty() {
            build_integration_branch_name("", epic_id)
        } else {
            stored
        }
    };

    let git = rig.repo_git()?;
    if let Err(err) = git.fetch("origin") {
        tracing::debug!("fetch before status failed: {err:#}");
    }

    let local_exists = git.branch_exists(&branch).unwrap_or(false);
    let remote_exists = git.remote_branch_exists("origin", &branch).unwrap_or(false);
    if !local_exists && !remote_exists {
        anyhow::bail!("integration branch '{branch}' does not exist");
    }

    let compare_ref = if local_exists {
        branch.clone()
    } else {
        format!("origin/{branch}")
    };

    let created = git.branch_created_date(&compare_ref).unwrap_or_default();
    let ahead_of_main = git.commits_ahead("main", &compare_ref).unwrap_or(0);

    // MR sets come from the issue store, never from git-side queries.
    let all_mrs = bd.list(&ListOptions {
        label: Some(MERGE_REQUEST_LABEL.into()),
        status: Some("all".into()),
        ..Default::default()
    })?;
    let (merged, pending) = partition_mrs_by_target(&all_mrs, &branch);

    let children = bd
        .list(&ListOptions {
            parent: Some(epic_id.to_string()),
            status: Some("all".into()),
            ..Default::default()
        })
        .unwrap_or_default();
    let children_total = children.len();
    let children_closed = children.iter().filter(|c| c.status == "closed").count();

    let auto_land_enabled = rig.settings().merge_queue().is_auto_land_enabled();
    let ready_to_land =
        is_ready_to_land(ahead_of_main, children_total, children_closed, pending.len());

    Ok(IntegrationStatus {
        epic: epic_id.to_string(),
        branch,
        created,
        ahead_of_main,
        merged_mrs: merged.iter().map(|mr| summarize(mr, false)).collect(),
        pending_mrs: pending.iter().map(|mr| summarize(mr, true)).collect(),
        ready_to_land,
        auto_land_enabled,
        children_total,
        children_closed,
    })
}

/// Filter MRs to those targeting `branch` (by the `target:` field in each
/// description) and split into merged (closed) vs pending (everything else).
pub fn partition_mrs_by_target<'a>(
    mrs: &'a [Issue],
    branch: &str,
) -> (Vec<&'a Issue>, Vec<&'a Issue>) {
    let mut merged = Vec::new();
    let mut pending = Vec::new();
    for mr in mrs {
        if !mr.is_merge_request() {
            continue;
        }
        let Some(fields) = parse_mr_fields(mr) else {
            continue;
        };
        if fields.target != branch {
            continue;
        }
        if mr.status == "closed" {
            merged.push(mr);
        } else {
            pending.push(mr);
        }
    }
    (merged, pending)
}

/// Open MRs targeting a branch, for the land precondition check.
pub fn find_open_mrs_for_branch(bd: &Beads, branch: &str) -> anyhow::Result<Vec<Issue>> {
    let open = bd.list(&ListOptions {
        label: Some(MERGE_REQUEST_LABEL.into()),
        status: Some("open".into()),
        ..Default::default()
    })?;
    Ok(open
        .into_iter()
        .filter(|mr| {
            mr.is_merge_request()
                && parse_mr_fields(mr).is_some_and(|fields| fields.target == branch)
        })
        .collect())
}

/// An epic may land iff its branch contributed commits, it has children,
/// every child is closed, and nothing still targets the branch.
pub fn is_ready_to_land(
    ahead_of_main: u32,
    children_total: usize,
    children_closed: usize,
    pending_mrs: usize,
) -> bool {
    ahead_of_main > 0
        && children_total > 0
        && children_total == children_closed
        && pending_mrs == 0
}

fn summarize(mr: &Issue, with_status: bool) -> MrSummary {
    let title = mr
        .title
        .strip_prefix("Merge: ")
        .unwrap_or(&mr.title)
        .to_string();
    MrSummary {
        id: mr.id.clone(),
        title,
        status: if with_status { mr.status.clone() } else { String::new() },
    }
}

fn print_status(status: &IntegrationStatus) {
    println!("Integration: {}", status.branch);
    if !status.created.is_empty() {
        let ago = format_time_ago(&status.created);
        if ago.is_empty() {
            println!("Created: {}", status.created);
        } else {
            println!("Created: {} ({ago})", status.created);
        }
    }
    println!("Ahead of main: {} commits", status.ahead_of_main);
    println!(
        "Epic children: {}/{} closed",
        status.children_closed, status.children_total
    );

    println!("\nMerged MRs ({}):", status.merged_mrs.len());
    if status.merged_mrs.is_empty() {
        println!("  (none)");
    }
    for mr in &status.merged_mrs {
        println!("  {:<12}  {}", mr.id, mr.title);
    }

    println!("\nPending MRs ({}):", status.pending_mrs.len());
    if status.pending_mrs.is_empty() {
        println!("  (none)");
    }
    for mr in &status.pending_mrs {
        let status_info = if !mr.status.is_empty() && mr.status != "open" {
            format!(" ({})", mr.status)
        } else {
            String::new()
        };
        println!("  {:<12}  {}{status_info}", mr.id, mr.title);
    }

    println!();
    if status.ready_to_land {
        println!("✓ Integration branch is ready to land.");
        if status.auto_land_enabled {
            println!("  Auto-land: enabled");
        } else {
            println!("  Auto-land: disabled");
            println!("  Run: gt land {}", status.epic);
        }
    } else {
        if status.children_total == 0 {
            println!("○ Epic has no children yet.");
        } else if status.children_closed < status.children_total {
            println!(
                "○ Waiting for {}/{} children to close.",
                status.children_total - status.children_closed,
                status.children_total
            );
        } else if !status.pending_mrs.is_empty() {
            println!(
                "○ Waiting for {} pending MRs to merge.",
                status.pending_mrs.len()
            );
        } else if status.ahead_of_main == 0 {
            println!("○ No commits ahead of main.");
        }
        if status.auto_land_enabled {
            println!("  Auto-land: enabled (will land when ready)");
        } else {
            println!("  Auto-land: disabled");
        }
    }
}

/// Render a timestamp as a rough age ("3d ago"). Empty for unparseable
/// input so callers can fall back to the raw string.
pub fn format_time_ago(timestamp: &str) -> String {
    let parsed = chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.and_utc())
        })
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S %z")
                .map(|dt| dt.and_utc())
        })
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        });

    let Ok(then) = parsed else {
        return String::new();
    };

    let delta = chrono::Utc::now().signed_duration_since(then);
    let minutes = delta.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if delta.num_hours() < 24 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}d ago", delta.num_days())
    }
}
