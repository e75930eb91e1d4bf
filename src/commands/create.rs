use std::path::PathBuf;

use clap::Args;

use crate::beads::fields::{
    add_base_branch_field, add_integration_branch_field,
};
use crate::beads::{Beads, NotFound};
use crate::branch::{build_integration_branch_name, validate_branch_name};
use crate::config;
use crate::rig::Rig;

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Epic to create an integration branch for
    pub epic_id: String,
    /// Branch-name template ({epic}, {prefix}, {user}); overrides rig config
    #[arg(long)]
    pub branch: Option<String>,
    /// Base branch to create from (default: main)
    #[arg(long)]
    pub base_branch: Option<String>,
    /// Rig directory (defaults to the nearest enclosing rig)
    #[arg(long)]
    pub rig: Option<PathBuf>,
}

impl CreateArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let rig = Rig::find(self.rig.as_deref())?;
        let bd = Beads::new(&rig.path);

        let epic = bd.show(&self.epic_id).map_err(|e| {
            if e.downcast_ref::<NotFound>().is_some() {
                anyhow::anyhow!("epic '{}' not found", self.epic_id)
            } else {
                e.context("fetching epic")
            }
        })?;

        if epic.issue_type != "epic" {
            anyhow::bail!("'{}' is a {}, not an epic", self.epic_id, epic.issue_type);
        }

        let template =
            config::integration_branch_template(&rig.settings_path(), self.branch.as_deref());
        let branch_name = build_integration_branch_name(&template, &self.epic_id);
        validate_branch_name(&branch_name)
            .map_err(|e| e.context("invalid branch name"))?;

        let git = rig.repo_git()?;

        if git
            .branch_exists(&branch_name)
            .map_err(|e| e.context("checking branch existence"))?
        {
            anyhow::bail!("integration branch '{branch_name}' already exists locally");
        }

        // Remote probe is best-effort: a network error must not block create,
        // but a positive hit does.
        match git.remote_branch_exists("origin", &branch_name) {
            Ok(true) => {
                anyhow::bail!("integration branch '{branch_name}' already exists on origin")
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("remote branch check failed: {err:#}");
                println!("  (could not check remote, continuing)");
            }
        }

        // A failed fetch is only a warning: creating from a stale or missing
        // origin ref fails on its own in the next step.
        println!("Fetching latest from origin...");
        if let Err(err) = git.fetch("origin") {
            tracing::warn!("fetch from origin failed: {err:#}");
            println!("  (warning: fetch from origin failed, continuing)");
        }

        let (base_ref, base_display) = resolve_base(self.base_branch.as_deref());
        println!("Creating branch '{branch_name}' from {base_display}...");
        git.create_branch_from(&branch_name, &base_ref)
            .map_err(|e| e.context("creating branch"))?;

        println!("Pushing to origin...");
        if let Err(err) = git.push("origin", &branch_name, false) {
            let _ = git.delete_branch(&branch_name, true);
            return Err(err.context("pushing to origin"));
        }

        // Record the branch in the epic so land and MR routing can find it.
        // The branch exists either way, so a failed write is only a warning.
        // base_branch is stored only for a non-default base; an explicit
        // `--base-branch main` is the default.
        let mut new_desc = add_integration_branch_field(&epic.description, &branch_name);
        if base_display != "main" {
            new_desc = add_base_branch_field(&new_desc, &base_display);
        }
        if new_desc != epic.description
            && let Err(err) = bd.update_description(&self.epic_id, &new_desc)
        {
            tracing::warn!("could not update epic metadata: {err:#}");
            println!("  (warning: could not update epic metadata)");
        }

        println!("\n✓ Created integration branch");
        println!("  Epic:   {}", self.epic_id);
        println!("  Branch: {branch_name}");
        println!("  From:   {base_display}");
        println!("\n  MRs for this epic's children will target it automatically:");
        println!("    gt resolve <child-issue-id>");

        Ok(())
    }
}

/// Resolve the base ref to branch from and its display name. The stored
/// form never carries the `origin/` prefix; the ref always does.
fn resolve_base(base_branch: Option<&str>) -> (String, String) {
    match base_branch {
        None => ("origin/main".to_string(), "main".to_string()),
        Some(name) => {
            let display = name.strip_prefix("origin/").unwrap_or(name);
            (format!("origin/{display}"), display.to_string())
        }
    }
}
