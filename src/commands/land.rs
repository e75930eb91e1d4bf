//! Land: atomically merge an epic's integration branch back to its base.
//!
//! The merge runs in a disposable worktree so agents checked out elsewhere
//! in the rig are untouched. Stage order is fixed: verify epic and branch,
//! audit open MRs, merge, test, verify the merge is non-empty, push, then
//! clean up refs and close the epic. Everything after the push is
//! best-effort; a land is successful once the base branch is on origin.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Once;

use clap::Args;

use crate::beads::fields::{
    get_base_branch_field, get_integration_branch_field, parse_mr_fields,
};
use crate::beads::{Beads, NotFound};
use crate::branch::build_integration_branch_name;
use crate::config;
use crate::error::LandError;
use crate::rig::Rig;
use crate::worktree::LandWorktree;

#[derive(Debug, Args)]
pub struct LandArgs {
    /// Epic whose integration branch should land
    pub epic_id: String,
    /// Land even with open MRs targeting the branch
    #[arg(long)]
    pub force: bool,
    /// Skip the configured test command
    #[arg(long)]
    pub skip_tests: bool,
    /// Print the plan without making changes
    #[arg(long)]
    pub dry_run: bool,
    /// Rig directory (defaults to the nearest enclosing rig)
    #[arg(long)]
    pub rig: Option<PathBuf>,
}

/// Behavior knobs shared by the CLI and the refinery patrol.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandOptions {
    pub force: bool,
    pub skip_tests: bool,
    pub dry_run: bool,
}

impl LandArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let rig = Rig::find(self.rig.as_deref())?;
        run(
            &rig,
            &self.epic_id,
            LandOptions {
                force: self.force,
                skip_tests: self.skip_tests,
                dry_run: self.dry_run,
            },
        )
    }
}

pub fn run(rig: &Rig, epic_id: &str, opts: LandOptions) -> anyhow::Result<()> {
    let bd = Beads::new(&rig.path);
    let git = rig.repo_git()?;

    if opts.dry_run {
        println!("Dry run - no changes will be made\n");
    }

    // Verify the epic and extract branch + base from its metadata
    let epic = bd.show(epic_id).map_err(|e| {
        if e.downcast_ref::<NotFound>().is_some() {
            anyhow::anyhow!("epic '{epic_id}' not found")
        } else {
            e.context("fetching epic")
        }
    })?;
    if epic.issue_type != "epic" {
        return Err(LandError::NotAnEpic {
            id: epic_id.to_string(),
            actual: epic.issue_type,
        }
        .into());
    }

    let branch = {
        let stored = get_integration_branch_field(&epic.description);
        if stored.is_empty() {
            build_integration_branch_name("", epic_id)
        } else {
            stored
        }
    };
    let base = {
        let stored = get_base_branch_field(&epic.description);
        if stored.is_empty() { "main".to_string() } else { stored }
    };

    println!("Landing integration branch for epic: {epic_id}");
    println!("  Title: {}\n", epic.title);

    // Confirm the branch exists; a remote-only branch is fetched into a
    // local ref so later stages see consistent state.
    println!("Checking integration branch...");
    let local_exists = git
        .branch_exists(&branch)
        .map_err(|e| e.context("checking branch existence"))?;
    if !local_exists {
        let remote_exists = git
            .remote_branch_exists("origin", &branch)
            .map_err(|e| e.context("checking remote branch"))?;
        if !remote_exists {
            return Err(LandError::BranchMissing { branch }.into());
        }
        println!("Fetching integration branch from origin...");
        git.fetch_branch("origin", &branch)
            .map_err(|e| e.context("fetching branch"))?;
    }
    println!("  ✓ Branch exists");

    // Audit open MRs still targeting the branch
    println!("Checking open merge requests...");
    let open_mrs = super::status::find_open_mrs_for_branch(&bd, &branch)
        .map_err(|e| e.context("checking open MRs"))?;
    if open_mrs.is_empty() {
        println!("  ✓ No open MRs targeting integration branch");
    } else {
        println!("\n  ⚠ Open merge requests targeting {branch}:");
        for mr in &open_mrs {
            match parse_mr_fields(mr) {
                Some(fields) if !fields.branch.is_empty() => {
                    println!("    - {}: {} (from {})", mr.id, mr.title, fields.branch);
                }
                _ => println!("    - {}: {}", mr.id, mr.title),
            }
        }
        println!();
        if !opts.force {
            return Err(LandError::PendingMrs {
                branch,
                count: open_mrs.len(),
            }
            .into());
        }
        println!("  ⚠ Proceeding anyway (--force)");
    }

    if opts.dry_run {
        println!("\nDry run complete. Would perform:");
        println!("  1. Merge {branch} to {base} (--no-ff)");
        if !opts.skip_tests {
            println!("  2. Run tests on {base}");
        }
        println!("  3. Push {base} to origin");
        println!("  4. Delete integration branch (local and remote)");
        println!("  5. Update epic status to closed");
        return Ok(());
    }

    println!("Fetching latest from origin...");
    git.fetch("origin")
        .map_err(|e| e.context("fetching from origin"))?;

    // The worktree tears itself down when dropped, on every path below;
    // the signal handler covers SIGINT, which bypasses drops.
    install_signal_cleanup(rig.land_worktree_path());
    println!("Creating temporary worktree for merge...");
    let wt = LandWorktree::create(rig, &base).map_err(|e| e.context("creating land worktree"))?;

    if let Err(err) = wt.git().pull("origin", &base) {
        tracing::debug!("pull before merge failed: {err:#}");
        println!("  (pull from origin/{base} skipped)");
    }

    println!("Merging {branch} to {base}...");
    let merge_msg = format!("Merge {branch}: {}\n\nEpic: {epic_id}", epic.title);
    if let Err(err) = wt.git().merge_no_ff(&format!("origin/{branch}"), &merge_msg) {
        let _ = wt.git().abort_merge();
        return Err(LandError::MergeConflict {
            branch,
            detail: format!("{err:#}"),
        }
        .into());
    }
    println!("  ✓ Merged successfully");

    if opts.skip_tests {
        println!("  (tests skipped)");
    } else {
        let test_cmd = config::test_command(&rig.settings_path());
        if test_cmd.is_empty() {
            println!("  (no test command configured)");
        } else {
            println!("Running tests: {test_cmd}");
            if !run_test_command(&wt, &test_cmd)? {
                println!("  ✗ Tests failed");
                return Err(LandError::TestsFailed { command: test_cmd }.into());
            }
            println!("  ✓ Tests passed");
        }
    }

    // Empty-merge guard: zero file changes means conflict resolution
    // discarded the integration branch's work. Deleting the branch now
    // would silently lose it, so the land stops with both refs intact.
    if let Ok(diff) = wt.git().diff_stat_last_commit()
        && diff.trim().is_empty()
    {
        return Err(LandError::EmptyMerge { branch, base }.into());
    }

    println!("Pushing {base} to origin...");
    if let Err(err) = wt.git().push("origin", &base, false) {
        return Err(LandError::PushFailed {
            base,
            detail: format!("{err:#}"),
        }
        .into());
    }
    println!("  ✓ Pushed to origin");

    // The land is done; ref cleanup and epic close are best-effort.
    // Remote first, then local, so a failure can't leave only the remote.
    println!("Deleting integration branch...");
    match git.delete_remote_branch("origin", &branch) {
        Ok(()) => println!("  ✓ Deleted from origin"),
        Err(err) => {
            tracing::warn!("could not delete remote branch: {err:#}");
            println!("  (could not delete remote branch: {err:#})");
        }
    }
    match git.delete_branch(&branch, true) {
        Ok(()) => println!("  ✓ Deleted locally"),
        Err(err) => {
            tracing::warn!("could not delete local branch: {err:#}");
            println!("  (could not delete local branch: {err:#})");
        }
    }

    println!("Updating epic status...");
    match bd.close(epic_id) {
        Ok(()) => println!("  ✓ Epic closed"),
        Err(err) => {
            tracing::warn!("could not close epic: {err:#}");
            println!("  (could not close epic: {err:#})");
        }
    }

    println!("\n✓ Successfully landed integration branch");
    println!("  Epic:   {epic_id}");
    println!("  Branch: {branch} → {base}");

    Ok(())
}

/// Run the configured test command inside the land worktree, streaming its
/// output through. Returns whether it exited zero.
fn run_test_command(wt: &LandWorktree, test_cmd: &str) -> anyhow::Result<bool> {
    let mut parts = test_cmd.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(true);
    };

    let status = Command::new(program)
        .args(parts)
        .current_dir(wt.path())
        .status()
        .map_err(|e| anyhow::anyhow!("running test command '{test_cmd}': {e}"))?;
    Ok(status.success())
}

/// On SIGINT the worktree's Drop never runs; remove the directory directly.
/// Registered once per process; patrol may land repeatedly.
fn install_signal_cleanup(worktree_path: PathBuf) {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| {
        let result = ctrlc::set_handler(move || {
            let _ = std::fs::remove_dir_all(&worktree_path);
            std::process::exit(130);
        });
        if let Err(err) = result {
            tracing::debug!("could not install signal handler: {err}");
        }
    });
}
