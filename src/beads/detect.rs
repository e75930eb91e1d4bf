//! MR target resolution: walk an issue's parent chain to the owning epic's
//! integration branch.

use anyhow::Context;

use super::Issue;
use super::fields::get_integration_branch_field;
use crate::branch::build_integration_branch_name;

/// Bound on parent-chain hops. Absorbs cycles and pathologically nested
/// hierarchies without a visited-set; real epic trees stay well under it.
pub const MAX_PARENT_DEPTH: usize = 10;

/// Issue lookup seam, implemented by [`super::Beads`].
pub trait IssueShower {
    fn show(&self, id: &str) -> anyhow::Result<Issue>;
}

/// Branch existence seam, implemented by [`crate::git::Git`].
pub trait BranchChecker {
    fn branch_exists(&self, name: &str) -> anyhow::Result<bool>;
    fn remote_branch_exists(&self, remote: &str, name: &str) -> anyhow::Result<bool>;
}

/// Find the integration branch an MR for `issue_id` should target.
///
/// Walks up the parent chain. At each epic, the candidate is the branch
/// stored in its description, else the default template applied to its id;
/// a candidate counts only if it exists locally or on origin. Returns an
/// empty string when no applicable branch is found.
pub fn detect_integration_branch(
    issues: &dyn IssueShower,
    branches: &dyn BranchChecker,
    issue_id: &str,
) -> anyhow::Result<String> {
    let mut current = issues.show(issue_id)?;

    for _ in 0..=MAX_PARENT_DEPTH {
        if current.issue_type == "epic" {
            let stored = get_integration_branch_field(&current.description);
            let candidate = if stored.is_empty() {
                build_integration_branch_name("", &current.id)
            } else {
                stored
            };
            if verify_branch(branches, &candidate)? {
                return Ok(candidate);
            }
            // No usable branch on this epic; keep walking
        }

        if current.parent.is_empty() {
            return Ok(String::new());
        }
        current = issues
            .show(&current.parent)
            .with_context(|| format!("loading parent issue '{}'", current.parent))?;
    }

    tracing::warn!("parent chain for '{issue_id}' exceeded {MAX_PARENT_DEPTH} hops; giving up");
    Ok(String::new())
}

/// A candidate exists if it is a local branch or present on origin.
/// Local-check failures are fatal (the repository itself is broken);
/// remote-check failures are transient and just disqualify the candidate.
fn verify_branch(branches: &dyn BranchChecker, candidate: &str) -> anyhow::Result<bool> {
    if branches
        .branch_exists(candidate)
        .context("checking local branch")?
    {
        return Ok(true);
    }
    match branches.remote_branch_exists("origin", candidate) {
        Ok(exists) => Ok(exists),
        Err(err) => {
            tracing::warn!("remote check for '{candidate}' failed: {err:#}");
            Ok(false)
        }
    }
}
