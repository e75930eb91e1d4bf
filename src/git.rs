//! Thin wrapper over the git executable.
//!
//! One `Git` points at a single repository directory, either a working tree or a
//! bare repository. Ref-only operations work against either; work-tree
//! operations (pull, merge, diff) are only meaningful on a checkout, which
//! for landing is always the disposable worktree.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;

use crate::beads::detect::BranchChecker;
use crate::subprocess::run_command;

#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run git, returning stdout. Non-zero exit is an error carrying stderr.
    fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        run_command("git", args, Some(&self.dir))
            .with_context(|| format!("git {}", args.first().copied().unwrap_or("")))
    }

    fn output(&self, args: &[&str]) -> anyhow::Result<std::process::Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context("running git")
    }

    // --- ref queries ---

    /// Whether `refs/heads/<name>` exists in this repository.
    pub fn branch_exists(&self, name: &str) -> anyhow::Result<bool> {
        let refname = format!("refs/heads/{name}");
        let output = self.output(&["show-ref", "--verify", "--quiet", &refname])?;
        Ok(output.status.success())
    }

    /// Whether the branch exists on the remote. Hits the network.
    pub fn remote_branch_exists(&self, remote: &str, name: &str) -> anyhow::Result<bool> {
        let refname = format!("refs/heads/{name}");
        let out = self.run(&["ls-remote", "--heads", remote, &refname])?;
        Ok(!out.trim().is_empty())
    }

    /// Creation date of a branch ref, iso8601. Accepts `name` or `origin/name`.
    pub fn branch_created_date(&self, refname: &str) -> anyhow::Result<String> {
        let full = if let Some(rest) = refname.strip_prefix("origin/") {
            format!("refs/remotes/origin/{rest}")
        } else {
            format!("refs/heads/{refname}")
        };
        let out = self.run(&["for-each-ref", "--format=%(creatordate:iso8601)", &full])?;
        let date = out.lines().next().unwrap_or("").trim();
        if date.is_empty() {
            anyhow::bail!("no such ref: {refname}");
        }
        Ok(date.to_string())
    }

    /// Number of commits on `refname` that are not on `base`.
    pub fn commits_ahead(&self, base: &str, refname: &str) -> anyhow::Result<u32> {
        let range = format!("{base}..{refname}");
        let out = self.run(&["rev-list", "--count", &range])?;
        out.trim()
            .parse()
            .with_context(|| format!("parsing rev-list count {:?}", out.trim()))
    }

    // --- ref mutations ---

    pub fn create_branch_from(&self, name: &str, base_ref: &str) -> anyhow::Result<()> {
        self.run(&["branch", name, base_ref])?;
        Ok(())
    }

    pub fn delete_branch(&self, name: &str, force: bool) -> anyhow::Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, name])?;
        Ok(())
    }

    pub fn delete_remote_branch(&self, remote: &str, name: &str) -> anyhow::Result<()> {
        self.run(&["push", remote, "--delete", name])?;
        Ok(())
    }

    // --- network ---

    pub fn fetch(&self, remote: &str) -> anyhow::Result<()> {
        self.run(&["fetch", remote])?;
        Ok(())
    }

    /// Fetch a single branch, creating or updating the local ref of the same
    /// name without requiring a checkout.
    pub fn fetch_branch(&self, remote: &str, name: &str) -> anyhow::Result<()> {
        let refspec = format!("{name}:{name}");
        self.run(&["fetch", remote, &refspec])?;
        Ok(())
    }

    pub fn pull(&self, remote: &str, branch: &str) -> anyhow::Result<()> {
        self.run(&["pull", remote, branch])?;
        Ok(())
    }

    pub fn push(&self, remote: &str, branch: &str, force: bool) -> anyhow::Result<()> {
        if force {
            self.run(&["push", "--force", remote, branch])?;
        } else {
            self.run(&["push", remote, branch])?;
        }
        Ok(())
    }

    // --- worktrees ---

    /// Add a worktree for a branch that may already be checked out elsewhere.
    /// `--force` is required for that; no sparse-checkout config is applied.
    pub fn worktree_add_existing_force_no_sparse(
        &self,
        path: &Path,
        branch: &str,
    ) -> anyhow::Result<()> {
        let path_str = path.to_string_lossy();
        self.run(&["worktree", "add", "--force", &path_str, branch])?;
        Ok(())
    }

    pub fn worktree_remove(&self, path: &Path, force: bool) -> anyhow::Result<()> {
        let path_str = path.to_string_lossy();
        if force {
            self.run(&["worktree", "remove", "--force", &path_str])?;
        } else {
            self.run(&["worktree", "remove", &path_str])?;
        }
        Ok(())
    }

    // --- merging ---

    pub fn merge_no_ff(&self, refname: &str, message: &str) -> anyhow::Result<()> {
        self.run(&["merge", "--no-ff", "-m", message, refname])?;
        Ok(())
    }

    pub fn abort_merge(&self) -> anyhow::Result<()> {
        self.run(&["merge", "--abort"])?;
        Ok(())
    }

    /// `diff --stat` of the last commit; empty output means the commit
    /// touched no files.
    pub fn diff_stat_last_commit(&self) -> anyhow::Result<String> {
        self.run(&["diff", "--stat", "HEAD~1..HEAD"])
    }
}

impl BranchChecker for Git {
    fn branch_exists(&self, name: &str) -> anyhow::Result<bool> {
        Git::branch_exists(self, name)
    }

    fn remote_branch_exists(&self, remote: &str, name: &str) -> anyhow::Result<bool> {
        Git::remote_branch_exists(self, remote, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Init a scratch repository with one commit on main.
    fn scratch_repo() -> (tempfile::TempDir, Git) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        run_git(&dir, &["init", "-b", "main"]);
        // Local identity so Git::merge_no_ff can commit without global config
        run_git(&dir, &["config", "user.email", "test@example.com"]);
        run_git(&dir, &["config", "user.name", "test"]);
        std::fs::write(dir.join("README.md"), "scratch\n").unwrap();
        run_git(&dir, &["add", "."]);
        run_git(&dir, &["commit", "-m", "initial"]);
        (tmp, Git::new(dir))
    }

    fn run_git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.email=test@example.com",
                "-c",
                "user.name=test",
            ])
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn commit_file(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), name).unwrap();
        run_git(dir, &["add", "."]);
        run_git(dir, &["commit", "-m", name]);
    }

    #[test]
    fn branch_exists_reflects_refs() {
        let (_tmp, git) = scratch_repo();
        assert!(git.branch_exists("main").unwrap());
        assert!(!git.branch_exists("integration/gt-epic").unwrap());

        git.create_branch_from("integration/gt-epic", "main").unwrap();
        assert!(git.branch_exists("integration/gt-epic").unwrap());
    }

    #[test]
    fn delete_branch_removes_ref() {
        let (_tmp, git) = scratch_repo();
        git.create_branch_from("doomed", "main").unwrap();
        git.delete_branch("doomed", true).unwrap();
        assert!(!git.branch_exists("doomed").unwrap());
    }

    #[test]
    fn commits_ahead_counts_new_commits() {
        let (tmp, git) = scratch_repo();
        git.create_branch_from("feature", "main").unwrap();
        run_git(tmp.path(), &["checkout", "feature"]);
        commit_file(tmp.path(), "a.txt");
        commit_file(tmp.path(), "b.txt");

        assert_eq!(git.commits_ahead("main", "feature").unwrap(), 2);
        assert_eq!(git.commits_ahead("feature", "main").unwrap(), 0);
    }

    #[test]
    fn branch_created_date_is_nonempty_for_real_ref() {
        let (_tmp, git) = scratch_repo();
        let date = git.branch_created_date("main").unwrap();
        assert!(!date.is_empty());
        assert!(git.branch_created_date("missing-branch").is_err());
    }

    #[test]
    fn merge_no_ff_creates_merge_commit_with_diff() {
        let (tmp, git) = scratch_repo();
        git.create_branch_from("feature", "main").unwrap();
        run_git(tmp.path(), &["checkout", "feature"]);
        commit_file(tmp.path(), "feature.txt");
        run_git(tmp.path(), &["checkout", "main"]);

        git.merge_no_ff("feature", "Merge feature: test").unwrap();
        let stat = git.diff_stat_last_commit().unwrap();
        assert!(stat.contains("feature.txt"));
    }

    #[test]
    fn worktree_add_and_remove() {
        let (tmp, git) = scratch_repo();
        let wt_path = tmp.path().join(".land-worktree");

        git.worktree_add_existing_force_no_sparse(&wt_path, "main")
            .unwrap();
        assert!(wt_path.join("README.md").exists());

        git.worktree_remove(&wt_path, true).unwrap();
        assert!(!wt_path.exists());
    }
}
