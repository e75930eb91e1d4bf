//! Disposable worktree for land operations.
//!
//! Other agents (refinery, mayor, polecats) keep live checkouts in the rig;
//! merging in-place would corrupt them. Each land therefore runs in a
//! short-lived worktree created from the bare repository and torn down on
//! every exit path.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::git::Git;
use crate::rig::Rig;

/// An isolated checkout of the base branch, removed on drop.
#[derive(Debug)]
pub struct LandWorktree {
    path: PathBuf,
    bare: Git,
    git: Git,
}

impl LandWorktree {
    /// Create the worktree checked out to `base_branch`.
    ///
    /// A stale directory from a crashed run is removed first, so reuse after
    /// a crash is safe. The add is forced because the branch may already be
    /// checked out elsewhere in the rig, and skips sparse-checkout config.
    pub fn create(rig: &Rig, base_branch: &str) -> anyhow::Result<Self> {
        let bare_path = rig.bare_repo_path();
        if !bare_path.is_dir() {
            anyhow::bail!("bare repo not found at {}", bare_path.display());
        }
        let bare = Git::new(&bare_path);

        let path = rig.land_worktree_path();
        if path.exists() {
            tracing::debug!("removing stale land worktree at {}", path.display());
            let _ = bare.worktree_remove(&path, true);
            let _ = std::fs::remove_dir_all(&path);
        }

        bare.worktree_add_existing_force_no_sparse(&path, base_branch)
            .context("creating land worktree")?;

        Ok(Self {
            git: Git::new(&path),
            path,
            bare,
        })
    }

    /// Git handle scoped to the worktree (pull, merge, push, diff).
    pub fn git(&self) -> &Git {
        &self.git
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LandWorktree {
    fn drop(&mut self) {
        if let Err(err) = self.bare.worktree_remove(&self.path, true) {
            tracing::debug!("worktree remove failed: {err:#}");
        }
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("removing {} failed: {err}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::process::{Command, Stdio};

    use super::*;

    fn git_in(dir: &Path, args: &[&str]) {
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

    /// Rig fixture with a bare repo containing one commit on main.
    fn scratch_rig() -> (tempfile::TempDir, Rig) {
        let tmp = tempfile::tempdir().unwrap();
        let seed = tmp.path().join("seed");
        std::fs::create_dir(&seed).unwrap();
        git_in(tmp.path(), &["init", "-b", "main", "seed"]);
        std::fs::write(seed.join("README.md"), "rig\n").unwrap();
        git_in(&seed, &["add", "."]);
        git_in(&seed, &["commit", "-m", "initial"]);

        let bare = tmp.path().join(".repo.git");
        git_in(
            tmp.path(),
            &[
                "clone",
                "--bare",
                seed.to_str().unwrap(),
                bare.to_str().unwrap(),
            ],
        );

        let rig = Rig {
            path: tmp.path().to_path_buf(),
        };
        (tmp, rig)
    }

    #[test]
    fn create_checks_out_base_branch_and_drop_removes() {
        let (_tmp, rig) = scratch_rig();
        let wt_path = rig.land_worktree_path();

        {
            let wt = LandWorktree::create(&rig, "main").unwrap();
            assert!(wt.path().join("README.md").exists());
            assert_eq!(wt.path(), wt_path);
        }
        // Dropped: directory gone
        assert!(!wt_path.exists());
    }

    #[test]
    fn create_removes_stale_directory_from_crashed_run() {
        let (_tmp, rig) = scratch_rig();
        let wt_path = rig.land_worktree_path();

        std::fs::create_dir(&wt_path).unwrap();
        std::fs::write(wt_path.join("leftover"), "stale").unwrap();

        let wt = LandWorktree::create(&rig, "main").unwrap();
        assert!(wt.path().join("README.md").exists());
        assert!(!wt.path().join("leftover").exists());
    }

    #[test]
    fn create_fails_without_bare_repo() {
        let tmp = tempfile::tempdir().unwrap();
        let rig = Rig {
            path: tmp.path().to_path_buf(),
        };
        let err = LandWorktree::create(&rig, "main").unwrap_err();
        assert!(err.to_string().contains("bare repo not found"));
    }

    #[test]
    fn teardown_runs_even_when_a_land_step_panics() {
        let (_tmp, rig) = scratch_rig();
        let wt_path = rig.land_worktree_path();

        let result = std::panic::catch_unwind(|| {
            let _wt = LandWorktree::create(&rig, "main").unwrap();
            panic!("merge exploded");
        });
        assert!(result.is_err());
        assert!(!wt_path.exists());
    }
}
