//! Rig layout: where a rig keeps its repository bases, settings, and the
//! reserved landing directory.

use std::path::{Path, PathBuf};

use crate::config::RigSettings;
use crate::git::Git;

const BARE_REPO_DIR: &str = ".repo.git";
const MAYOR_CLONE_DIR: &str = "mayor/rig";
const LAND_WORKTREE_DIR: &str = ".land-worktree";

/// A rig: one git repository plus its beads database and settings.
#[derive(Debug, Clone)]
pub struct Rig {
    pub path: PathBuf,
}

impl Rig {
    /// Locate the rig: an explicit `--rig` path, or the nearest ancestor of
    /// the current directory that looks like one.
    pub fn find(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            if !is_rig(path) {
                anyhow::bail!("'{}' is not a rig (no {BARE_REPO_DIR} or {MAYOR_CLONE_DIR})", path.display());
            }
            return Ok(Self {
                path: path.to_path_buf(),
            });
        }

        let cwd = std::env::current_dir()?;
        let mut dir: &Path = &cwd;
        loop {
            if is_rig(dir) {
                return Ok(Self {
                    path: dir.to_path_buf(),
                });
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => anyhow::bail!("not inside a Gas Town rig (and no --rig given)"),
            }
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.path.join("settings").join("config.json")
    }

    pub fn settings(&self) -> RigSettings {
        RigSettings::load_or_default(&self.settings_path())
    }

    pub fn bare_repo_path(&self) -> PathBuf {
        self.path.join(BARE_REPO_DIR)
    }

    pub fn land_worktree_path(&self) -> PathBuf {
        self.path.join(LAND_WORKTREE_DIR)
    }

    /// Git handle for ref-only operations. Prefers the bare repository;
    /// falls back to the mayor's working clone.
    pub fn repo_git(&self) -> anyhow::Result<Git> {
        let bare = self.bare_repo_path();
        if bare.is_dir() {
            return Ok(Git::new(bare));
        }
        let mayor = self.path.join(MAYOR_CLONE_DIR);
        if mayor.is_dir() {
            return Ok(Git::new(mayor));
        }
        anyhow::bail!(
            "no repo base found in '{}' (neither {BARE_REPO_DIR} nor {MAYOR_CLONE_DIR} exists)",
            self.path.display()
        )
    }
}

fn is_rig(dir: &Path) -> bool {
    dir.join(BARE_REPO_DIR).is_dir() || dir.join(MAYOR_CLONE_DIR).is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_git_prefers_bare_repo() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(BARE_REPO_DIR)).unwrap();
        std::fs::create_dir_all(tmp.path().join(MAYOR_CLONE_DIR)).unwrap();

        let rig = Rig {
            path: tmp.path().to_path_buf(),
        };
        let git = rig.repo_git().unwrap();
        assert_eq!(git.dir(), tmp.path().join(BARE_REPO_DIR));
    }

    #[test]
    fn repo_git_falls_back_to_mayor_clone() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(MAYOR_CLONE_DIR)).unwrap();

        let rig = Rig {
            path: tmp.path().to_path_buf(),
        };
        let git = rig.repo_git().unwrap();
        assert_eq!(git.dir(), tmp.path().join(MAYOR_CLONE_DIR));
    }

    #[test]
    fn repo_git_errors_when_no_base_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let rig = Rig {
            path: tmp.path().to_path_buf(),
        };
        let err = rig.repo_git().unwrap_err();
        assert!(err.to_string().contains("no repo base found"));
    }

    #[test]
    fn find_rejects_explicit_non_rig() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Rig::find(Some(tmp.path())).is_err());
    }

    #[test]
    fn find_accepts_explicit_rig() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(BARE_REPO_DIR)).unwrap();
        let rig = Rig::find(Some(tmp.path())).unwrap();
        assert_eq!(rig.path, tmp.path());
    }

    #[test]
    fn paths_are_rooted_in_the_rig() {
        let rig = Rig {
            path: PathBuf::from("/town/rigs/citadel"),
        };
        assert_eq!(
            rig.settings_path(),
            PathBuf::from("/town/rigs/citadel/settings/config.json")
        );
        assert_eq!(
            rig.land_worktree_path(),
            PathBuf::from("/town/rigs/citadel/.land-worktree")
        );
    }
}
