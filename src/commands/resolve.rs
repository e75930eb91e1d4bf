use std::path::PathBuf;

use clap::Args;

use crate::beads::Beads;
use crate::beads::detect::detect_integration_branch;
use crate::rig::Rig;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Issue whose MR target should be resolved
    pub issue_id: String,
    /// Rig directory (defaults to the nearest enclosing rig)
    #[arg(long)]
    pub rig: Option<PathBuf>,
}

impl ResolveArgs {
    /// Print the integration branch an MR for this issue should target,
    /// found by walking the issue's parent chain to an epic whose branch
    /// actually exists.
    pub fn execute(&self) -> anyhow::Result<()> {
        let rig = Rig::find(self.rig.as_deref())?;

        if !rig.settings().merge_queue().is_refinery_enabled() {
            anyhow::bail!("integration branch detection is disabled for this rig");
        }

        let bd = Beads::new(&rig.path);
        let git = rig.repo_git()?;

        let branch = detect_integration_branch(&bd, &git, &self.issue_id)?;
        if branch.is_empty() {
            anyhow::bail!("no integration branch found for '{}'", self.issue_id);
        }

        println!("{branch}");
        Ok(())
    }
}
