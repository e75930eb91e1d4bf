//! Refinery patrol tick: auto-land epics that are ready.
//!
//! One tick is fully synchronous. Epics are scanned in id order; a failing
//! land is logged and the scan moves on, so one broken epic cannot wedge
//! the queue. At most one epic lands per tick.

use std::path::PathBuf;

use clap::Args;

use crate::beads::{Beads, ListOptions};
use crate::commands::land::{self, LandOptions};
use crate::commands::status;
use crate::rig::Rig;

#[derive(Debug, Args)]
pub struct PatrolArgs {
    /// Rig directory (defaults to the nearest enclosing rig)
    #[arg(long)]
    pub rig: Option<PathBuf>,
}

impl PatrolArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let rig = Rig::find(self.rig.as_deref())?;
        let mq = rig.settings().merge_queue();

        if !mq.is_refinery_enabled() {
            println!("Refinery is disabled for this rig; nothing to do.");
            return Ok(());
        }
        if !mq.is_auto_land_enabled() {
            println!("Auto-land is disabled for this rig; nothing to do.");
            return Ok(());
        }

        let bd = Beads::new(&rig.path);
        let mut epics = bd.list(&ListOptions {
            issue_type: Some("epic".into()),
            status: Some("open".into()),
            ..Default::default()
        })?;
        epics.sort_by(|a, b| a.id.cmp(&b.id));

        if epics.is_empty() {
            println!("No open epics.");
            return Ok(());
        }

        for epic in &epics {
            let snapshot = match status::collect(&rig, &epic.id) {
                Ok(s) => s,
                Err(err) => {
                    // An epic without an integration branch is normal
                    tracing::debug!("status for '{}' unavailable: {err:#}", epic.id);
                    continue;
                }
            };
            if !snapshot.ready_to_land {
                tracing::debug!(
                    "'{}' not ready: ahead={} children={}/{} pending={}",
                    epic.id,
                    snapshot.ahead_of_main,
                    snapshot.children_closed,
                    snapshot.children_total,
                    snapshot.pending_mrs.len()
                );
                continue;
            }

            println!("Epic {} is ready to land ({})", epic.id, snapshot.branch);
            let opts = LandOptions {
                force: false,
                skip_tests: !mq.run_tests,
                dry_run: false,
            };
            match land::run(&rig, &epic.id, opts) {
                Ok(()) => {
                    // One land per tick; the next tick picks up the rest
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!("auto-land of '{}' failed: {err:#}", epic.id);
                    eprintln!("auto-land of '{}' failed: {err:#}", epic.id);
                }
            }
        }

        println!("No epic landed this tick.");
        Ok(())
    }
}
