//! Gastown - merge queue with integration branches for Gas Town rigs

pub mod beads;
pub mod branch;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod rig;
pub mod subprocess;
pub mod telemetry;
pub mod worktree;
