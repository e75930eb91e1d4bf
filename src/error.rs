use std::process::ExitCode;

/// Errors that cause gt to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed (exit {code}): {message}")]
    ToolFailed {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("{tool} timed out after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::ToolNotFound { .. } => ExitCode::from(3),
            ExitError::ToolFailed { .. } => ExitCode::from(4),
            ExitError::Timeout { .. } => ExitCode::from(5),
        }
    }
}

/// Fatal outcomes of the land state machine.
///
/// Each variant carries the stage's stable textual tag as its message prefix
/// so scripts can match on stderr. Cleanup-stage failures are warnings, not
/// errors, and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum LandError {
    #[error("not-an-epic: '{id}' is a {actual}, not an epic")]
    NotAnEpic { id: String, actual: String },

    #[error("branch-missing: integration branch '{branch}' does not exist (locally or on origin)")]
    BranchMissing { branch: String },

    #[error("pending-mrs: {count} open MR(s) target '{branch}' (use --force to override)")]
    PendingMrs { branch: String, count: usize },

    #[error("merge-conflict: merging 'origin/{branch}' failed: {detail}")]
    MergeConflict { branch: String, detail: String },

    #[error("tests-failed: '{command}' exited non-zero")]
    TestsFailed { command: String },

    #[error(
        "empty-merge: merge produced no file changes — integration branch work may have been \
         discarded during conflict resolution\n  Integration branch '{branch}' has NOT been deleted.\n  \
         Inspect manually: git diff {base}...origin/{branch}"
    )]
    EmptyMerge { branch: String, base: String },

    #[error("push-failed: pushing '{base}' to origin: {detail}")]
    PushFailed { base: String, detail: String },
}

impl LandError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LandError::NotAnEpic { .. } => ExitCode::from(10),
            LandError::BranchMissing { .. } => ExitCode::from(11),
            LandError::PendingMrs { .. } => ExitCode::from(12),
            LandError::MergeConflict { .. } => ExitCode::from(13),
            LandError::TestsFailed { .. } => ExitCode::from(14),
            LandError::EmptyMerge { .. } => ExitCode::from(15),
            LandError::PushFailed { .. } => ExitCode::from(16),
        }
    }
}
