//! Structured one-line fields embedded in issue descriptions.
//!
//! The description is the durable store for integration-branch metadata:
//! it survives issue-store backups, exports, and cross-instance sync.
//! Fields are `key: value` lines, matched case-insensitively; everything
//! else in the description is preserved verbatim and in order.

use super::Issue;

pub const INTEGRATION_BRANCH_FIELD: &str = "integration_branch";
pub const BASE_BRANCH_FIELD: &str = "base_branch";

/// Trimmed value of the first `key: value` line, or empty when absent.
pub fn get_description_field(description: &str, key: &str) -> String {
    let prefix = format!("{key}:");
    for line in description.lines() {
        let trimmed = line.trim_start();
        if let Some(head) = trimmed.get(..prefix.len())
            && head.eq_ignore_ascii_case(&prefix)
        {
            return trimmed[prefix.len()..].trim().to_string();
        }
    }
    String::new()
}

/// Add or replace a `key: value` field.
///
/// Any prior line carrying the key (anywhere in the description) is removed,
/// then the field is prepended on its own line. Idempotent for an unchanged
/// value.
pub fn add_description_field(description: &str, key: &str, value: &str) -> String {
    let prefix = format!("{key}:");
    let kept: Vec<&str> = description
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
        })
        .collect();

    let field_line = format!("{key}: {value}");
    if kept.is_empty() {
        field_line
    } else {
        format!("{field_line}\n{}", kept.join("\n"))
    }
}

pub fn get_integration_branch_field(description: &str) -> String {
    get_description_field(description, INTEGRATION_BRANCH_FIELD)
}

pub fn add_integration_branch_field(description: &str, branch: &str) -> String {
    add_description_field(description, INTEGRATION_BRANCH_FIELD, branch)
}

pub fn get_base_branch_field(description: &str) -> String {
    get_description_field(description, BASE_BRANCH_FIELD)
}

pub fn add_base_branch_field(description: &str, base_branch: &str) -> String {
    add_description_field(description, BASE_BRANCH_FIELD, base_branch)
}

/// The branch/target fields an MR carries in its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrFields {
    pub branch: String,
    pub target: String,
}

/// Parse MR fields out of an issue's description. Returns None when the
/// description carries neither a `branch:` nor a `target:` line, which
/// means the issue is not a well-formed MR regardless of its labels.
pub fn parse_mr_fields(issue: &Issue) -> Option<MrFields> {
    let branch = get_description_field(&issue.description, "branch");
    let target = get_description_field(&issue.description, "target");
    if branch.is_empty() && target.is_empty() {
        return None;
    }
    Some(MrFields { branch, target })
}
