//! Integration branch naming: template expansion and git-name validation.

use std::sync::OnceLock;

use regex::Regex;

/// Template applied when a rig configures none.
pub const DEFAULT_INTEGRATION_BRANCH_TEMPLATE: &str = "integration/{epic}";

/// Characters git refuses in branch names: ~ ^ : \ whitespace, plus the
/// `..` and `@{` sequences.
fn invalid_branch_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[~^:\s\\]|\.\.|@\{").expect("static pattern compiles"))
}

/// Expand a branch-name template for an epic.
///
/// Placeholders are substituted literally: `{epic}` with the epic id,
/// `{prefix}` with the id's prefix, `{user}` with the operator identity.
/// An empty template means [`DEFAULT_INTEGRATION_BRANCH_TEMPLATE`].
pub fn expand_template(template: &str, epic_id: &str, user: &str) -> String {
    let template = if template.is_empty() {
        DEFAULT_INTEGRATION_BRANCH_TEMPLATE
    } else {
        template
    };
    template
        .replace("{epic}", epic_id)
        .replace("{prefix}", extract_epic_prefix(epic_id))
        .replace("{user}", user)
}

/// Expand a template using the configured operator identity for `{user}`.
pub fn build_integration_branch_name(template: &str, epic_id: &str) -> String {
    expand_template(template, epic_id, &operator_identity())
}

/// The epic id's prefix: everything before the first `-`, or the whole id.
pub fn extract_epic_prefix(epic_id: &str) -> &str {
    epic_id.split('-').next().unwrap_or(epic_id)
}

/// Operator identity for `{user}` expansion: GASTOWN_USER, then USER.
pub fn operator_identity() -> String {
    std::env::var("GASTOWN_USER")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_default()
}

/// Check that a branch name is valid for git.
/// Returns an error naming the violated rule; create aborts before touching
/// any ref when this fails.
pub fn validate_branch_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("branch name cannot be empty");
    }

    if invalid_branch_chars().is_match(name) {
        anyhow::bail!("branch name {name:?} contains invalid characters (~ ^ : \\ space, .., or @{{)");
    }

    if name.ends_with(".lock") {
        anyhow::bail!("branch name {name:?} cannot end with .lock");
    }

    if name.starts_with('/') || name.ends_with('/') {
        anyhow::bail!("branch name {name:?} cannot start or end with /");
    }
    if name.starts_with('.') || name.ends_with('.') {
        anyhow::bail!("branch name {name:?} cannot start or end with .");
    }

    if name.contains("//") {
        anyhow::bail!("branch name {name:?} cannot contain consecutive slashes");
    }

    Ok(())
}
