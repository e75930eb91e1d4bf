use schemars::schema_for;

use crate::config::RigSettings;

/// Print the JSON Schema for `settings/config.json` to stdout.
pub fn run_schema() -> anyhow::Result<()> {
    let schema = schema_for!(RigSettings);
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{json}");
    Ok(())
}
