//! Tracing setup for the gt binary.
//!
//! Diagnostics go to stderr so stdout stays clean for command output
//! (`status --json`, `resolve`). Filtered by `GASTOWN_LOG`, falling back
//! to `RUST_LOG`, then `warn`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_env("GASTOWN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // try_init so tests that pull in the library can't panic on double-init
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
