mod beads;
mod branch;
mod commands;
mod config;
mod error;
mod git;
mod rig;
mod subprocess;
mod telemetry;
mod worktree;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::create::CreateArgs;
use commands::land::LandArgs;
use commands::patrol::PatrolArgs;
use commands::resolve::ResolveArgs;
use commands::status::StatusArgs;

#[derive(Debug, Parser)]
#[command(
    name = "gt",
    version,
    about = "Merge queue with integration branches for Gas Town rigs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an integration branch for an epic
    Create(CreateArgs),
    /// Show an epic's integration branch readiness
    Status(StatusArgs),
    /// Merge an epic's integration branch back to its base
    Land(LandArgs),
    /// Print the integration branch an issue's MR should target
    Resolve(ResolveArgs),
    /// Run one refinery patrol tick (auto-land eligible epics)
    Patrol(PatrolArgs),
    /// Print the JSON Schema for rig settings
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Status(_) => "status",
            Self::Land(_) => "land",
            Self::Resolve(_) => "resolve",
            Self::Patrol(_) => "patrol",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Create(args) => args.execute(),
        Commands::Status(args) => args.execute(),
        Commands::Land(args) => args.execute(),
        Commands::Resolve(args) => args.execute(),
        Commands::Patrol(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(land_err) = e.downcast_ref::<error::LandError>() {
                eprintln!("error: {land_err}");
                land_err.exit_code()
            } else if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
