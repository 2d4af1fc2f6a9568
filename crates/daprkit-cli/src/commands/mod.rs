//! CLI command definitions and dispatch.

pub mod plan;
pub mod render;
pub mod run;

use clap::{Parser, Subcommand};

/// daprkit — ephemeral Dapr sidecars for integration tests.
#[derive(Parser, Debug)]
#[command(name = "daprkit", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render component documents, defaults included.
    Render(render::RenderArgs),
    /// Show what starting the sidecar would do.
    Plan(plan::PlanArgs),
    /// Start the sidecar with Docker and stop it on Ctrl-C.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Render(args) => render::execute(&args),
        Command::Plan(args) => plan::execute(&args),
        Command::Run(args) => run::execute(&args),
    }
}
