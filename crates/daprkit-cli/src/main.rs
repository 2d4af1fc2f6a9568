//! # daprkit — Dapr sidecar provisioning CLI
//!
//! Renders component documents, previews a sidecar launch, or runs a
//! sidecar against the local Docker daemon.

mod commands;
mod manifest;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
