//! `daprkit run` — Start the sidecar with Docker and stop it on Ctrl-C.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Args;
use daprkit_runtime::DaprSidecar;
use daprkit_runtime::backend::detect_backend;

use crate::manifest::ManifestArgs;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if Docker is unavailable, startup fails, or shutdown
/// fails.
pub fn execute(args: &RunArgs) -> anyhow::Result<()> {
    let total_start = Instant::now();
    let manifest = args.manifest.load()?;

    let runtime = detect_backend();
    if !runtime.is_available() {
        anyhow::bail!("docker CLI not found on PATH; install Docker to run a sidecar");
    }

    let mut sidecar = manifest.builder().runtime(runtime).build()?;
    if let Err(e) = sidecar.start() {
        cleanup_after_failed_start(&mut sidecar);
        return Err(e.into());
    }
    report(&sidecar, total_start);
    wait_for_shutdown(&mut sidecar)
}

/// Stops whatever did start; a cleanup failure is logged, the startup
/// error stays the one reported.
fn cleanup_after_failed_start(sidecar: &mut DaprSidecar) {
    if let Err(stop_err) = sidecar.stop() {
        tracing::warn!(error = %stop_err, state = %sidecar.state(), "cleanup after failed start did not complete");
    }
}

fn report(sidecar: &DaprSidecar, total_start: Instant) {
    eprintln!();
    eprintln!(
        "  {GREEN}{BOLD}Sidecar running{RESET} for {BOLD}{}{RESET} in {:.1}s",
        sidecar.config().app_id,
        total_start.elapsed().as_secs_f64()
    );
    for file in sidecar.staged_files() {
        eprintln!("    {GREEN}●{RESET} {}", file.path);
    }
    if let Some(id) = sidecar.auxiliary_id() {
        eprintln!("    {DIM}auxiliary container {id}{RESET}");
    }
    match sidecar.grpc_endpoint() {
        Ok(endpoint) => eprintln!("  {CYAN}gRPC at:{RESET} {BOLD}{endpoint}{RESET}"),
        Err(e) => tracing::warn!(error = %e, "control port is not published"),
    }
}

fn wait_for_shutdown(sidecar: &mut DaprSidecar) -> anyhow::Result<()> {
    eprintln!();
    eprintln!("  Press {BOLD}Ctrl+C{RESET} to stop the sidecar...");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(250));
    }

    eprintln!();
    eprintln!("  Stopping sidecar...");
    sidecar.stop()?;
    eprintln!("  {GREEN}Sidecar stopped.{RESET}");
    Ok(())
}
