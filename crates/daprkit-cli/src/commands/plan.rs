//! `daprkit plan` — Show what starting the sidecar would do.

use std::fmt::Write as _;

use clap::Args;
use daprkit_component::{ComponentRegistry, ConfigMaterializer, DefaultsOutcome};

use crate::manifest::{Manifest, ManifestArgs};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

/// Executes the `plan` command.
///
/// Registers the manifest's components, applies defaults, and prints the
/// sidecar launch, the staged documents, and the auxiliary container.
///
/// # Errors
///
/// Returns an error if the manifest is invalid.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let manifest = args.manifest.load()?;
    let (registry, outcome) = manifest.finalize()?;
    print!("{}", plan_text(&manifest, &registry, &outcome)?);
    Ok(())
}

fn plan_text(
    manifest: &Manifest,
    registry: &ComponentRegistry,
    outcome: &DefaultsOutcome,
) -> anyhow::Result<String> {
    let config = &manifest.sidecar;
    let materializer = ConfigMaterializer::new(config.components_path.clone());
    let mut out = String::new();

    writeln!(out, "Sidecar plan for: {}", config.app_id)?;
    writeln!(out)?;
    writeln!(out, "  image:   {}", config.image)?;
    writeln!(out, "  command: {}", config.launch_args().join(" "))?;
    writeln!(out, "  port:    {}", config.control_port)?;
    writeln!(out)?;
    writeln!(out, "  Components:")?;
    for spec in registry.all()? {
        let marker = if outcome.injected.iter().any(|n| n == spec.name()) {
            " (default)"
        } else {
            ""
        };
        writeln!(
            out,
            "    + {} [{}] -> {}{marker}",
            spec.name(),
            spec.component_type(),
            materializer.destination(spec.name())
        )?;
    }
    writeln!(out)?;
    if outcome.requires_auxiliary {
        writeln!(
            out,
            "  Auxiliary: {} (joins the sidecar's network namespace)",
            config.auxiliary_image
        )?;
    } else {
        writeln!(out, "  Auxiliary: none")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn plan_marks_injected_defaults() {
        let manifest = Manifest::parse("app_id: orders-service\n").unwrap();
        let (registry, outcome) = manifest.finalize().unwrap();
        let text = plan_text(&manifest, &registry, &outcome).unwrap();
        assert!(text.contains("daprd -app-id orders-service --dapr-listen-addresses=0.0.0.0 -components-path /components"));
        assert!(text.contains("+ statestore [state.in-memory] -> /components/statestore.yaml (default)"));
        assert!(text.contains("Auxiliary: none"));
    }

    #[test]
    fn plan_lists_auxiliary_for_networked_default() {
        let manifest =
            Manifest::parse("app_id: orders-service\ndefaults:\n  state_backend: networked\n").unwrap();
        let (registry, outcome) = manifest.finalize().unwrap();
        let text = plan_text(&manifest, &registry, &outcome).unwrap();
        assert!(text.contains("Auxiliary: redis:6-alpine"));
    }
}
