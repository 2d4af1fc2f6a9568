//! `daprkit render` — Render component documents, defaults included.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use daprkit_component::{ConfigMaterializer, DirectoryStager, StagedFile};

use crate::manifest::ManifestArgs;

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Write one file per component into this directory instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `render` command.
///
/// # Errors
///
/// Returns an error if the manifest is invalid or a document cannot be
/// written.
pub fn execute(args: &RenderArgs) -> anyhow::Result<()> {
    let manifest = args.manifest.load()?;
    let (registry, outcome) = manifest.finalize()?;
    let materializer = ConfigMaterializer::new(manifest.sidecar.components_path.clone());
    tracing::info!(injected = ?outcome.injected, "rendering components");

    if let Some(dir) = &args.output {
        let mut stager = DirectoryStager::new(dir);
        let staged = materializer.materialize(registry.all()?, &mut stager)?;
        println!("Rendered {} component(s) into {}", staged.len(), dir.display());
    } else {
        let mut staged: Vec<StagedFile> = Vec::new();
        let _ = materializer.materialize(registry.all()?, &mut staged)?;
        print!("{}", document_stream(&staged));
    }
    Ok(())
}

/// Joins staged documents into one multi-document YAML stream.
fn document_stream(files: &[StagedFile]) -> String {
    let mut out = String::new();
    for file in files {
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "# {}", file.path);
        out.push_str(&String::from_utf8_lossy(&file.contents));
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde::Deserialize;

    use super::*;

    #[test]
    fn render_writes_documents_into_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("daprkit.yaml");
        std::fs::write(
            &manifest,
            "app_id: orders-service\ncomponents:\n  - name: cache\n    type: state.redis\n",
        )
        .unwrap();
        let out = dir.path().join("components");
        let args = RenderArgs {
            manifest: ManifestArgs {
                file: manifest,
                app_id: None,
            },
            output: Some(out.clone()),
        };

        execute(&args).unwrap();

        assert!(out.join("cache.yaml").exists());
        let store = std::fs::read_to_string(out.join("statestore.yaml")).unwrap();
        assert!(store.contains("state.in-memory"));
    }

    #[test]
    fn document_stream_separates_documents() {
        let files = vec![
            StagedFile {
                path: "/components/a.yaml".into(),
                contents: b"kind: Component\n".to_vec(),
            },
            StagedFile {
                path: "/components/b.yaml".into(),
                contents: b"kind: Component\n".to_vec(),
            },
        ];
        let stream = document_stream(&files);
        assert_eq!(stream.matches("---\n").count(), 2);
        assert!(stream.contains("# /components/b.yaml\n"));
        let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&stream)
            .map(|d| serde_yaml::Value::deserialize(d).unwrap())
            .collect();
        assert_eq!(docs.len(), 2);
    }
}
