//! Container runtime backed by the `docker` command-line client.

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use daprkit_common::error::{DaprkitError, Result};
use daprkit_common::types::{ContainerId, NetworkIdentity};
use serde::Deserialize;

use super::{ContainerConfig, ContainerRuntime, NetworkMode};

/// Label carrying the container's role.
const ROLE_LABEL: &str = "io.daprkit.role";

/// Backend that shells out to the Docker CLI.
///
/// Files are transferred by streaming a tar archive into `docker cp`, which
/// works on created containers that have not been started yet.
#[derive(Debug, Clone)]
pub struct DockerCliBackend {
    binary: PathBuf,
}

impl DockerCliBackend {
    /// Creates a backend using the `docker` binary found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        let binary = which::which("docker").unwrap_or_else(|_| PathBuf::from("docker"));
        Self { binary }
    }

    /// Creates a backend using an explicit client binary.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, operation: &'static str, args: &[String], stdin: Option<&[u8]>) -> Result<String> {
        tracing::debug!(operation, ?args, "invoking docker");
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DaprkitError::Runtime {
                operation,
                message: format!("failed to spawn {}: {e}", self.binary.display()),
            })?;

        if let Some(bytes) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(bytes).map_err(|e| DaprkitError::Runtime {
                    operation,
                    message: format!("failed to write to docker stdin: {e}"),
                })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| DaprkitError::Runtime {
            operation,
            message: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(DaprkitError::Runtime {
                operation,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for DockerCliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for DockerCliBackend {
    fn create(&self, config: &ContainerConfig) -> Result<ContainerId> {
        let id = self.run("create", &create_args(config), None)?;
        if id.is_empty() {
            return Err(DaprkitError::Runtime {
                operation: "create",
                message: "docker returned no container id".to_string(),
            });
        }
        tracing::info!(id = %id, name = %config.name, image = %config.image, "container created");
        Ok(ContainerId::new(id))
    }

    fn copy_file(&self, id: &ContainerId, path: &str, contents: &[u8]) -> Result<()> {
        let archive = single_file_archive(path, contents)?;
        let args = vec!["cp".to_string(), "-".to_string(), format!("{id}:/")];
        let _ = self.run("copy", &args, Some(&archive))?;
        tracing::debug!(id = %id, path, "file copied into container");
        Ok(())
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        let _ = self
            .run("start", &["start".to_string(), id.to_string()], None)
            .map_err(|e| DaprkitError::ContainerStart {
                container: id.to_string(),
                message: e.to_string(),
            })?;
        tracing::info!(id = %id, "container started");
        Ok(())
    }

    fn network_identity(&self, id: &ContainerId) -> Result<NetworkIdentity> {
        let json = self.run("inspect", &["inspect".to_string(), id.to_string()], None)?;
        parse_inspect(&json)
    }

    fn host_port(&self, id: &ContainerId, port: u16) -> Result<Option<u16>> {
        let args = vec!["port".to_string(), id.to_string(), format!("{port}/tcp")];
        let output = self.run("port", &args, None)?;
        Ok(parse_port_output(&output))
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        let _ = self.run("stop", &["stop".to_string(), id.to_string()], None)?;
        tracing::info!(id = %id, "container stopped");
        Ok(())
    }

    fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }
}

/// Builds the `docker create` argument list.
fn create_args(config: &ContainerConfig) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--label".to_string(),
        format!("{ROLE_LABEL}={}", config.name),
    ];
    match &config.network_mode {
        NetworkMode::Default => {
            for port in &config.exposed_ports {
                args.push("-p".to_string());
                args.push(port.to_string());
            }
        }
        NetworkMode::Container(owner) => {
            args.push("--network".to_string());
            args.push(format!("container:{owner}"));
        }
    }
    args.push(config.image.clone());
    args.extend(config.command.iter().cloned());
    args
}

/// Packs one file, with its parent directories, into a tar archive rooted
/// at `/`.
fn single_file_archive(path: &str, contents: &[u8]) -> Result<Vec<u8>> {
    let relative = Path::new(path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>();
    if relative.as_os_str().is_empty() {
        return Err(DaprkitError::Staging {
            path: path.to_string(),
            message: "destination path is empty".to_string(),
        });
    }
    let archive_err = |e: std::io::Error| DaprkitError::Staging {
        path: path.to_string(),
        message: e.to_string(),
    };

    let mut builder = tar::Builder::new(Vec::new());
    let mut parents: Vec<&Path> = relative.ancestors().skip(1).collect();
    parents.reverse();
    for dir in parents.into_iter().filter(|d| !d.as_os_str().is_empty()) {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        builder
            .append_data(&mut header, dir, std::io::empty())
            .map_err(archive_err)?;
    }

    let mut header = tar::Header::new_gnu();
    header.set_mode(0o644);
    header.set_size(contents.len() as u64);
    builder
        .append_data(&mut header, &relative, contents)
        .map_err(archive_err)?;
    builder.into_inner().map_err(archive_err)
}

#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "State")]
    state: InspectState,
}

#[derive(Debug, Deserialize)]
struct InspectState {
    #[serde(rename = "Running")]
    running: bool,
}

/// Extracts the identity of a running container from `docker inspect`.
fn parse_inspect(json: &str) -> Result<NetworkIdentity> {
    let entries: Vec<InspectEntry> =
        serde_json::from_str(json).map_err(|e| DaprkitError::Runtime {
            operation: "inspect",
            message: format!("unexpected inspect output: {e}"),
        })?;
    let entry = entries.into_iter().next().ok_or_else(|| DaprkitError::NotFound {
        kind: "container",
        id: "inspect returned no entries".to_string(),
    })?;
    if !entry.state.running {
        return Err(DaprkitError::Runtime {
            operation: "inspect",
            message: format!("container {} is not running", entry.id),
        });
    }
    Ok(NetworkIdentity::new(entry.id))
}

/// Parses the first `host:port` line printed by `docker port`.
fn parse_port_output(output: &str) -> Option<u16> {
    output
        .lines()
        .find_map(|line| line.trim().rsplit_once(':')?.1.parse().ok())
}
