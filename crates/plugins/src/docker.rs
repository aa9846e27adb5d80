//! Docker-backed execution of containerized tools.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::{Plugin, PluginError};

/// A host directory bound into the container
#[derive(Debug, Clone, PartialEq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: String,
}

impl Mount {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    /// The standard data-directory mount at `/data`
    pub fn data(host: impl Into<PathBuf>) -> Self {
        Self::new(host, "/data")
    }
}

/// Runs [`Plugin`] invocations through a local Docker daemon
#[derive(Debug)]
pub struct DockerRunner {
    docker_path: String,
}

impl DockerRunner {
    pub fn new() -> Result<Self, PluginError> {
        let docker_path = Self::find_docker_executable()?;
        Ok(Self { docker_path })
    }

    pub fn with_path(docker_path: impl Into<String>) -> Result<Self, PluginError> {
        let path = docker_path.into();

        if !Path::new(&path).exists() {
            return Err(PluginError::Initialization(format!(
                "Docker executable not found at: {path}"
            )));
        }

        Ok(Self { docker_path: path })
    }

    fn find_docker_executable() -> Result<String, PluginError> {
        if let Ok(output) = Command::new("which").arg("docker").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(path);
                }
            }
        }

        let common_paths = [
            "/usr/bin/docker",
            "/usr/local/bin/docker",
            "/opt/homebrew/bin/docker",
            "docker", // Fallback to PATH
        ];

        for path in &common_paths {
            if Path::new(path).exists() || *path == "docker" {
                return Ok(path.to_string());
            }
        }

        Err(PluginError::Initialization(
            "Docker executable not found. Please install Docker or specify the path.".to_string(),
        ))
    }

    /// Run a tool with the given bind mounts.
    ///
    /// Blocks until the container exits; a non-zero exit surfaces the
    /// container's stderr in the returned error.
    pub fn run(&self, mounts: &[Mount], plugin: &dyn Plugin) -> Result<(), PluginError> {
        let cmd = self.build_run_command(mounts, plugin);
        info!("Running {}", plugin.description());
        self.execute_command(cmd)
    }

    fn build_run_command(&self, mounts: &[Mount], plugin: &dyn Plugin) -> Command {
        let mut cmd = Command::new(&self.docker_path);
        cmd.arg("run");
        for mount in mounts {
            cmd.arg("-v")
                .arg(format!("{}:{}", mount.host.display(), mount.container));
        }
        cmd.arg(plugin.image()).args(plugin.args());
        cmd
    }

    fn execute_command(&self, mut cmd: Command) -> Result<(), PluginError> {
        debug!("Executing docker command: {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| PluginError::Execution(format!("Failed to execute docker: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PluginError::Execution(format!(
                "Container exited with {}: {stderr}",
                output.status
            )));
        }

        debug!("Docker command completed successfully");
        Ok(())
    }
}
