//! Docker-backed service runtime.
//!
//! Containers are found by the host port they publish, so a container started
//! by an earlier run (or by hand) on the same port is reused.

use async_trait::async_trait;
use dashmig_core::{MigrateError, Result, ServiceRuntime, ServiceSpec};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// [`ServiceRuntime`] implemented with the `docker` CLI.
pub struct DockerRuntime {
    docker: PathBuf,
}

impl DockerRuntime {
    /// Use `docker` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Use a specific docker-compatible CLI (e.g. `podman`).
    pub fn with_binary(docker: impl Into<PathBuf>) -> Self {
        Self {
            docker: docker.into(),
        }
    }

    async fn run<I, S>(&self, service: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        debug!("Running {} {:?}", self.docker.display(), args);

        let output = Command::new(&self.docker)
            .args(&args)
            .output()
            .await
            .map_err(|e| MigrateError::ServiceFailed {
                service: service.to_string(),
                message: format!("failed to run {}: {}", self.docker.display(), e),
            })?;

        if !output.status.success() {
            return Err(MigrateError::ServiceFailed {
                service: service.to_string(),
                message: format!(
                    "{} {:?} exited with {}: {}",
                    self.docker.display(),
                    args,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(output)
    }

    async fn container_ids(&self, host_port: u16) -> Result<Vec<String>> {
        let output = self
            .run(&format!("port {}", host_port), ps_args(host_port))
            .await?;
        Ok(parse_container_ids(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments listing containers that publish `host_port`.
pub fn ps_args(host_port: u16) -> Vec<String> {
    vec![
        "ps".to_string(),
        "--filter".to_string(),
        format!("publish={}", host_port),
        "--format".to_string(),
        "{{.ID}}".to_string(),
    ]
}

/// Arguments launching `spec` detached on `host_port`.
pub fn run_args(spec: &ServiceSpec, host_port: u16) -> Vec<String> {
    vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        spec.name.clone(),
        "-p".to_string(),
        format!("{}:{}", host_port, spec.container_port),
        spec.image.clone(),
    ]
}

/// One container id per non-empty line of `docker ps` output.
pub fn parse_container_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ServiceRuntime for DockerRuntime {
    async fn is_running(&self, host_port: u16) -> Result<bool> {
        Ok(!self.container_ids(host_port).await?.is_empty())
    }

    async fn start(&self, spec: &ServiceSpec, host_port: u16) -> Result<()> {
        let output = self.run(&spec.name, run_args(spec, host_port)).await?;
        debug!(
            "Started {} container {}",
            spec.name,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    async fn remove(&self, host_port: u16) -> Result<bool> {
        let ids = self.container_ids(host_port).await?;
        if ids.is_empty() {
            return Ok(false);
        }
        for id in &ids {
            self.run(&format!("container {}", id), ["rm", "-f", id.as_str()])
                .await?;
        }
        Ok(true)
    }
}
