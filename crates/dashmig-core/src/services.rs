//! Backing service lifecycle.
//!
//! Grafana and Perses run as containers addressed by their published host
//! port. Readiness is a fixed blind wait after launch, not a health poll.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// A containerized service to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Port the service listens on inside the container.
    pub container_port: u16,
}

impl ServiceSpec {
    pub fn grafana(image: impl Into<String>) -> Self {
        Self {
            name: "grafana".to_string(),
            image: image.into(),
            container_port: 3000,
        }
    }

    pub fn perses(image: impl Into<String>) -> Self {
        Self {
            name: "perses".to_string(),
            image: image.into(),
            container_port: 8080,
        }
    }
}

/// Container runtime operations, keyed by published host port.
#[async_trait]
pub trait ServiceRuntime: Send + Sync {
    /// Whether any container publishes `host_port`.
    async fn is_running(&self, host_port: u16) -> Result<bool>;

    /// Launch `spec` in the background, publishing `host_port`.
    async fn start(&self, spec: &ServiceSpec, host_port: u16) -> Result<()>;

    /// Remove whatever container publishes `host_port`.
    ///
    /// Returns false when nothing was running.
    async fn remove(&self, host_port: u16) -> Result<bool>;
}

/// Ensure `spec` is running on `host_port`, starting it when needed.
///
/// A freshly started service gets `wait` to come up. A container already
/// publishing the port is reused as is.
pub async fn ensure_service<R: ServiceRuntime + ?Sized>(
    runtime: &R,
    spec: &ServiceSpec,
    host_port: u16,
    wait: Duration,
) -> Result<()> {
    if runtime.is_running(host_port).await? {
        info!("{} already running on port {}", spec.name, host_port);
        return Ok(());
    }

    info!("Starting {} container on port {}...", spec.name, host_port);
    runtime.start(spec, host_port).await?;

    info!("Waiting {:?} for {} to start...", wait, spec.name);
    tokio::time::sleep(wait).await;

    info!("{} container ready on port {}", spec.name, host_port);
    Ok(())
}

/// Remove the services on `ports`, logging failures instead of returning them.
pub async fn teardown_services<R: ServiceRuntime + ?Sized>(runtime: &R, ports: &[(&str, u16)]) {
    for (name, port) in ports {
        match runtime.remove(*port).await {
            Ok(true) => info!("{} container deleted successfully", name),
            Ok(false) => info!("No {} container found on port {}", name, port),
            Err(e) => warn!("Failed to delete {} container: {}", name, e),
        }
    }
}
