//! dashmig core - bulk migration of Grafana dashboards to Perses.
//!
//! Dashboards are imported into a Grafana instance (which upgrades them to
//! its latest schema), exported back out, and converted with `percli
//! migrate`. External systems sit behind three traits so the pipeline can
//! run against fakes:
//!
//! - [`DashboardSource`] - the Grafana HTTP API ([`GrafanaClient`])
//! - [`TargetTool`] / [`FormatMigrator`] - the Perses CLI
//! - [`ServiceRuntime`] - the container runtime hosting both services
//!
//! # Example
//!
//! ```rust,ignore
//! use dashmig_core::{GrafanaClient, MigrationConfig, MigrationRun};
//!
//! let config = MigrationConfig::builder("/data/dashboards").recursive(true).build()?;
//! let grafana = GrafanaClient::from_config(&config)?;
//! let report = MigrationRun::new(&config, &docker, &grafana, &percli).execute().await?;
//! println!("{}", report.summary);
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod run;
pub mod services;
pub mod source;
pub mod target;

pub use config::{MigrationConfig, MigrationConfigBuilder};
pub use error::{MigrateError, Result};
pub use pipeline::{DashboardInfo, DiscoveredFile, MigrationSummary, StageOutcome};
pub use run::{MigrationRun, RunReport};
pub use services::{ServiceRuntime, ServiceSpec};
pub use source::{DashboardSource, GrafanaClient, ImportedDashboard};
pub use target::{FormatMigrator, TargetTool};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
