//! End-to-end migration run.

use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};
use crate::pipeline::naming::timestamp_suffix;
use crate::pipeline::{
    discover_dashboards_excluding, run_export, run_migration, run_schema_update, DiscoveredFile,
    MigrationOptions, MigrationSummary,
};
use crate::services::{ensure_service, teardown_services, ServiceRuntime, ServiceSpec};
use crate::source::DashboardSource;
use crate::target::TargetTool;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: MigrationSummary,
    /// Root of the schema-updated Grafana dashboards.
    pub schema_dir: PathBuf,
    /// Root of the Perses dashboards.
    pub migrated_dir: PathBuf,
}

/// One batch migration: discovery, provisioning, the three stages, teardown.
pub struct MigrationRun<'a> {
    config: &'a MigrationConfig,
    runtime: &'a dyn ServiceRuntime,
    source: &'a dyn DashboardSource,
    target: &'a dyn TargetTool,
}

impl<'a> MigrationRun<'a> {
    pub fn new(
        config: &'a MigrationConfig,
        runtime: &'a dyn ServiceRuntime,
        source: &'a dyn DashboardSource,
        target: &'a dyn TargetTool,
    ) -> Self {
        Self {
            config,
            runtime,
            source,
            target,
        }
    }

    /// Discover input dashboards. An empty input set is fatal.
    pub fn discover(&self) -> Result<Vec<DiscoveredFile>> {
        let (root, exclude) = discovery_roots(&self.config.input_dir, &self.config.output_dir);
        let files = discover_dashboards_excluding(&root, self.config.recursive, Some(&exclude))
            .map_err(|e| {
                MigrateError::Other(format!(
                    "Failed to find JSON files in {}: {}",
                    self.config.input_dir.display(),
                    e
                ))
            })?;

        if files.is_empty() {
            return Err(MigrateError::NoInputFiles(self.config.input_dir.clone()));
        }
        Ok(files)
    }

    /// Execute the whole run.
    ///
    /// Services are torn down when `cleanup` is set, also when a later step
    /// aborts the run.
    pub async fn execute(&self) -> Result<RunReport> {
        let files = self.discover()?;
        info!("Found {} dashboards to migrate", files.len());

        let result = match self.provision().await {
            Ok(()) => self.run_stages(&files).await,
            Err(e) => Err(e),
        };

        if self.config.cleanup {
            teardown_services(
                self.runtime,
                &[
                    ("Grafana", self.config.grafana_port),
                    ("Perses", self.config.perses_port),
                ],
            )
            .await;
        }

        result
    }

    async fn provision(&self) -> Result<()> {
        let config = self.config;
        ensure_service(
            self.runtime,
            &ServiceSpec::grafana(&config.grafana_image),
            config.grafana_port,
            config.startup_wait,
        )
        .await?;
        ensure_service(
            self.runtime,
            &ServiceSpec::perses(&config.perses_image),
            config.perses_port,
            config.startup_wait,
        )
        .await
    }

    async fn run_stages(&self, files: &[DiscoveredFile]) -> Result<RunReport> {
        let config = self.config;
        let schema_dir = config.schema_output_dir();
        let migrated_dir = config.migrated_output_dir();
        let mut summary = MigrationSummary::new(files.len());

        let dashboards = run_schema_update(self.source, files, &mut summary.schema_update).await;
        info!("Schema update completed");

        let timestamp = timestamp_suffix(&Local::now());
        let exported = run_export(
            self.source,
            &dashboards,
            &schema_dir,
            &timestamp,
            &mut summary.export,
        )
        .await;

        info!("Setting up Perses migration tools...");
        self.target.prepare(&config.perses_base_url()).await?;

        info!("Migrating Grafana dashboards to Perses schema format...");
        let options = MigrationOptions {
            use_default_datasource: config.use_default_datasource,
            only: Some(exported.into_iter().collect()),
        };
        if let Err(e) = run_migration(
            self.target,
            &schema_dir,
            &migrated_dir,
            &options,
            &mut summary.migration,
        )
        .await
        {
            warn!("Failed to migrate dashboards to Perses: {}", e);
        }

        Ok(RunReport {
            summary,
            schema_dir,
            migrated_dir,
        })
    }
}

/// Canonical input root and output root, so the output tree can be excluded
/// from discovery however the paths were spelled.
fn discovery_roots(input_dir: &Path, output_dir: &Path) -> (PathBuf, PathBuf) {
    let root = input_dir
        .canonicalize()
        .unwrap_or_else(|_| input_dir.to_path_buf());
    let exclude = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());
    (root, exclude)
}
