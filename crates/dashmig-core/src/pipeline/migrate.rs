//! Format migration of exported dashboards into the target schema.

use super::datasource::strip_datasource_identity;
use super::discovery::{discover_dashboards, DiscoveredFile};
use super::summary::StageOutcome;
use crate::error::{MigrateError, Result};
use crate::target::FormatMigrator;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for the migration stage.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Strip datasource names so dashboards use the default datasource.
    pub use_default_datasource: bool,
    /// Only migrate these files. `None` migrates everything found on disk.
    pub only: Option<HashSet<PathBuf>>,
}

/// Reject empty or non-JSON tool output.
pub fn check_migrated_output(output: &[u8]) -> Result<()> {
    if output.iter().all(u8::is_ascii_whitespace) {
        return Err(MigrateError::InvalidDocument {
            message: "migration tool produced no output".to_string(),
        });
    }
    serde_json::from_slice::<serde::de::IgnoredAny>(output).map_err(|e| {
        MigrateError::InvalidDocument {
            message: format!("migration tool output is not JSON: {}", e),
        }
    })?;
    Ok(())
}

/// Apply datasource normalization, falling back to the raw output on failure.
pub fn normalize_references(output: Vec<u8>, name: &str, enabled: bool) -> Vec<u8> {
    if !enabled {
        return output;
    }
    match strip_datasource_identity(&output) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            warn!("Failed to clean datasource references in {}: {}", name, e);
            output
        }
    }
}

/// Migrate one exported file into `migrated_root`, mirroring its relative path.
pub async fn migrate_file<M: FormatMigrator + ?Sized>(
    migrator: &M,
    file: &DiscoveredFile,
    migrated_root: &Path,
    use_default_datasource: bool,
) -> Result<PathBuf> {
    let output_path = migrated_root.join(&file.relative_path);
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MigrateError::io_with_path(e, parent))?;
    }

    let output = migrator.migrate(&file.path).await?;
    check_migrated_output(&output)?;
    let output = normalize_references(output, &file.display_name(), use_default_datasource);

    tokio::fs::write(&output_path, output)
        .await
        .map_err(|e| MigrateError::io_with_path(e, &output_path))?;
    Ok(output_path)
}

/// Run the migration stage over every JSON file under `schema_root`.
///
/// The file list is re-discovered from disk. Failing to read `schema_root` is
/// returned as an error; per-file failures are recorded in `outcome`.
pub async fn run_migration<M: FormatMigrator + ?Sized>(
    migrator: &M,
    schema_root: &Path,
    migrated_root: &Path,
    options: &MigrationOptions,
    outcome: &mut StageOutcome,
) -> Result<Vec<PathBuf>> {
    if !schema_root.exists() {
        warn!(
            "No exported dashboards at {}, nothing to migrate",
            schema_root.display()
        );
        return Ok(Vec::new());
    }

    let mut files = discover_dashboards(schema_root, true)?;
    if let Some(only) = &options.only {
        let before = files.len();
        files.retain(|f| only.contains(&f.path));
        if files.len() != before {
            debug!(
                "Skipping {} files exported by earlier runs",
                before - files.len()
            );
        }
    }

    if files.is_empty() {
        warn!("No JSON files found in {}", schema_root.display());
        return Ok(Vec::new());
    }

    info!("Found {} Grafana dashboards to migrate to Perses", files.len());
    if options.use_default_datasource {
        info!("Datasource strategy: removing datasource names to use the default Perses datasource");
    } else {
        info!("Datasource strategy: preserving original datasource names");
    }

    let total = files.len();
    let mut migrated = Vec::with_capacity(total);
    for (i, file) in files.iter().enumerate() {
        info!(
            "  [{}/{}] Migrating: {}",
            i + 1,
            total,
            file.relative_path.display()
        );

        match migrate_file(migrator, file, migrated_root, options.use_default_datasource).await {
            Ok(path) => {
                info!("    -> Successfully migrated to: {}", file.relative_path.display());
                outcome.record_success();
                migrated.push(path);
            }
            Err(e) => {
                warn!("Failed to migrate {}: {}", file.display_name(), e);
                outcome.record_failure(file.display_name());
            }
        }
    }

    info!(
        "Successfully migrated {}/{} dashboards to Perses",
        migrated.len(),
        total
    );
    Ok(migrated)
}
