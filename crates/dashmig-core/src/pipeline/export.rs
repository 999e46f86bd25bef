//! Export of normalized dashboards from the source tool.
//!
//! The fetched envelope wraps the dashboard body in `spec` and omits the uid
//! there, while percli needs a root-level uid to name the Perses dashboard.

use super::discovery::display_name;
use super::naming::export_filename;
use super::normalize::DashboardInfo;
use super::summary::StageOutcome;
use crate::error::{MigrateError, Result};
use crate::source::DashboardSource;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Unwrap the dashboard body from a fetched envelope and inject its uid.
pub fn extract_spec(mut envelope: Value, uid: &str) -> Result<Map<String, Value>> {
    let spec = envelope
        .get_mut("spec")
        .map(Value::take)
        .ok_or_else(|| MigrateError::missing("spec", "dashboard response"))?;

    let Value::Object(mut spec) = spec else {
        return Err(MigrateError::InvalidDocument {
            message: "dashboard response spec is not an object".to_string(),
        });
    };

    spec.insert("uid".to_string(), Value::String(uid.to_string()));
    Ok(spec)
}

/// Directory under `output_root` mirroring the original file's location.
pub fn mirrored_dir(output_root: &Path, relative_path: &Path) -> PathBuf {
    match relative_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => output_root.join(parent),
        _ => output_root.to_path_buf(),
    }
}

/// Pick a path for `filename` in `dir` that does not clobber an existing file.
///
/// The minute timestamp alone cannot tell apart dashboards whose titles
/// sanitize to the same slug; a numeric suffix is appended on collision.
pub fn unused_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let stem = filename.strip_suffix(".json").unwrap_or(filename);
    (2u32..)
        .map(|n| dir.join(format!("{}-{}.json", stem, n)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Fetch one dashboard and write it under `output_root`.
///
/// Returns the written path.
pub async fn export_dashboard<S: DashboardSource + ?Sized>(
    source: &S,
    dashboard: &DashboardInfo,
    output_root: &Path,
    timestamp: &str,
) -> Result<PathBuf> {
    let envelope = source.fetch(&dashboard.uid).await?;
    let spec = extract_spec(envelope, &dashboard.uid)?;

    let target_dir = mirrored_dir(output_root, &dashboard.relative_path);
    tokio::fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| MigrateError::io_with_path(e, &target_dir))?;

    let title = spec.get("title").and_then(Value::as_str);
    let filename = export_filename(title, &dashboard.uid, timestamp);
    let output_path = unused_path(&target_dir, &filename);

    let mut bytes = serde_json::to_vec_pretty(&Value::Object(spec))?;
    bytes.push(b'\n');
    tokio::fs::write(&output_path, bytes)
        .await
        .map_err(|e| MigrateError::io_with_path(e, &output_path))?;

    Ok(output_path)
}

/// Run the export stage.
///
/// Returns the paths written; failures are recorded under the base name of
/// the original file.
pub async fn run_export<S: DashboardSource + ?Sized>(
    source: &S,
    dashboards: &[DashboardInfo],
    output_root: &Path,
    timestamp: &str,
    outcome: &mut StageOutcome,
) -> Vec<PathBuf> {
    info!(
        "Exporting {} dashboards with updated schemas to {}",
        dashboards.len(),
        output_root.display()
    );

    let mut written = Vec::with_capacity(dashboards.len());
    for (i, dashboard) in dashboards.iter().enumerate() {
        info!(
            "  [{}] UID: {}, Path: {}",
            i + 1,
            dashboard.uid,
            dashboard.relative_path.display()
        );

        match export_dashboard(source, dashboard, output_root, timestamp).await {
            Ok(path) => {
                let shown = path.strip_prefix(output_root).unwrap_or(&path);
                info!("  -> Exported dashboard: {}", shown.display());
                outcome.record_success();
                written.push(path);
            }
            Err(e) => {
                warn!("Failed to export dashboard {}: {}", dashboard.uid, e);
                outcome.record_failure(display_name(&dashboard.relative_path));
            }
        }
    }

    info!("Successfully exported {} dashboards", written.len());
    written
}
