//! Schema normalization through the source tool's import API.

use super::discovery::DiscoveredFile;
use super::summary::StageOutcome;
use crate::error::{MigrateError, Result};
use crate::source::{DashboardSource, ImportedDashboard};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Identity fields the source tool assigns; never sent back on import.
pub const IDENTITY_FIELDS: &[&str] = &["id", "uid"];

/// A dashboard successfully imported into the source tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardInfo {
    /// Identifier assigned by this run's import.
    pub uid: String,
    /// Location of the original file relative to the input root.
    pub relative_path: PathBuf,
}

/// Parse a dashboard file into a JSON object.
pub fn parse_dashboard(bytes: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(MigrateError::InvalidDocument {
            message: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
        Err(e) => Err(MigrateError::Json {
            message: format!("Failed to parse dashboard JSON: {}", e),
            source: Some(e),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Remove the tool-assigned identity fields from a dashboard.
pub fn strip_identity(dashboard: &mut Map<String, Value>) {
    for field in IDENTITY_FIELDS {
        dashboard.remove(*field);
    }
}

/// Import one dashboard file so the source tool migrates it to its latest schema.
pub async fn normalize_file<S: DashboardSource + ?Sized>(
    source: &S,
    path: &Path,
) -> Result<ImportedDashboard> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| MigrateError::io_with_path(e, path))?;
    let mut dashboard = parse_dashboard(&bytes)?;

    info!(
        "  -> Dashboard title: {}, original ID: {}, original UID: {}",
        display_field(&dashboard, "title"),
        display_field(&dashboard, "id"),
        display_field(&dashboard, "uid"),
    );

    strip_identity(&mut dashboard);
    let imported = source.import(&dashboard).await?;

    info!(
        "  -> Imported dashboard: ID={}, UID={}",
        imported.id, imported.uid
    );
    Ok(imported)
}

fn display_field(dashboard: &Map<String, Value>, field: &str) -> String {
    match dashboard.get(field) {
        None | Some(Value::Null) => "<none>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Run the schema-update stage over every discovered file.
///
/// Each file gets one import attempt. Failures are recorded under the file's
/// base name and the file is left out of the returned list.
pub async fn run_schema_update<S: DashboardSource + ?Sized>(
    source: &S,
    files: &[DiscoveredFile],
    outcome: &mut StageOutcome,
) -> Vec<DashboardInfo> {
    info!("Updating schemas for {} dashboards...", files.len());

    let mut dashboards = Vec::with_capacity(files.len());
    for file in files {
        let name = file.display_name();
        info!("Importing: {}", file.relative_path.display());

        match normalize_file(source, &file.path).await {
            Ok(imported) => {
                info!("Successfully imported: {}", name);
                outcome.record_success();
                dashboards.push(DashboardInfo {
                    uid: imported.uid,
                    relative_path: file.relative_path.clone(),
                });
            }
            Err(e) => {
                warn!("Failed to import {}: {}", name, e);
                outcome.record_failure(name);
            }
        }
    }

    dashboards
}
