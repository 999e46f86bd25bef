//! Datasource reference normalization for migrated Perses dashboards.
//!
//! `percli migrate` keeps the Grafana datasource name in every query, but
//! named datasources only exist in the source deployment. Dropping the name
//! makes each query fall back to the default datasource of the same kind.

use crate::error::Result;
use serde_json::{Map, Value};
use tracing::debug;

/// Fields removed from a query's datasource selector.
const IDENTITY_FIELDS: &[&str] = &["name", "default"];

/// Strip datasource identity from every panel query of a Perses dashboard.
///
/// Returns the re-serialized document. Documents without panels or queries
/// come back with the same content.
pub fn strip_datasource_identity(document: &[u8]) -> Result<Vec<u8>> {
    let mut dashboard: Value = serde_json::from_slice(document)?;

    let mut stripped = 0usize;
    if let Some(panels) = dashboard
        .pointer_mut("/spec/panels")
        .and_then(Value::as_object_mut)
    {
        for panel in panels.values_mut() {
            let Some(queries) = panel
                .pointer_mut("/spec/queries")
                .and_then(Value::as_array_mut)
            else {
                continue;
            };
            for query in queries {
                if let Some(datasource) = query
                    .pointer_mut("/spec/plugin/spec/datasource")
                    .and_then(Value::as_object_mut)
                {
                    clean_datasource(datasource);
                    stripped += 1;
                }
            }
        }
    }

    debug!("Stripped datasource identity from {} queries", stripped);
    let mut out = serde_json::to_vec_pretty(&dashboard)?;
    out.push(b'\n');
    Ok(out)
}

fn clean_datasource(datasource: &mut Map<String, Value>) {
    for field in IDENTITY_FIELDS {
        datasource.remove(*field);
    }
    if let Some(plugin) = datasource.get_mut("plugin").and_then(Value::as_object_mut) {
        plugin.remove("spec");
    }
}
