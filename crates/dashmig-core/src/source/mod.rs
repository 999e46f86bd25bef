//! Source dashboard service.
//!
//! The pipeline only needs two operations from the source tool: import a
//! document (getting fresh identifiers back) and fetch the normalized form of
//! an imported dashboard.

mod grafana;

pub use grafana::GrafanaClient;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Identifiers assigned by the source tool on import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedDashboard {
    pub id: i64,
    pub uid: String,
    /// Status string reported by the import call, if any.
    pub status: Option<String>,
}

/// A dashboard service that normalizes documents to its latest schema on import.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Create or overwrite a dashboard. `dashboard` must not carry `id`/`uid`.
    async fn import(&self, dashboard: &Map<String, Value>) -> Result<ImportedDashboard>;

    /// Fetch the stored representation of a dashboard.
    ///
    /// Returns the full envelope; the dashboard body lives under `spec`.
    async fn fetch(&self, uid: &str) -> Result<Value>;
}
