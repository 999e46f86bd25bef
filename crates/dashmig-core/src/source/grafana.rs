//! HTTP client for a Grafana instance.
//!
//! Grafana migrates a dashboard to its latest schema version when it is
//! imported, and the Kubernetes-style dashboard API returns that migrated
//! form. Both calls use basic auth.

use super::{DashboardSource, ImportedDashboard};
use crate::config::{MigrationConfig, NetworkConfig};
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

const IMPORT_PATH: &str = "/api/dashboards/db";
const DASHBOARD_API_PATH: &str = "/apis/dashboard.grafana.app/v1beta1/namespaces/default/dashboards";

/// Grafana API client.
pub struct GrafanaClient {
    base_url: String,
    user: String,
    password: String,
    client: Client,
}

impl GrafanaClient {
    /// Create a client for `base_url` (e.g. `http://localhost:3000`).
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| MigrateError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            client,
        })
    }

    /// Create a client for the Grafana container described by `config`.
    pub fn from_config(config: &MigrationConfig) -> Result<Self> {
        Self::new(
            config.grafana_base_url(),
            config.grafana_user.clone(),
            config.grafana_password.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn dashboard_url(&self, uid: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            DASHBOARD_API_PATH,
            urlencoding::encode(uid)
        )
    }

    /// Read a JSON body, turning anything but 200 into an error.
    async fn expect_ok_json(response: Response, url: &str) -> Result<Value> {
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| MigrateError::Network {
            message: format!("Failed to read response from {}: {}", url, e),
            source: Some(e),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| MigrateError::Json {
            message: format!("Failed to decode response from {}: {}", url, e),
            source: Some(e),
        })
    }
}

/// Extract the assigned identifiers from an import response.
fn parse_import_response(response: &Value) -> Result<ImportedDashboard> {
    let uid = response
        .get("uid")
        .and_then(Value::as_str)
        .ok_or_else(|| MigrateError::missing("UID", "import response"))?;

    // Grafana encodes numbers as JSON numbers; accept float encodings too.
    let id = response
        .get("id")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or_else(|| MigrateError::missing("ID", "import response"))?;

    Ok(ImportedDashboard {
        id,
        uid: uid.to_string(),
        status: response
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl DashboardSource for GrafanaClient {
    async fn import(&self, dashboard: &Map<String, Value>) -> Result<ImportedDashboard> {
        let url = format!("{}{}", self.base_url, IMPORT_PATH);
        let payload = json!({
            "dashboard": dashboard,
            "overwrite": true,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()
            .await
            .map_err(|e| MigrateError::Network {
                message: format!("POST {} failed: {}", url, e),
                source: Some(e),
            })?;

        let body = Self::expect_ok_json(response, &url).await?;
        let imported = parse_import_response(&body)?;
        debug!(
            "Import response status: {}",
            imported.status.as_deref().unwrap_or("unknown")
        );
        Ok(imported)
    }

    async fn fetch(&self, uid: &str) -> Result<Value> {
        let url = self.dashboard_url(uid);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| MigrateError::Network {
                message: format!("GET {} failed: {}", url, e),
                source: Some(e),
            })?;

        Self::expect_ok_json(response, &url).await
    }
}
