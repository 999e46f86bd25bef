//! In-memory stand-ins for Grafana, percli and the container runtime.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmig_core::{
    DashboardSource, FormatMigrator, ImportedDashboard, MigrateError, Result, ServiceRuntime,
    ServiceSpec, TargetTool,
};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Grafana stand-in that assigns sequential uids.
#[derive(Default)]
pub struct FakeSource {
    pub dashboards: Mutex<HashMap<String, Map<String, Value>>>,
    pub import_calls: Mutex<usize>,
    pub received_identity: Mutex<bool>,
    /// Titles whose import is answered with a non-200 status.
    pub reject_titles: HashSet<String>,
    /// Titles whose fetch fails after a successful import.
    pub unfetchable_titles: HashSet<String>,
}

impl FakeSource {
    pub fn rejecting(titles: &[&str]) -> Self {
        Self {
            reject_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn import_count(&self) -> usize {
        *self.import_calls.lock().unwrap()
    }
}

fn title_of(dashboard: &Map<String, Value>) -> String {
    dashboard
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl DashboardSource for FakeSource {
    async fn import(&self, dashboard: &Map<String, Value>) -> Result<ImportedDashboard> {
        let mut calls = self.import_calls.lock().unwrap();
        *calls += 1;

        if dashboard.contains_key("id") || dashboard.contains_key("uid") {
            *self.received_identity.lock().unwrap() = true;
        }

        let title = title_of(dashboard);
        if self.reject_titles.contains(&title) {
            return Err(MigrateError::HttpStatus {
                url: "http://fake/api/dashboards/db".into(),
                status: 400,
                body: "bad dashboard".into(),
            });
        }

        let uid = format!("uid{}", *calls);
        let mut stored = dashboard.clone();
        stored.insert("schemaVersion".into(), json!(41));
        self.dashboards.lock().unwrap().insert(uid.clone(), stored);

        Ok(ImportedDashboard {
            id: *calls as i64,
            uid,
            status: Some("success".into()),
        })
    }

    async fn fetch(&self, uid: &str) -> Result<Value> {
        let stored = self
            .dashboards
            .lock()
            .unwrap()
            .get(uid)
            .cloned()
            .ok_or_else(|| MigrateError::HttpStatus {
                url: format!("http://fake/dashboards/{}", uid),
                status: 404,
                body: "not found".into(),
            })?;

        if self.unfetchable_titles.contains(&title_of(&stored)) {
            return Err(MigrateError::Network {
                message: "connection reset".into(),
                source: None,
            });
        }

        Ok(json!({
            "kind": "Dashboard",
            "apiVersion": "dashboard.grafana.app/v1beta1",
            "metadata": {"name": uid},
            "spec": stored,
        }))
    }
}

/// percli stand-in producing a Perses dashboard with a named datasource.
#[derive(Default)]
pub struct FakeMigrator {
    pub migrated: Mutex<Vec<PathBuf>>,
    pub prepared: Mutex<Option<String>>,
    pub fail_prepare: bool,
    /// Titles the tool refuses to migrate.
    pub refuse_titles: HashSet<String>,
}

#[async_trait]
impl FormatMigrator for FakeMigrator {
    async fn migrate(&self, path: &Path) -> Result<Vec<u8>> {
        self.migrated.lock().unwrap().push(path.to_path_buf());

        let bytes = std::fs::read(path)?;
        let grafana: Value = serde_json::from_slice(&bytes)?;
        let title = grafana["title"].as_str().unwrap_or_default().to_string();
        if self.refuse_titles.contains(&title) {
            return Err(MigrateError::ToolFailed {
                tool: "percli".into(),
                message: "exit status: 1".into(),
            });
        }

        let perses = json!({
            "kind": "Dashboard",
            "metadata": {"name": grafana["uid"], "project": "default"},
            "spec": {
                "display": {"name": title},
                "panels": {
                    "0_0": {
                        "kind": "Panel",
                        "spec": {
                            "queries": [{
                                "kind": "TimeSeriesQuery",
                                "spec": {"plugin": {
                                    "kind": "PrometheusTimeSeriesQuery",
                                    "spec": {
                                        "datasource": {"kind": "PrometheusDatasource", "name": "prod-prometheus"},
                                        "query": "up"
                                    }
                                }}
                            }]
                        }
                    }
                }
            }
        });
        Ok(serde_json::to_vec(&perses)?)
    }
}

#[async_trait]
impl TargetTool for FakeMigrator {
    async fn prepare(&self, base_url: &str) -> Result<()> {
        if self.fail_prepare {
            return Err(MigrateError::ToolFailed {
                tool: "percli login".into(),
                message: "connection refused".into(),
            });
        }
        *self.prepared.lock().unwrap() = Some(base_url.to_string());
        Ok(())
    }
}

/// Container runtime stand-in.
#[derive(Default)]
pub struct FakeRuntime {
    pub started: Mutex<Vec<(String, u16)>>,
    pub removed: Mutex<Vec<u16>>,
    pub fail_start: bool,
}

#[async_trait]
impl ServiceRuntime for FakeRuntime {
    async fn is_running(&self, host_port: u16) -> Result<bool> {
        Ok(self
            .started
            .lock()
            .unwrap()
            .iter()
            .any(|(_, p)| *p == host_port))
    }

    async fn start(&self, spec: &ServiceSpec, host_port: u16) -> Result<()> {
        if self.fail_start {
            return Err(MigrateError::ServiceFailed {
                service: spec.name.clone(),
                message: "docker: command not found".into(),
            });
        }
        self.started
            .lock()
            .unwrap()
            .push((spec.name.clone(), host_port));
        Ok(())
    }

    async fn remove(&self, host_port: u16) -> Result<bool> {
        self.removed.lock().unwrap().push(host_port);
        Ok(true)
    }
}

/// Write a Grafana dashboard file under `root`.
pub fn write_dashboard(root: &Path, relative: &str, title: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let dashboard = json!({
        "id": 17,
        "uid": "legacy-uid",
        "title": title,
        "schemaVersion": 16,
        "panels": [{"type": "graph", "title": "CPU"}]
    });
    std::fs::write(path, serde_json::to_vec_pretty(&dashboard).unwrap()).unwrap();
}

/// All files under `root`, relative to it.
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walk(root)
        .into_iter()
        .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(walk(&path));
            } else {
                out.push(path);
            }
        }
    }
    out
}
