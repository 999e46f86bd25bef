//! Centralized configuration for dashmig.
//!
//! Constant groups hold the defaults; [`MigrationConfig`] is the single value
//! built at startup and handed by reference to every stage.

use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Defaults for services and tools.
pub struct DefaultsConfig;

impl DefaultsConfig {
    pub const GRAFANA_PORT: u16 = 3000;
    pub const PERSES_PORT: u16 = 8080;
    pub const STARTUP_WAIT: Duration = Duration::from_secs(10);
    pub const PERCLI_VERSION: &'static str = "0.52.0-beta.3";
    pub const GRAFANA_IMAGE: &'static str = "grafana/grafana";
    pub const PERSES_IMAGE: &'static str = "persesdev/perses:latest";
    pub const GRAFANA_USER: &'static str = "admin";
    pub const GRAFANA_PASSWORD: &'static str = "admin";
}

/// Directory and file naming.
pub struct PathsConfig;

impl PathsConfig {
    pub const OUTPUT_DIR_NAME: &'static str = ".migrated";
    pub const SCHEMA_OUTPUT_DIR_NAME: &'static str = "grafana-schema-latest";
    pub const MIGRATED_OUTPUT_DIR_NAME: &'static str = "perses";
    pub const TOOL_DIR_NAME: &'static str = "bin";
    pub const DASHBOARD_EXTENSION: &'static str = "json";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
    pub const USER_AGENT: &'static str = "dashmig/0.3";
}

/// Report rendering limits.
pub struct ReportConfig;

impl ReportConfig {
    /// Failed names listed per stage before the rest are summarized by count.
    pub const MAX_LISTED_FAILURES: usize = 50;
}

/// Run configuration, constructed once and passed by reference.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub recursive: bool,
    pub grafana_port: u16,
    pub perses_port: u16,
    pub startup_wait: Duration,
    pub percli_version: String,
    pub grafana_image: String,
    pub perses_image: String,
    pub grafana_user: String,
    pub grafana_password: String,
    pub use_default_datasource: bool,
    pub cleanup: bool,
    pub tool_dir: PathBuf,
    pub online_migration: bool,
}

impl MigrationConfig {
    /// Start building a configuration for the given input directory.
    pub fn builder(input_dir: impl Into<PathBuf>) -> MigrationConfigBuilder {
        MigrationConfigBuilder::new(input_dir)
    }

    pub fn grafana_base_url(&self) -> String {
        format!("http://localhost:{}", self.grafana_port)
    }

    pub fn perses_base_url(&self) -> String {
        format!("http://localhost:{}", self.perses_port)
    }

    /// Output tree for dashboards exported in the latest Grafana schema.
    pub fn schema_output_dir(&self) -> PathBuf {
        self.output_dir.join(PathsConfig::SCHEMA_OUTPUT_DIR_NAME)
    }

    /// Output tree for Perses dashboards.
    pub fn migrated_output_dir(&self) -> PathBuf {
        self.output_dir.join(PathsConfig::MIGRATED_OUTPUT_DIR_NAME)
    }
}

/// Builder for [`MigrationConfig`].
///
/// # Example
///
/// ```rust,ignore
/// let config = MigrationConfig::builder("/data/dashboards")
///     .recursive(true)
///     .grafana_port(3300)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct MigrationConfigBuilder {
    input_dir: PathBuf,
    output_dir: Option<PathBuf>,
    recursive: bool,
    grafana_port: u16,
    perses_port: u16,
    startup_wait: Duration,
    percli_version: String,
    grafana_image: String,
    perses_image: String,
    grafana_user: String,
    grafana_password: String,
    use_default_datasource: bool,
    cleanup: bool,
    tool_dir: PathBuf,
    online_migration: bool,
}

impl MigrationConfigBuilder {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            recursive: false,
            grafana_port: DefaultsConfig::GRAFANA_PORT,
            perses_port: DefaultsConfig::PERSES_PORT,
            startup_wait: DefaultsConfig::STARTUP_WAIT,
            percli_version: DefaultsConfig::PERCLI_VERSION.to_string(),
            grafana_image: DefaultsConfig::GRAFANA_IMAGE.to_string(),
            perses_image: DefaultsConfig::PERSES_IMAGE.to_string(),
            grafana_user: DefaultsConfig::GRAFANA_USER.to_string(),
            grafana_password: DefaultsConfig::GRAFANA_PASSWORD.to_string(),
            use_default_datasource: true,
            cleanup: true,
            tool_dir: PathBuf::from(PathsConfig::TOOL_DIR_NAME),
            online_migration: true,
        }
    }

    /// Output root. Default: `<input-dir>/.migrated`.
    pub fn output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn recursive(mut self, enable: bool) -> Self {
        self.recursive = enable;
        self
    }

    pub fn grafana_port(mut self, port: u16) -> Self {
        self.grafana_port = port;
        self
    }

    pub fn perses_port(mut self, port: u16) -> Self {
        self.perses_port = port;
        self
    }

    /// Blind wait after launching a container.
    pub fn startup_wait(mut self, wait: Duration) -> Self {
        self.startup_wait = wait;
        self
    }

    pub fn percli_version(mut self, version: impl Into<String>) -> Self {
        self.percli_version = version.into();
        self
    }

    pub fn grafana_image(mut self, image: impl Into<String>) -> Self {
        self.grafana_image = image.into();
        self
    }

    pub fn perses_image(mut self, image: impl Into<String>) -> Self {
        self.perses_image = image.into();
        self
    }

    pub fn grafana_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.grafana_user = user.into();
        self.grafana_password = password.into();
        self
    }

    /// Strip datasource names so migrated dashboards use the default Perses datasource.
    ///
    /// Default: `true`
    pub fn use_default_datasource(mut self, enable: bool) -> Self {
        self.use_default_datasource = enable;
        self
    }

    /// Remove both containers when the run ends.
    ///
    /// Default: `true`
    pub fn cleanup(mut self, enable: bool) -> Self {
        self.cleanup = enable;
        self
    }

    /// Directory where the percli binary is cached.
    pub fn tool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tool_dir = dir.into();
        self
    }

    /// Pass `--online` to `percli migrate`.
    pub fn online_migration(mut self, enable: bool) -> Self {
        self.online_migration = enable;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<MigrationConfig> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(MigrateError::Config {
                message: "input directory is required".to_string(),
            });
        }
        validate_input_dir(&self.input_dir)?;

        if self.grafana_port == self.perses_port {
            return Err(MigrateError::Config {
                message: format!(
                    "Grafana and Perses cannot share port {}",
                    self.grafana_port
                ),
            });
        }
        if self.percli_version.trim().is_empty() {
            return Err(MigrateError::Config {
                message: "percli version must not be empty".to_string(),
            });
        }

        let output_dir = self
            .output_dir
            .unwrap_or_else(|| self.input_dir.join(PathsConfig::OUTPUT_DIR_NAME));

        Ok(MigrationConfig {
            input_dir: self.input_dir,
            output_dir,
            recursive: self.recursive,
            grafana_port: self.grafana_port,
            perses_port: self.perses_port,
            startup_wait: self.startup_wait,
            percli_version: self.percli_version.trim().trim_start_matches('v').to_string(),
            grafana_image: self.grafana_image,
            perses_image: self.perses_image,
            grafana_user: self.grafana_user,
            grafana_password: self.grafana_password,
            use_default_datasource: self.use_default_datasource,
            cleanup: self.cleanup,
            tool_dir: self.tool_dir,
            online_migration: self.online_migration,
        })
    }
}

fn validate_input_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Err(MigrateError::Config {
            message: format!("input directory does not exist: {}", dir.display()),
        });
    }
    if !dir.is_dir() {
        return Err(MigrateError::Config {
            message: format!("input path is not a directory: {}", dir.display()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let config = MigrationConfig::builder(temp.path()).build().unwrap();

        assert_eq!(config.output_dir, temp.path().join(".migrated"));
        assert_eq!(config.grafana_port, 3000);
        assert_eq!(config.perses_port, 8080);
        assert_eq!(config.startup_wait, Duration::from_secs(10));
        assert!(config.use_default_datasource);
        assert!(config.cleanup);
        assert!(!config.recursive);
        assert_eq!(config.grafana_base_url(), "http://localhost:3000");
        assert_eq!(config.perses_base_url(), "http://localhost:8080");
        assert!(config.schema_output_dir().ends_with(".migrated/grafana-schema-latest"));
        assert!(config.migrated_output_dir().ends_with(".migrated/perses"));
    }

    #[test]
    fn test_explicit_output_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("elsewhere");
        let config = MigrationConfig::builder(temp.path())
            .output_dir(Some(out.clone()))
            .percli_version("v0.51.0")
            .build()
            .unwrap();
        assert_eq!(config.output_dir, out);
        assert_eq!(config.percli_version, "0.51.0");
    }

    #[test]
    fn test_missing_input_dir_rejected() {
        assert!(matches!(
            MigrationConfig::builder("").build(),
            Err(MigrateError::Config { .. })
        ));
        assert!(matches!(
            MigrationConfig::builder("/nonexistent/dashboards/dir").build(),
            Err(MigrateError::Config { .. })
        ));
    }

    #[test]
    fn test_input_file_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(MigrationConfig::builder(&file).build().is_err());
    }

    #[test]
    fn test_port_clash_rejected() {
        let temp = TempDir::new().unwrap();
        let result = MigrationConfig::builder(temp.path())
            .grafana_port(9000)
            .perses_port(9000)
            .build();
        assert!(result.is_err());
    }
}
