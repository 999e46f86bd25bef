//! Perses CLI (`percli`) integration.
//!
//! `percli` is driven as a subprocess: `login` once against the Perses
//! server, then one `migrate` per dashboard with the Perses document read
//! from stdout.

mod installer;

pub use installer::{extract_executable, release_asset_name, release_url, PercliInstaller};

use async_trait::async_trait;
use dashmig_core::{FormatMigrator, MigrateError, MigrationConfig, Result, TargetTool};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

/// A `percli` executable plus the release it is installed from.
#[derive(Debug, Clone)]
pub struct Percli {
    installer: PercliInstaller,
    binary: PathBuf,
    online: bool,
}

impl Percli {
    /// Use the binary managed by `installer`.
    ///
    /// With `online` set, `migrate` asks the logged-in Perses server to
    /// resolve plugin migrations.
    pub fn new(installer: PercliInstaller, online: bool) -> Self {
        let binary = installer.binary_path();
        Self {
            installer,
            binary,
            online,
        }
    }

    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(
            PercliInstaller::new(&config.percli_version, &config.tool_dir),
            config.online_migration,
        )
    }

    /// Use an existing executable instead of installing a release.
    ///
    /// A bare command name is looked up on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn is_managed(&self) -> bool {
        self.binary == self.installer.binary_path()
    }

    /// Arguments for migrating `path`.
    pub fn migrate_args(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["migrate".into()];
        if self.online {
            args.push("--online".into());
        }
        args.push("-f".into());
        args.push(path.as_os_str().to_owned());
        args.push("-o".into());
        args.push("json".into());
        args
    }

    /// Open a session against the Perses server at `url`.
    pub async fn login(&self, url: &str) -> Result<()> {
        info!("Logging in to Perses at {}", url);
        let output = self.run("percli login", ["login".into(), OsString::from(url)]).await?;
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }

    async fn run<I>(&self, tool: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = OsString>,
    {
        if self.is_managed() && !self.binary.is_file() {
            return Err(MigrateError::ToolNotFound(self.binary.clone()));
        }

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MigrateError::ToolNotFound(self.binary.clone()),
                _ => MigrateError::ToolFailed {
                    tool: tool.to_string(),
                    message: format!("failed to run {}: {}", self.binary.display(), e),
                },
            })?;

        if !output.status.success() {
            return Err(MigrateError::ToolFailed {
                tool: tool.to_string(),
                message: failure_message(&output),
            });
        }
        Ok(output)
    }
}

/// Exit status plus whatever the tool printed.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if detail.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {}", output.status, detail)
    }
}

#[async_trait]
impl FormatMigrator for Percli {
    async fn migrate(&self, path: &Path) -> Result<Vec<u8>> {
        let output = self.run("percli migrate", self.migrate_args(path)).await?;
        Ok(output.stdout)
    }
}

#[async_trait]
impl TargetTool for Percli {
    async fn prepare(&self, base_url: &str) -> Result<()> {
        if self.is_managed() {
            self.installer.ensure_installed().await?;
        }
        self.login(base_url).await
    }
}
