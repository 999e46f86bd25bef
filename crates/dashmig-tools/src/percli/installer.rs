//! percli release download and installation.
//!
//! Releases are gzipped tarballs published on GitHub. Only the `percli`
//! executable is taken from the archive; everything else is discarded.

use dashmig_core::config::NetworkConfig;
use dashmig_core::{MigrateError, Result};
use flate2::read::GzDecoder;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const RELEASE_BASE_URL: &str = "https://github.com/perses/perses/releases/download";

/// Installs a pinned percli release into a tool directory.
#[derive(Debug, Clone)]
pub struct PercliInstaller {
    version: String,
    tool_dir: PathBuf,
}

impl PercliInstaller {
    /// `version` is a release version without the leading `v`.
    pub fn new(version: impl Into<String>, tool_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            tool_dir: tool_dir.into(),
        }
    }

    /// Platform-specific executable name.
    pub fn binary_name() -> &'static str {
        if cfg!(windows) {
            "percli.exe"
        } else {
            "percli"
        }
    }

    /// Where the executable lives once installed.
    pub fn binary_path(&self) -> PathBuf {
        self.tool_dir.join(Self::binary_name())
    }

    pub fn is_installed(&self) -> bool {
        self.binary_path().is_file()
    }

    /// Release archive URL for the running platform.
    pub fn download_url(&self) -> String {
        release_url(
            &self.version,
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }

    /// Install percli unless it is already present. Returns the binary path.
    pub async fn ensure_installed(&self) -> Result<PathBuf> {
        let binary = self.binary_path();
        if self.is_installed() {
            info!("percli already installed at {}", binary.display());
            return Ok(binary);
        }

        std::fs::create_dir_all(&self.tool_dir)
            .map_err(|e| MigrateError::io_with_path(e, &self.tool_dir))?;

        let url = self.download_url();
        info!("Downloading percli {} from {}", self.version, url);

        let mut archive = NamedTempFile::new_in(&self.tool_dir)
            .map_err(|e| MigrateError::io_with_path(e, &self.tool_dir))?;
        download_file(&url, archive.as_file_mut()).await?;

        let file = archive.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        extract_executable(BufReader::new(file), Self::binary_name(), &binary)?;

        info!("percli installed at {}", binary.display());
        Ok(binary)
    }
}

/// Release archive name, e.g. `perses_0.52.0_linux_amd64.tar.gz`.
pub fn release_asset_name(version: &str, os: &str, arch: &str) -> String {
    format!(
        "perses_{}_{}_{}.tar.gz",
        version,
        release_os(os),
        release_arch(arch)
    )
}

/// Full download URL for a release archive.
pub fn release_url(version: &str, os: &str, arch: &str) -> String {
    format!(
        "{}/v{}/{}",
        RELEASE_BASE_URL,
        version,
        release_asset_name(version, os, arch)
    )
}

/// Map a Rust OS name to the one used in release asset names.
fn release_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Map a Rust architecture name to the one used in release asset names.
fn release_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "armv6",
        "x86" => "386",
        other => other,
    }
}

/// Stream `url` into `dest`.
async fn download_file(url: &str, dest: &mut std::fs::File) -> Result<()> {
    use futures::StreamExt;

    let client = reqwest::Client::builder()
        .timeout(NetworkConfig::DOWNLOAD_TIMEOUT)
        .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
        .user_agent(NetworkConfig::USER_AGENT)
        .build()
        .map_err(|e| MigrateError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e),
        })?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MigrateError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        dest.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
    }
    dest.flush()?;

    debug!("Downloaded {} bytes from {}", downloaded, url);
    Ok(())
}

/// Extract the entry named `binary_name` from a gzipped tarball into `dest`.
///
/// Entries are matched on their file name alone, wherever they sit in the
/// archive. The file is written next to `dest` and moved into place, then
/// marked executable.
pub fn extract_executable<R: Read>(reader: R, binary_name: &str, dest: &Path) -> Result<()> {
    let dest_dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let entries = archive
        .entries()
        .map_err(|e| MigrateError::InstallationFailed {
            message: format!("Failed to read tarball: {}", e),
        })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| MigrateError::InstallationFailed {
            message: format!("Failed to read tarball entry: {}", e),
        })?;

        if !entry.header().entry_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .map(|p| p.file_name().is_some_and(|n| n == binary_name))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let mut staged = NamedTempFile::new_in(dest_dir)
            .map_err(|e| MigrateError::io_with_path(e, dest_dir))?;
        std::io::copy(&mut entry, staged.as_file_mut()).map_err(|e| {
            MigrateError::InstallationFailed {
                message: format!("Failed to extract {}: {}", binary_name, e),
            }
        })?;
        staged
            .persist(dest)
            .map_err(|e| MigrateError::io_with_path(e.error, dest))?;

        set_executable(dest)?;
        return Ok(());
    }

    Err(MigrateError::InstallationFailed {
        message: format!("{} not found in release archive", binary_name),
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| MigrateError::io_with_path(e, path))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|e| MigrateError::io_with_path(e, path))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
