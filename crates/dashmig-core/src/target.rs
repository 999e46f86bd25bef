//! Target format migration tool.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Converts one exported dashboard file into the target format.
///
/// Implementations treat the tool as an opaque `file -> bytes` function so a
/// command-line tool can later be swapped for a direct API call.
#[async_trait]
pub trait FormatMigrator: Send + Sync {
    /// Migrate the dashboard at `path`, returning the migrated document.
    async fn migrate(&self, path: &Path) -> Result<Vec<u8>>;
}

/// A migration tool that has to be installed and logged in before use.
#[async_trait]
pub trait TargetTool: FormatMigrator {
    /// Make the tool available locally and open a session against `base_url`.
    async fn prepare(&self, base_url: &str) -> Result<()>;
}
