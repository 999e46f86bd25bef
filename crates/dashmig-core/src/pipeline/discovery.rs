//! Dashboard file discovery.

use crate::config::PathsConfig;
use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A dashboard file found under an input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path used for reading.
    pub path: PathBuf,
    /// Path relative to the discovery root, used to mirror the tree on output.
    pub relative_path: PathBuf,
}

impl DiscoveredFile {
    /// Base file name, used as the item name in the summary.
    pub fn display_name(&self) -> String {
        display_name(&self.relative_path)
    }
}

/// Base name of a path as a display string.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Check for a case-insensitive `.json` suffix.
pub fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(PathsConfig::DASHBOARD_EXTENSION))
        .unwrap_or(false)
}

/// Enumerate `.json` files under `root`.
///
/// Any error reading the tree fails the whole discovery. The result is sorted
/// by path; an empty result is not an error here, callers decide.
pub fn discover_dashboards(root: &Path, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    discover_dashboards_excluding(root, recursive, None)
}

/// Like [`discover_dashboards`], skipping the subtree at `exclude`.
pub fn discover_dashboards_excluding(
    root: &Path,
    recursive: bool,
    exclude: Option<&Path>,
) -> Result<Vec<DiscoveredFile>> {
    let metadata = std::fs::metadata(root).map_err(|e| MigrateError::io_with_path(e, root))?;
    if !metadata.is_dir() {
        return Err(MigrateError::Io {
            message: "not a directory".to_string(),
            path: Some(root.to_path_buf()),
            source: None,
        });
    }

    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    let mut entries = walker.into_iter();
    while let Some(entry) = entries.next() {
        let entry = entry?;

        if let Some(excluded) = exclude {
            if entry.file_type().is_dir() && entry.path() == excluded {
                debug!("Skipping excluded directory {}", entry.path().display());
                entries.skip_current_dir();
                continue;
            }
        }

        // Symlinked files count; `Path::is_file` follows the link.
        if !entry.path().is_file() || !has_json_extension(entry.path()) {
            continue;
        }

        let relative_path = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .map_err(|_| {
                MigrateError::Other(format!(
                    "{} is not under {}",
                    entry.path().display(),
                    root.display()
                ))
            })?;

        files.push(DiscoveredFile {
            path: entry.path().to_path_buf(),
            relative_path,
        });
    }

    debug!("Discovered {} JSON files under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.json"), "{}").unwrap();
        fs::write(root.join("B.JSON"), "{}").unwrap();
        fs::write(root.join("notes.txt"), "hello").unwrap();
        fs::create_dir_all(root.join("team/sub")).unwrap();
        fs::write(root.join("team/c.json"), "{}").unwrap();
        fs::write(root.join("team/sub/d.Json"), "{}").unwrap();
        fs::create_dir_all(root.join("dir.json")).unwrap();
        temp
    }

    fn relative(files: &[DiscoveredFile]) -> Vec<PathBuf> {
        files.iter().map(|f| f.relative_path.clone()).collect()
    }

    #[test]
    fn test_non_recursive_lists_direct_children_only() {
        let temp = create_tree();
        let files = discover_dashboards(temp.path(), false).unwrap();
        assert_eq!(
            relative(&files),
            vec![PathBuf::from("B.JSON"), PathBuf::from("a.json")]
        );
        assert!(files.iter().all(|f| f.path.starts_with(temp.path())));
    }

    #[test]
    fn test_recursive_descends() {
        let temp = create_tree();
        let files = discover_dashboards(temp.path(), true).unwrap();
        let rel = relative(&files);
        assert_eq!(rel.len(), 4);
        assert!(rel.contains(&PathBuf::from("team/c.json")));
        assert!(rel.contains(&PathBuf::from("team/sub/d.Json")));
    }

    #[test]
    fn test_directory_named_json_is_skipped() {
        let temp = create_tree();
        let files = discover_dashboards(temp.path(), true).unwrap();
        assert!(!relative(&files).contains(&PathBuf::from("dir.json")));
    }

    #[test]
    fn test_excluded_subtree_is_skipped() {
        let temp = create_tree();
        let out = temp.path().join(".migrated");
        fs::create_dir_all(out.join("perses")).unwrap();
        fs::write(out.join("perses/old.json"), "{}").unwrap();

        let files = discover_dashboards_excluding(temp.path(), true, Some(&out)).unwrap();
        assert!(files.iter().all(|f| !f.path.starts_with(&out)));
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(discover_dashboards(temp.path(), true).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_fails() {
        let result = discover_dashboards(Path::new("/nonexistent/dashboards"), false);
        assert!(matches!(result, Err(MigrateError::Io { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dashboards_are_included() {
        use std::os::unix::fs::symlink;

        let shared = TempDir::new().unwrap();
        fs::write(shared.path().join("shared.json"), "{}").unwrap();

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("plain.json"), "{}").unwrap();
        symlink(shared.path().join("shared.json"), root.join("linked.json")).unwrap();
        fs::create_dir_all(root.join("team")).unwrap();
        symlink(shared.path().join("shared.json"), root.join("team/nested.json")).unwrap();
        symlink(root.join("missing.json"), root.join("dangling.json")).unwrap();

        let flat = discover_dashboards(root, false).unwrap();
        assert_eq!(
            relative(&flat),
            vec![PathBuf::from("linked.json"), PathBuf::from("plain.json")]
        );
        assert_eq!(flat[0].path, root.join("linked.json"));

        let deep = discover_dashboards(root, true).unwrap();
        assert_eq!(
            relative(&deep),
            vec![
                PathBuf::from("linked.json"),
                PathBuf::from("plain.json"),
                PathBuf::from("team/nested.json"),
            ]
        );
    }

    #[test]
    fn test_display_name() {
        let file = DiscoveredFile {
            path: PathBuf::from("/in/team/c.json"),
            relative_path: PathBuf::from("team/c.json"),
        };
        assert_eq!(file.display_name(), "c.json");
    }
}
