//! Filename slugs for exported dashboards.
//!
//! Perses derives dashboard names from file names and only accepts
//! DNS-label-like names, so every exported file is named with a slug that
//! matches [`SLUG_PATTERN`].

use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Pattern every filename stem must match.
pub const SLUG_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Slug used when nothing usable survives sanitization.
pub const PLACEHOLDER_SLUG: &str = "dashboard";

/// Timestamp suffix format (minute granularity).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_PATTERN).expect("slug regex must compile"));

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("separator regex must compile"));

/// Convert a free-text title into a slug.
///
/// # Examples
///
/// ```
/// use dashmig_core::pipeline::naming::sanitize_slug;
///
/// assert_eq!(sanitize_slug("My Dashboard! v2.0"), "my-dashboard-v2-0");
/// assert_eq!(sanitize_slug("  Kubernetes / Pods  "), "kubernetes-pods");
/// assert_eq!(sanitize_slug(""), "dashboard");
/// ```
pub fn sanitize_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let replaced = NON_SLUG_RUN.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches('-');

    if trimmed.is_empty() {
        PLACEHOLDER_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Check a filename (with or without `.json`) against [`SLUG_PATTERN`].
pub fn is_valid_slug(filename: &str) -> bool {
    let stem = filename.strip_suffix(".json").unwrap_or(filename);
    SLUG_RE.is_match(stem)
}

/// Render the timestamp suffix for an export filename.
pub fn timestamp_suffix<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Build the export filename for a dashboard.
///
/// The title is preferred; a missing or empty title uses the raw uid. If the
/// resulting stem is rejected, the sanitized uid is used instead.
pub fn export_filename(title: Option<&str>, uid: &str, timestamp: &str) -> String {
    let slug = match title {
        Some(t) if !t.is_empty() => sanitize_slug(t),
        _ => uid.to_string(),
    };

    let filename = format!("{}-{}.json", slug, timestamp);
    if is_valid_slug(&filename) {
        return filename;
    }

    warn!(
        "Generated filename '{}' does not match {}, using UID fallback",
        filename, SLUG_PATTERN
    );
    format!("{}-{}.json", sanitize_slug(uid), timestamp)
}
