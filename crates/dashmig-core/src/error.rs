//! Error types for dashmig.
//!
//! A single error enum covers both tiers of failure. Whether an error is
//! run-fatal or only fails one file is decided by the caller that observes
//! it, not by the variant.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the migration pipeline.
#[derive(Debug, Error)]
pub enum MigrateError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout: {url}")]
    Timeout { url: String },

    #[error("{url} returned status {status}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("No {field} found in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid dashboard document: {message}")]
    InvalidDocument { message: String },

    // Configuration and input errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No JSON files found in directory: {0}")]
    NoInputFiles(PathBuf),

    // Backing services and external tools
    #[error("Service {service} failed: {message}")]
    ServiceFailed { service: String, message: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(PathBuf),

    #[error("Installation failed: {message}")]
    InstallationFailed { message: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MigrateError::Timeout {
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            }
        } else {
            MigrateError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl From<walkdir::Error> for MigrateError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        let message = err.to_string();
        MigrateError::Io {
            message,
            path,
            source: err.into_io_error(),
        }
    }
}

impl MigrateError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MigrateError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a missing-field error.
    pub fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        MigrateError::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Process exit code for a run aborted by this error.
    ///
    /// - 2: usage or configuration problem (nothing was attempted)
    /// - 1: everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            MigrateError::Config { .. } | MigrateError::NoInputFiles(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrateError::HttpStatus {
            url: "http://localhost:3000/api/dashboards/db".into(),
            status: 412,
            body: "version-mismatch".into(),
        };
        assert_eq!(
            err.to_string(),
            "http://localhost:3000/api/dashboards/db returned status 412: version-mismatch"
        );

        let err = MigrateError::missing("uid", "import response");
        assert_eq!(err.to_string(), "No uid found in import response");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            MigrateError::Config {
                message: "input directory is required".into()
            }
            .exit_code(),
            2
        );
        assert_eq!(MigrateError::NoInputFiles("/tmp/in".into()).exit_code(), 2);
        assert_eq!(
            MigrateError::ServiceFailed {
                service: "grafana".into(),
                message: "docker not found".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = MigrateError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/missing.json",
        );
        match err {
            MigrateError::Io { path, .. } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/missing.json")))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
