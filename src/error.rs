//! Error types for dragnet.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DragnetError {
    #[error("Failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse SARIF document: {path}")]
    ParseSarif {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse scanner catalog: {path}")]
    ParseCatalog {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("git {args} failed: {message}")]
    Git { args: String, message: String },

    #[error("Regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Failed to launch scanner '{scanner}': {source}")]
    Launch {
        scanner: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scanner '{scanner}' {status}: {command}\n{output}")]
    ScannerFailed {
        scanner: String,
        command: String,
        status: String,
        output: String,
    },

    #[error("Scanner '{scanner}' timed out after {seconds}s")]
    Timeout { scanner: String, seconds: u64 },

    #[error("Async runtime error: {0}")]
    Runtime(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// Result type alias for operations that can fail with a `DragnetError`.
pub type Result<T> = std::result::Result<T, DragnetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_read_file() {
        let err = DragnetError::ReadFile {
            path: PathBuf::from("/path/to/file"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to read /path/to/file");
    }

    #[test]
    fn test_error_display_scanner_failed() {
        let err = DragnetError::ScannerFailed {
            scanner: "opengrep".to_string(),
            command: "opengrep scan /app".to_string(),
            status: "exited with code 2".to_string(),
            output: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Scanner 'opengrep' exited with code 2: opengrep scan /app\nboom"
        );
    }

    #[test]
    fn test_error_display_timeout() {
        let err = DragnetError::Timeout {
            scanner: "depscan".to_string(),
            seconds: 90,
        };
        assert_eq!(err.to_string(), "Scanner 'depscan' timed out after 90s");
    }

    #[test]
    fn test_error_display_usage() {
        let err = DragnetError::Usage("No available scanners selected.".to_string());
        assert_eq!(err.to_string(), "No available scanners selected.");
    }
}
