//! Error types for the Nuru widget.
//!
//! Library crates use [`NuruError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all widget operations.
#[derive(Debug, thiserror::Error)]
pub enum NuruError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while probing a hand-off source or talking to the backend.
    #[error("network error: {0}")]
    Network(String),

    /// A response body that could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Persisted key/value storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, unexpected shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NuruError>;

impl NuruError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NuruError::config("backend base_url is empty");
        assert_eq!(err.to_string(), "config error: backend base_url is empty");

        let err = NuruError::parse("expected a JSON object");
        assert!(err.to_string().starts_with("parse error:"));

        let err = NuruError::Network("http://localhost:5000/api/chat: HTTP 502".into());
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = NuruError::io(
            "/tmp/nuru.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/tmp/nuru.toml"));
    }
}
