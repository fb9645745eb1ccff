//! Error types for SiteScout.
//!
//! Library crates use [`SiteScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-page failures during a crawl are *not* reported through this type:
//! they are recovered locally and recorded on the domain report.

use std::path::PathBuf;

/// Top-level error type for SiteScout setup and I/O.
#[derive(Debug, thiserror::Error)]
pub enum SiteScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error (client construction, transport).
    #[error("network error: {0}")]
    Network(String),

    /// Extractor reply could not be parsed into result buckets.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Semantic extractor error (API, response shape).
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad seed URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiteScoutError>;

impl SiteScoutError {
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
        let err = SiteScoutError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = SiteScoutError::validation("seed URL has no host");
        assert!(err.to_string().contains("no host"));

        let err = SiteScoutError::parse("reply is not JSON");
        assert_eq!(err.to_string(), "parse error: reply is not JSON");

        let err = SiteScoutError::Extraction("HTTP 429".into());
        assert_eq!(err.to_string(), "extraction error: HTTP 429");
    }
}
