//! Error types for mixtape-dl
//!
//! The taxonomy mirrors the pipeline's containment policy: everything that can
//! go wrong while resolving a single track stays inside that track's
//! `SearchResult`, so the variants here cover only the failures that are
//! allowed to escape a component boundary: invocation misuse, collaborator
//! failures (metadata fetch, cleanup), and transport/serialization errors on
//! the collaborator HTTP calls.

use thiserror::Error;

/// Result type alias for mixtape-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mixtape-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrency")
        key: Option<String>,
    },

    /// Invocation-level misuse (empty track list, zero concurrency).
    ///
    /// Raised before any network activity; a batch that starts resolving
    /// never fails with this.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Video metadata could not be fetched or contained no usable tracklist
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Track-name cleanup failed (completion call failed or response
    /// unparseable); callers may substitute the heuristic fallback split
    #[error("cleanup error: {0}")]
    Cleanup(String),

    /// Network error on a collaborator HTTP call
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error without a key
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: None,
        }
    }
}
