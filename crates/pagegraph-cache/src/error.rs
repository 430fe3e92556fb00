//! Error types for cache stores

use std::path::PathBuf;

/// Errors during cache store operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// IO error on a cache file or directory
    #[error("cache io error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Background task failed
    #[error("cache task failed: {0}")]
    Task(String),
}

impl CacheError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
