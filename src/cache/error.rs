//! Error types for cache operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the cache directory
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory (or one of its ancestors) could not be created
    #[error("failed to create cache directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// The cache directory could not be listed
    #[error("failed to list cache directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    /// A cache entry could not be read
    #[error("failed to read cache entry {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// A cache entry could not be written or moved into place
    #[error("failed to write cache entry {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// A stale cache entry could not be removed
    #[error("failed to remove cache entry {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },

    /// A cache entry exists but does not hold valid JSON for the requested type
    #[error("corrupt cache entry {}: {source}", path.display())]
    Deserialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Call arguments could not be turned into a cache key
    #[error("cannot derive cache key from arguments: {0}")]
    KeyArgs(#[source] serde_json::Error),
}

impl CacheError {
    /// Whether this error means the entry on disk is unreadable as JSON
    pub fn is_corrupt_entry(&self) -> bool {
        matches!(self, CacheError::Deserialize { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_include_path() {
        let err = CacheError::CreateDir {
            path: PathBuf::from("/tmp/jsoncache"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("/tmp/jsoncache"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_deserialize_error_is_corrupt_entry() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = CacheError::Deserialize {
            path: PathBuf::from("a.1.json"),
            source,
        };
        assert!(err.is_corrupt_entry());
        assert!(err.to_string().starts_with("corrupt cache entry a.1.json"));
    }
}
