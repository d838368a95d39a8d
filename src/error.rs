//! Error types for hotswap-reload.

use crate::notify::ListenerId;
use std::path::PathBuf;

/// Result type alias for hotswap-reload operations.
pub type Result<T> = std::result::Result<T, ReloadError>;

/// Boxed error returned by change listeners.
///
/// Listeners may fail with any error type; the reloader only needs to report it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading, refreshing, or decoding reloadable data.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// The reloader options are inconsistent (e.g. no local file configured).
    #[error("Invalid reloading options: {0}")]
    InvalidOptions(String),

    /// The mandatory first load failed, so the reloader was not created.
    #[error("Failed to perform initial load: {0}")]
    Construction(#[source] Box<ReloadError>),

    /// Fetching from the remote endpoint failed.
    #[error("Failed to fetch remote data: {0}")]
    Fetch(String),

    /// Reading, writing, or renaming the local cache file failed.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// The file the operation was applied to
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A change listener rejected the new data.
    #[error("Listener {id} failed: {source}")]
    Listener {
        /// Handle of the listener that failed
        id: ListenerId,
        /// The error returned by the listener
        #[source]
        source: BoxError,
    },

    /// The data could not be decoded into the target type.
    #[error("Failed to decode configuration: {0}")]
    Decode(String),
}

impl ReloadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error was raised by a change listener.
    ///
    /// For construction failures the wrapped cause is inspected.
    pub fn is_listener_error(&self) -> bool {
        match self {
            Self::Listener { .. } => true,
            Self::Construction(inner) => inner.is_listener_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = ReloadError::io(
            "/tmp/cfg.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/cfg.json"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_construction_wraps_listener_error() {
        let err = ReloadError::Construction(Box::new(ReloadError::Listener {
            id: ListenerId::from_raw(3),
            source: "rejected".into(),
        }));
        assert!(err.is_listener_error());
        assert!(!ReloadError::Fetch("boom".to_string()).is_listener_error());
    }
}
