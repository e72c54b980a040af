//! Storage Proxy Error Types

use thiserror::Error;

/// Result type alias for storage proxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Storage proxy error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Blob store errors
    #[error("Blob store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("Invalid blob store URL: {0}")]
    StoreUrl(#[from] url::ParseError),

    #[error("Invalid object name {name:?}: {reason}")]
    InvalidObjectName { name: String, reason: String },

    // Network errors
    #[error("Failed to listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error means the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(object_store::Error::NotFound { .. }) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this error was caused by the caller's object name rather than the backend
    pub fn is_invalid_object_name(&self) -> bool {
        matches!(self, Error::InvalidObjectName { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let missing = Error::Store(object_store::Error::NotFound {
            path: "v1/a.txt".to_string(),
            source: "no such object".into(),
        });
        assert!(missing.is_not_found());

        let io_missing = Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(io_missing.is_not_found());

        let denied = Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!denied.is_not_found());
        assert!(!Error::Config("bucket".into()).is_not_found());
    }

    #[test]
    fn test_invalid_object_name_classification() {
        let err = Error::InvalidObjectName {
            name: "v1/a//b".into(),
            reason: "empty path segment".into(),
        };
        assert!(err.is_invalid_object_name());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("\"v1/a//b\""));
        assert!(!Error::Network("down".into()).is_invalid_object_name());
    }
}
