/// Result type alias for workshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for workshelf operations
///
/// Most failures never reach an end user: directory lookups fail closed,
/// remote store errors degrade to the local cache tier, and malformed
/// payloads are treated as cache misses. These variants exist so the
/// degradation points can log a precise cause.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Group directory or admin registry lookup errors
    #[error("directory lookup '{operation}' failed: {message}")]
    Directory {
        operation: &'static str,
        message: String,
    },

    /// Remote store errors (connection refused, timeout, protocol)
    #[error("remote store {operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization errors for cached payloads
    #[error("serialization error for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Wrap a remote store failure with the operation that hit it.
    pub fn remote(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Remote {
            operation,
            message: source.to_string(),
        }
    }

    /// Wrap a directory lookup failure with the operation that hit it.
    pub fn directory(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Directory {
            operation,
            message: source.to_string(),
        }
    }
}
