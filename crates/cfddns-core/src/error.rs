//! Error types for the cfddns updater
//!
//! The taxonomy mirrors the run lifecycle: configuration problems are fatal
//! before any network call, detection failures abort (IPv4) or soft-skip
//! (IPv6), transport failures are the only retried class, and provider-level
//! rejections are recorded per record without retry.

use thiserror::Error;

/// Result type alias for cfddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the cfddns updater
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing file, malformed JSON, missing fields)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public IP detection failed across all endpoints
    #[error("IP detection error: {0}")]
    Detection(String),

    /// Transient network/transport failure (retried with backoff)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider-reported logical failure (well-formed error response, not retried)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Cache read/write failure (never fatal)
    #[error("Cache error: {0}")]
    Cache(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IP detection error
    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Whether the failure is worth retrying
    ///
    /// Only transport-level failures qualify. A provider that answered with a
    /// well-formed error will give the same answer again; retrying it only
    /// burns rate limit.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_transient() {
        assert!(Error::transport("connection reset").is_transient());
        assert!(!Error::config("missing api_token").is_transient());
        assert!(!Error::provider("record rejected").is_transient());
        assert!(!Error::detection("all endpoints failed").is_transient());
        assert!(!Error::cache("read-only filesystem").is_transient());
    }
}
