//! Error types for the client.

use arbor_tree::{EnvelopeError, PathError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations.
///
/// Write-style entry points never return `Fetch` or `Auth`: writes are
/// discarded before any transport is involved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Network or transport failure, including non-2xx responses.
    #[error("fetch failed{}: {message}", fmt_status(.status))]
    Fetch {
        /// HTTP status code, when the failure carried one.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// Malformed response body or envelope.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the malformed input.
        message: String,
    },

    /// Structural validation failure on a read or write path.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The remote store rejected the read.
    #[error("permission denied (status {status}): {message}")]
    Auth {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Description from the remote.
        message: String,
    },

    /// A fetch did not complete within the configured bound.
    #[error("fetch timed out")]
    Timeout,

    /// The client has been shut down.
    #[error("client is shut down")]
    Closed,
}

impl ClientError {
    /// Creates a fetch error.
    pub fn fetch(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Fetch {
            status,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Returns true if a later poll cycle may succeed where this one
    /// failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Fetch { .. } | ClientError::Timeout | ClientError::Auth { .. }
        )
    }
}

impl From<EnvelopeError> for ClientError {
    fn from(err: EnvelopeError) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ClientError::fetch(Some(500), "boom").is_retryable());
        assert!(ClientError::Timeout.is_retryable());
        assert!(!ClientError::parse("bad envelope").is_retryable());
        assert!(!ClientError::Closed.is_retryable());
    }

    #[test]
    fn display_includes_status() {
        let err = ClientError::fetch(Some(503), "unavailable");
        assert_eq!(err.to_string(), "fetch failed (status 503): unavailable");

        let err = ClientError::fetch(None, "connection refused");
        assert_eq!(err.to_string(), "fetch failed: connection refused");
    }

    #[test]
    fn path_errors_convert() {
        let err: ClientError = PathError::InvalidSegment {
            segment: "a#b".into(),
        }
        .into();
        assert!(matches!(err, ClientError::InvalidPath(_)));
        assert!(!err.is_retryable());
    }
}
