//! Error types for graph resolution
//!
//! Every failure aborts the whole resolution. Errors raised inside a
//! branch are wrapped in [`ResolveError::Branch`] so the caller can see
//! which page or record was being fetched.

use crate::protocol::Branch;
use pagegraph_cache::TransportError;
use pagegraph_record::RecordError;
use std::time::Duration;

/// Main resolver error type
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Transport call failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Response body did not match the expected envelope
    #[error("failed to decode response from {route}: {source}")]
    Decode {
        /// Route that answered
        route: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A record in a response could not be parsed
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Request exceeded the configured timeout
    #[error("request to {route} timed out after {}s", duration.as_secs_f64())]
    Timeout {
        /// Route that did not answer
        route: String,
        /// Timeout that elapsed
        duration: Duration,
    },

    /// Resolution was cancelled
    #[error("resolution cancelled")]
    Cancelled,

    /// Failure while resolving one branch
    #[error("branch {branch} failed: {source}")]
    Branch {
        /// Branch that failed
        branch: Branch,
        /// What went wrong in it
        #[source]
        source: Box<ResolveError>,
    },

    /// Branch task panicked or was aborted
    #[error("branch task failed: {0}")]
    Join(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    /// Create decode error for route
    pub fn decode(route: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            route: route.into(),
            source,
        }
    }

    /// Create timeout error for route
    pub fn timeout(route: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            route: route.into(),
            duration,
        }
    }

    /// Attach branch context
    ///
    /// Cancellation and already-wrapped errors pass through unchanged.
    #[must_use]
    pub fn in_branch(self, branch: Branch) -> Self {
        match self {
            Self::Cancelled | Self::Branch { .. } => self,
            other => Self::Branch {
                branch,
                source: Box::new(other),
            },
        }
    }

    /// Branch the error was raised in, if known
    #[must_use]
    pub fn branch(&self) -> Option<&Branch> {
        match self {
            Self::Branch { branch, .. } => Some(branch),
            _ => None,
        }
    }

    /// Innermost error, without branch context
    #[must_use]
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            Self::Branch { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if error is a cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled)
    }

    /// Check if a fresh resolution might succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.root_cause() {
            Self::Transport(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pagegraph_record::RecordId;

    fn page() -> Branch {
        Branch::Page(RecordId::parse("246e2166e2d6439682b5559c723f57f9").unwrap())
    }

    #[test]
    fn branch_context_wraps_once() {
        let err = ResolveError::timeout("/api/v3/loadCachedPageChunk", Duration::from_secs(30))
            .in_branch(page())
            .in_branch(Branch::Page(RecordId::parse(&"0".repeat(32)).unwrap()));

        assert_eq!(err.branch(), Some(&page()));
        assert!(matches!(err.root_cause(), ResolveError::Timeout { .. }));
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "branch page 246e2166e2d6439682b5559c723f57f9 failed: \
             request to /api/v3/loadCachedPageChunk timed out after 30s"
        );
    }

    #[test]
    fn cancellation_is_never_wrapped() {
        let err = ResolveError::Cancelled.in_branch(page());
        assert!(matches!(err, ResolveError::Cancelled));
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_retryability_follows_status() {
        let server = ResolveError::from(TransportError::status("/r", 503, "unavailable"));
        let auth = ResolveError::from(TransportError::status("/r", 401, "unauthorized"));
        assert!(server.is_retryable());
        assert!(!auth.is_retryable());
    }

    #[test]
    fn decode_error_names_route() {
        let source = serde_json::from_slice::<serde_json::Value>(b"<html>").unwrap_err();
        let err = ResolveError::decode("/api/v3/syncRecordValues", source);
        assert!(err.to_string().contains("/api/v3/syncRecordValues"));
    }
}
