//! Transport seam
//!
//! The only thing the engine needs from the network: post a JSON body to a
//! route and get the raw response bytes back. TLS, auth headers and socket
//! retries are the implementation's business.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Raw request/response transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `route`, returning the undecoded response
    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
        (**self).send(route, body).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
        (**self).send(route, body).await
    }
}

/// Errors from the raw transport
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS or timeout failure below HTTP
    #[error("network error on {route}: {message}")]
    Network {
        /// Route being called
        route: String,
        /// Client error text
        message: String,
    },

    /// Non-success HTTP status
    #[error("{route} returned HTTP {status}: {body}")]
    Status {
        /// Route being called
        route: String,
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Request body could not be serialized
    #[error("invalid request body for {route}: {message}")]
    InvalidBody {
        /// Route being called
        route: String,
        /// Serializer error text
        message: String,
    },
}

impl TransportError {
    /// Create network error for route
    pub fn network(route: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            route: route.into(),
            message: message.into(),
        }
    }

    /// Create status error for route
    pub fn status(route: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            route: route.into(),
            status,
            body: body.into(),
        }
    }

    /// Route the failed request was sent to
    #[must_use]
    pub fn route(&self) -> &str {
        match self {
            Self::Network { route, .. }
            | Self::Status { route, .. }
            | Self::InvalidBody { route, .. } => route,
        }
    }

    /// Check if a later attempt might succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidBody { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = TransportError::status("/api/v3/loadCachedPageChunk", 502, "bad gateway");
        assert_eq!(
            err.to_string(),
            "/api/v3/loadCachedPageChunk returned HTTP 502: bad gateway"
        );
        assert_eq!(err.route(), "/api/v3/loadCachedPageChunk");
    }

    #[test]
    fn retryable_classification() {
        assert!(TransportError::network("/r", "reset").is_retryable());
        assert!(TransportError::status("/r", 503, "").is_retryable());
        assert!(TransportError::status("/r", 429, "").is_retryable());
        assert!(!TransportError::status("/r", 401, "").is_retryable());
    }
}
