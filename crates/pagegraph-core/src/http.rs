//! HTTP transport
//!
//! Posts JSON bodies to the content service with `reqwest`. Authentication
//! is a `token_v2` session cookie supplied by the caller.

use crate::config::HttpConfig;
use crate::error::ResolveError;
use async_trait::async_trait;
use pagegraph_cache::{Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Longest error body kept in a [`TransportError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Live transport talking to the content service
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// Build a client from configuration
    ///
    /// # Errors
    /// Returns [`ResolveError::Config`] if the token is not a valid header
    /// value or the client cannot be built
    pub fn new(config: HttpConfig) -> Result<Self, ResolveError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let cookie = HeaderValue::from_str(&format!("token_v2={token}"))
                .map_err(|e| ResolveError::Config(format!("invalid token: {e}")))?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ResolveError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Transport configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
        let url = self.config.url(route);
        tracing::debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::network(route, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::status(
                route,
                status.as_u16(),
                truncate(&text, MAX_ERROR_BODY),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(route, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_and_without_token() {
        assert!(HttpTransport::new(HttpConfig::default()).is_ok());
        assert!(HttpTransport::new(HttpConfig::default().with_token("abc123")).is_ok());
    }

    #[test]
    fn rejects_token_with_newline() {
        let err = HttpTransport::new(HttpConfig::default().with_token("abc\ndef")).unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééé", 3), "é...");
    }
}
