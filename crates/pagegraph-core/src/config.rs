//! Configuration
//!
//! All settings have defaults and can be overridden from a TOML file:
//!
//! ```toml
//! cache_dir = "tmpdata/cache"
//!
//! [resolver]
//! max_concurrent_branches = 8
//! recursive = false
//!
//! [http]
//! base_url = "https://www.notion.so"
//! ```

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of the content service
pub const DEFAULT_BASE_URL: &str = "https://www.notion.so";

/// Default cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = "tmpdata/cache";

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum branches fetched at the same time
    pub max_concurrent_branches: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Page size of the first chunk of a branch
    pub first_chunk_limit: u32,
    /// Page size of every later chunk
    pub next_chunk_limit: u32,
    /// Expand sub-pages below the root
    pub recursive: bool,
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max concurrent branches
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_branches(mut self, max: usize) -> Self {
        self.max_concurrent_branches = max;
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// With chunk page sizes
    #[inline]
    #[must_use]
    pub fn with_chunk_limits(mut self, first: u32, next: u32) -> Self {
        self.first_chunk_limit = first;
        self.next_chunk_limit = next;
        self
    }

    /// With sub-page recursion on or off
    #[inline]
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Per-request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check the values are usable
    ///
    /// # Errors
    /// Returns [`ResolveError::Config`] naming the first bad field
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.max_concurrent_branches == 0 {
            return Err(ResolveError::Config(
                "max_concurrent_branches must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ResolveError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.first_chunk_limit == 0 || self.next_chunk_limit == 0 {
            return Err(ResolveError::Config("chunk limits must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_branches: 4,
            request_timeout_secs: 30,
            first_chunk_limit: 50,
            next_chunk_limit: 30,
            recursive: true,
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Scheme and host requests are sent to
    pub base_url: String,
    /// Session token sent as the `token_v2` cookie
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// User-Agent header
    pub user_agent: String,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl HttpConfig {
    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With session token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Full URL for a route
    #[must_use]
    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), route)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user_agent: format!("pagegraph/{}", crate::VERSION),
            connect_timeout_secs: 10,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding cached responses
    pub cache_dir: PathBuf,
    /// Resolution settings
    pub resolver: ResolverConfig,
    /// HTTP client settings
    pub http: HttpConfig,
}

impl Config {
    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ResolveError::Config`] on malformed TOML or invalid values
    pub fn from_toml_str(text: &str) -> Result<Self, ResolveError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ResolveError::Config(e.to_string()))?;
        config.resolver.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ResolveError::Config`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ResolveError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML (the token is never written)
    ///
    /// # Errors
    /// Returns [`ResolveError::Config`] if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ResolveError> {
        toml::to_string_pretty(self).map_err(|e| ResolveError::Config(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            resolver: ResolverConfig::default(),
            http: HttpConfig::default(),
        }
    }
}
