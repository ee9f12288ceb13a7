//! Backend connection settings shared by every REST client.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Errors produced while turning configuration into usable values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid backend base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Back-office REST API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,

    /// Per-request timeout. `None` waits forever.
    #[serde(deserialize_with = "crate::duration::deserialize_opt")]
    pub request_timeout: Option<Duration>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl BackendConfig {
    /// Config pointing at `base_url` with default timeouts.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parsed base URL, normalized to end with a `/` so relative joins keep
    /// the base path (`http://host/api` + `users` -> `http://host/api/users`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL does not parse.
    pub fn base(&self) -> Result<Url, ConfigError> {
        let mut raw = self.base_url.trim().to_owned();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }
}
