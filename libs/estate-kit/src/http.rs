//! JSON-over-HTTP client bound to the back-office base URL.
//!
//! Request bodies are serialized with `serde_json` and responses are read as
//! bytes and decoded the same way, so every decoding failure carries the URL
//! it came from.

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{BackendConfig, ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("invalid request path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to encode request body for {url}: {message}")]
    Encode { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl HttpError {
    /// HTTP status of the response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body text (or transport message) suitable for a user-facing error.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Status { body, .. } => body,
            Self::Encode { message, .. }
            | Self::Network { message, .. }
            | Self::Decode { message, .. } => message,
            Self::InvalidPath { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    base: Url,
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client from backend settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the base URL does not parse or the
    /// underlying client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        let base = config.base()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(ConfigError::HttpClient)?;
        Ok(Self { base, inner })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `path`, relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidPath`] when the path cannot be joined.
    pub fn url(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|source| HttpError::InvalidPath {
                path: path.to_owned(),
                source,
            })
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpError`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let url = self.url(path)?;
        let request = self.inner.get(url.clone());
        let bytes = Self::execute(request, &url).await?;
        decode(&url, &bytes)
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// An empty response body decodes as JSON `null`, so callers that do not
    /// care about the response can ask for `serde::de::IgnoredAny` or
    /// `Option<_>`.
    ///
    /// # Errors
    ///
    /// See [`HttpError`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let payload = serde_json::to_vec(body).map_err(|e| HttpError::Encode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let request = self
            .inner
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        let bytes = Self::execute(request, &url).await?;
        decode(&url, &bytes)
    }

    /// `DELETE path`; the response body is ignored.
    ///
    /// # Errors
    ///
    /// See [`HttpError`].
    pub async fn delete(&self, path: &str) -> Result<(), HttpError> {
        let url = self.url(path)?;
        let request = self.inner.delete(url.clone());
        Self::execute(request, &url).await.map(|_| ())
    }

    async fn execute(request: reqwest::RequestBuilder, url: &Url) -> Result<Vec<u8>, HttpError> {
        let response = request.send().await.map_err(|e| HttpError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%url, status = status.as_u16(), "backend returned an error status");
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| HttpError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

fn decode<T: DeserializeOwned>(url: &Url, bytes: &[u8]) -> Result<T, HttpError> {
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(body).map_err(|e| HttpError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
