//! Error types for back-office operations.

use estate_kit::HttpError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackofficeError {
    /// The request never produced a response (connect error, timeout).
    #[error("network failure: {0}")]
    Network(String),

    /// The backend refused the caller (HTTP 401/403).
    #[error("not authorized: {0}")]
    Authorization(String),

    /// The resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A required field is missing or invalid. Nothing was sent.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Any other non-success status.
    #[error("backend error {status}: {message}")]
    Backend { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    Request(String),
}

impl BackofficeError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<HttpError> for BackofficeError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Status {
                status: 401 | 403,
                body,
                ..
            } => Self::Authorization(body),
            HttpError::Status {
                status: 404, url, ..
            } => Self::NotFound(url),
            HttpError::Status { status, body, .. } => Self::Backend {
                status,
                message: body,
            },
            HttpError::Network { message, .. } => Self::Network(message),
            HttpError::Decode { message, .. } => Self::Decode(message),
            other @ (HttpError::InvalidPath { .. } | HttpError::Encode { .. }) => {
                Self::Request(other.to_string())
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn status(status: u16, body: &str) -> HttpError {
        HttpError::Status {
            url: "http://backend/api/properties/9".to_owned(),
            status,
            body: body.to_owned(),
        }
    }

    #[test]
    fn maps_statuses_to_taxonomy() {
        assert_eq!(
            BackofficeError::from(status(403, "forbidden")),
            BackofficeError::Authorization("forbidden".to_owned())
        );
        assert_eq!(
            BackofficeError::from(status(404, "")),
            BackofficeError::NotFound("http://backend/api/properties/9".to_owned())
        );
        assert_eq!(
            BackofficeError::from(status(500, "boom")),
            BackofficeError::Backend {
                status: 500,
                message: "boom".to_owned(),
            }
        );
    }

    #[test]
    fn validation_message_names_the_field() {
        let e = BackofficeError::validation("price", "is required");
        assert!(e.is_validation());
        assert_eq!(e.to_string(), "price: is required");
    }
}
