//! Required-field checks run before anything is sent.

use crate::error::BackofficeError;

pub trait Validate {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`BackofficeError::Validation`] naming the first offending
    /// field.
    fn validate(&self) -> Result<(), BackofficeError>;
}

/// `value` must contain something other than whitespace.
///
/// # Errors
///
/// Returns [`BackofficeError::Validation`] for `field` when blank.
pub fn require_text(field: &str, value: &str) -> Result<(), BackofficeError> {
    if value.trim().is_empty() {
        return Err(BackofficeError::validation(field, "is required"));
    }
    Ok(())
}

/// `value` must be present and strictly positive.
///
/// # Errors
///
/// Returns [`BackofficeError::Validation`] for `field` when missing or not
/// positive.
pub fn require_positive(field: &str, value: Option<f64>) -> Result<(), BackofficeError> {
    match value {
        None => Err(BackofficeError::validation(field, "is required")),
        Some(v) if v.is_finite() && v > 0.0 => Ok(()),
        Some(_) => Err(BackofficeError::validation(field, "must be greater than zero")),
    }
}
