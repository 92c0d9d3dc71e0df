//! Validation errors raised at the controller boundary.

use thiserror::Error;

/// A caller-supplied draft or patch that the boundary refuses to pass on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is empty or whitespace only.
    #[error("field `{0}` is required")]
    Required(&'static str),
    /// A field is present but malformed.
    #[error("field `{field}` is invalid: {reason}")]
    Invalid {
        /// Wire name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
    /// The path identifier is not a valid UUID.
    #[error("malformed identifier: {0}")]
    MalformedId(String),
}

/// Convenience result alias for boundary validation.
pub type ValidationResult<T = ()> = Result<T, ValidationError>;

/// Reject blank required text.
///
/// # Errors
/// Returns [`ValidationError::Required`] when `value` is empty after trimming.
pub fn require(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}
