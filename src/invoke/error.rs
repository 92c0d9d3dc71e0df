//! Error types for service invocation.

use thiserror::Error;

/// Error code the sidecar puts in error bodies it produces itself.
pub const SIDECAR_ERROR_CODE: &str = "ERR_DIRECT_INVOKE";

/// Why an invocation through the sidecar failed.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The sidecar could not be reached, or did not answer in time.
    #[error("sidecar unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The call was forwarded but the target answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("response deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The request could not be built (bad service name, path or endpoint).
    #[error("invalid invocation request: {0}")]
    InvalidRequest(String),

    /// The endpoint URL could not be parsed.
    #[error("invalid sidecar URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for InvokeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Unreachable(err)
        }
    }
}

impl InvokeError {
    /// Transport-level failure: the sidecar was unreachable or the target
    /// answered with an error status.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Status { .. })
    }

    /// Status code when the target answered with an error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the sidecar itself refused the call, e.g. an unknown service.
    #[must_use]
    pub fn is_sidecar_rejection(&self) -> bool {
        matches!(self, Self::Status { body, .. } if body.contains(SIDECAR_ERROR_CODE))
    }

    /// Whether the target reported the resource as missing.
    ///
    /// A 404 raised by the sidecar for an unresolvable service does not count.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. }) && !self.is_sidecar_rejection()
    }
}

/// Convenience result alias for invocation.
pub type InvokeResult<T> = Result<T, InvokeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = InvokeError::Status {
            status: 404,
            body: String::new(),
        };
        assert!(err.is_transport());
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_unknown_service_is_not_a_missing_resource() {
        let err = InvokeError::Status {
            status: 404,
            body: r#"{"errorCode":"ERR_DIRECT_INVOKE","message":"no app"}"#.to_string(),
        };
        assert!(err.is_sidecar_rejection());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_deserialization_is_not_transport() {
        let parse = serde_json::from_str::<u32>("\"nope\"");
        assert!(parse.is_err());
        if let Err(source) = parse {
            let err = InvokeError::from(source);
            assert!(!err.is_transport());
            assert_eq!(err.status(), None);
        }
    }
}
