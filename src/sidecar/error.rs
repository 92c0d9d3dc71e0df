//! Error types for the development sidecar.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::invoke::error::SIDECAR_ERROR_CODE;

/// Errors raised while resolving or forwarding an invocation.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// No app is registered under this id.
    #[error("no app registered as `{0}`")]
    UnknownApp(String),

    /// The inbound verb is outside the forwarded set.
    #[error("method {0} is not forwarded")]
    UnsupportedMethod(String),

    /// The target app could not be reached after all attempts.
    #[error("target unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A registry entry or target URL is malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The forwarded path would leave the app's base URL.
    #[error("path `{0}` escapes the app root")]
    InvalidPath(String),

    /// An app registration string could not be parsed.
    #[error("invalid app registration `{0}`; expected name=url")]
    InvalidRegistration(String),

    /// The upstream response could not be relayed.
    #[error("relay failed: {0}")]
    Relay(String),
}

impl SidecarError {
    /// Status returned to the caller for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownApp(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidUrl(_) | Self::InvalidPath(_) | Self::InvalidRegistration(_) => StatusCode::BAD_REQUEST,
            Self::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether another attempt could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}

impl IntoResponse for SidecarError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(status = status.as_u16(), "invocation not forwarded: {self}");
        let body = Json(serde_json::json!({
            "errorCode": SIDECAR_ERROR_CODE,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Convenience result alias for sidecar operations.
pub type SidecarResult<T> = Result<T, SidecarError>;
