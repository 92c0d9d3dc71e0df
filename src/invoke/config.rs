//! Configuration for the sidecar invocation client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::invoke::error::{InvokeError, InvokeResult};

/// Environment variable overriding the sidecar base URL.
pub const SIDECAR_ENDPOINT_ENV: &str = "SIDECAR_HTTP_ENDPOINT";

/// Default local address of the sidecar.
pub const DEFAULT_SIDECAR_ENDPOINT: &str = "http://127.0.0.1:3500";

/// Where the sidecar lives and how long a call may take.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// Base URL of the local sidecar.
    pub endpoint: String,
    /// Upper bound on a whole invocation.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Upper bound on establishing the connection to the sidecar.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SIDECAR_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

impl SidecarConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the endpoint from `SIDECAR_HTTP_ENDPOINT`, falling back to the default.
    ///
    /// # Errors
    /// Returns an error if the variable is set but is not a valid URL.
    pub fn from_env() -> InvokeResult<Self> {
        match std::env::var(SIDECAR_ENDPOINT_ENV) {
            Ok(raw) => Self::new().with_endpoint_str(&raw),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Set the sidecar endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Parse and set the sidecar endpoint.
    ///
    /// # Errors
    /// Returns an error if `raw` is not usable as a base URL.
    pub fn with_endpoint_str(self, raw: &str) -> InvokeResult<Self> {
        let with = self.with_endpoint(raw.trim());
        with.endpoint_url()?;
        Ok(with)
    }

    /// Parsed base URL, always ending with `/` so relative joins keep its path.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid base URL.
    pub fn endpoint_url(&self) -> InvokeResult<Url> {
        let mut endpoint = Url::parse(&self.endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(InvokeError::InvalidRequest(format!(
                "sidecar endpoint `{}` cannot be a base URL",
                self.endpoint
            )));
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(endpoint)
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Serde module for Duration serialization as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
