//! Configuration for the development sidecar.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::env_parse;

/// Environment variable for the sidecar listen port.
pub const PORT_ENV: &str = "SIDECAR_HTTP_PORT";
/// Environment variable holding `name=url` app registrations.
pub const APPS_ENV: &str = "SIDECAR_APPS";
/// Environment variable for the retry budget of idempotent calls.
pub const MAX_RETRIES_ENV: &str = "SIDECAR_MAX_RETRIES";

/// Default sidecar listen port.
pub const DEFAULT_SIDECAR_PORT: u16 = 3500;

/// Configuration for the resolution agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SidecarServerConfig {
    /// Listen port.
    pub port: u16,
    /// App registrations, `name=url` separated by commas.
    pub apps: String,
    /// Retry policy for forwarded calls.
    pub retry: RetryPolicy,
    /// Timeout for one forwarded attempt, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SidecarServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SIDECAR_PORT,
            apps: String::new(),
            retry: RetryPolicy::default(),
            request_timeout_secs: 30,
        }
    }
}

impl SidecarServerConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay values from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse(PORT_ENV).unwrap_or(defaults.port),
            apps: std::env::var(APPS_ENV).unwrap_or(defaults.apps),
            retry: RetryPolicy {
                max_retries: env_parse(MAX_RETRIES_ENV).unwrap_or(defaults.retry.max_retries),
                ..defaults.retry
            },
            request_timeout_secs: defaults.request_timeout_secs,
        }
    }

    /// Set the app registrations.
    #[must_use]
    pub fn with_apps(mut self, apps: impl Into<String>) -> Self {
        self.apps = apps.into();
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Timeout for one forwarded attempt.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// How connection failures on idempotent verbs are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds; grows linearly per attempt.
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: 0,
        }
    }

    /// Delay before attempt number `attempt` (1-based retry count).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(attempt)))
    }
}
