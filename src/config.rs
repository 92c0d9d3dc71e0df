//! Process configuration read from the environment.

use serde::{Deserialize, Serialize};

use crate::server;

/// Environment variable for the API port.
pub const PORT_ENV: &str = "SIDECAR_CRUD_PORT";
/// Environment variable for the number of sample entities per store.
pub const SEED_ENV: &str = "SIDECAR_CRUD_SEED";
/// Environment variable for the owner / speaker of sample entities.
pub const SEED_OWNER_ENV: &str = "SIDECAR_CRUD_SEED_OWNER";
/// Upper bound on sample entities per store.
pub const MAX_SEED_COUNT: usize = 10_000;

/// Configuration for the entity API process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen port.
    pub port: u16,
    /// Sample entities generated per store at startup.
    pub seed_count: usize,
    /// Owner (and speaker) of the sample entities.
    pub seed_owner: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: server::DEFAULT_PORT,
            seed_count: 0,
            seed_owner: "demo@example.com".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay values from the environment. Unparsable values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse(PORT_ENV).unwrap_or(defaults.port),
            seed_count: env_parse(SEED_ENV)
                .map_or(defaults.seed_count, |count: usize| count.min(MAX_SEED_COUNT)),
            seed_owner: std::env::var(SEED_OWNER_ENV).unwrap_or(defaults.seed_owner),
        }
    }

    /// Set the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Seed each store with `count` entities owned by `owner`, capped at [`MAX_SEED_COUNT`].
    #[must_use]
    pub fn with_seed(mut self, count: usize, owner: impl Into<String>) -> Self {
        self.seed_count = count.min(MAX_SEED_COUNT);
        self.seed_owner = owner.into();
        self
    }
}

/// Parse an environment variable, logging values that do not parse.
pub(crate) fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!("Ignoring unparsable {name}={raw}");
    }
    parsed
}
