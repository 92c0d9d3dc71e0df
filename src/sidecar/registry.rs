//! Logical app id to base URL table.

use dashmap::DashMap;
use url::Url;

use crate::sidecar::error::{SidecarError, SidecarResult};

/// Thread-safe registry of invocable apps.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: DashMap<String, Url>,
}

impl AppRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a `name=url,name2=url2` list.
    ///
    /// # Errors
    /// Returns an error if an entry is not `name=url` or the URL is invalid.
    pub fn parse(list: &str) -> SidecarResult<Self> {
        let registry = Self::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, url) = entry
                .split_once('=')
                .ok_or_else(|| SidecarError::InvalidRegistration(entry.to_string()))?;
            registry.register(name.trim(), url.trim())?;
        }
        Ok(registry)
    }

    /// Register or replace an app.
    ///
    /// # Errors
    /// Returns an error if the name is empty or the URL cannot be a base.
    pub fn register(&self, name: &str, base_url: &str) -> SidecarResult<()> {
        if name.is_empty() {
            return Err(SidecarError::InvalidRegistration(format!("={base_url}")));
        }
        let mut url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(SidecarError::InvalidRegistration(format!("{name}={base_url}")));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        tracing::info!("Registered app `{name}` at {url}");
        self.apps.insert(name.to_string(), url);
        Ok(())
    }

    /// Remove an app. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.apps.remove(name).is_some()
    }

    /// Base URL for `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Url> {
        self.apps.get(name).map(|entry| entry.value().clone())
    }

    /// Number of registered apps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether no app is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
