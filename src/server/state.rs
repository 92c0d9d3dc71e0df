//! Application state shared across all request handlers.

use std::sync::Arc;

use chrono::Utc;

use crate::config::ApiConfig;
use crate::entities::{Contact, EntityManager, InMemoryEntityManager, Session, Task, seed};

/// Shared application state: one store per entity type.
pub struct AppState {
    /// Contact store.
    pub contacts: Arc<dyn EntityManager<Contact>>,
    /// Session store.
    pub sessions: Arc<dyn EntityManager<Session>>,
    /// Task store.
    pub tasks: Arc<dyn EntityManager<Task>>,
}

impl AppState {
    /// Create state with empty in-memory stores.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_managers(
            Arc::new(InMemoryEntityManager::new()),
            Arc::new(InMemoryEntityManager::new()),
            Arc::new(InMemoryEntityManager::new()),
        )
    }

    /// Create state from explicit stores.
    #[must_use]
    pub fn with_managers(
        contacts: Arc<dyn EntityManager<Contact>>,
        sessions: Arc<dyn EntityManager<Session>>,
        tasks: Arc<dyn EntityManager<Task>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            contacts,
            sessions,
            tasks,
        })
    }

    /// Create state with stores seeded according to `config`.
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Arc<Self> {
        let now = Utc::now();
        let count = config.seed_count;
        let owner = config.seed_owner.as_str();
        if count > 0 {
            tracing::info!("Seeding {count} sample entities per store for `{owner}`");
        }

        Self::with_managers(
            Arc::new(InMemoryEntityManager::<Contact>::seeded(seed::contacts(count, owner))),
            Arc::new(InMemoryEntityManager::<Session>::seeded(seed::sessions(count, owner, now))),
            Arc::new(InMemoryEntityManager::<Task>::seeded(seed::tasks(count, owner, now))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_state() {
        let config = ApiConfig::new().with_seed(3, "demo@example.com");
        let state = AppState::from_config(&config);
        assert_eq!(state.contacts.len(), 3);
        assert_eq!(state.sessions.get_all_by_filter("demo@example.com").len(), 3);
        assert_eq!(state.tasks.get_all_by_filter("demo@example.com").len(), 3);
    }

    #[test]
    fn test_default_state_is_empty() {
        let state = AppState::new();
        assert!(state.contacts.is_empty());
        assert!(state.sessions.is_empty());
        assert!(state.tasks.is_empty());
    }
}
