//! Generic in-memory entity manager.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::entities::ids::EntityId;
use crate::entities::model::Entity;

/// CRUD contract over a single collection of one entity type.
///
/// Absence is a normal outcome: lookups return `None` and mutations return
/// `false` when the target id is not stored.
pub trait EntityManager<E: Entity>: Send + Sync {
    /// Exact lookup by id.
    fn get_by_id(&self, id: EntityId) -> Option<E>;

    /// Entities whose filter field equals `value`. Empty when nothing matches.
    fn get_all_by_filter(&self, value: &str) -> Vec<E>;

    /// Every stored entity.
    fn get_all(&self) -> Vec<E>;

    /// Store a new entity and return its freshly allocated id.
    fn create(&self, draft: E::Draft) -> EntityId;

    /// Replace the mutable attributes of `id`. Returns whether it existed.
    fn update(&self, id: EntityId, patch: E::Patch) -> bool;

    /// Apply an in-place mutation to `id`. Returns whether it existed.
    fn modify(&self, id: EntityId, mutate: &dyn Fn(&mut E)) -> bool;

    /// Remove `id`. Returns whether a removal happened.
    fn delete(&self, id: EntityId) -> bool;

    /// Number of stored entities.
    fn len(&self) -> usize;

    /// Whether the store holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clock used to stamp creation and update times.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// [`EntityManager`] backed by a sharded concurrent map keyed by id.
pub struct InMemoryEntityManager<E: Entity> {
    entities: DashMap<EntityId, E>,
    clock: Clock,
}

impl<E: Entity> Default for InMemoryEntityManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryEntityManager<E> {
    /// Create an empty store stamped with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Create an empty store with a custom clock.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entities: DashMap::new(),
            clock,
        }
    }

    /// Create a store pre-populated with `drafts`.
    #[must_use]
    pub fn seeded(drafts: impl IntoIterator<Item = E::Draft>) -> Self {
        let manager = Self::new();
        for draft in drafts {
            manager.create(draft);
        }
        manager
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Snapshot of matching entities ordered by creation time, then id.
    fn collect_where(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
        let mut found: Vec<E> = self
            .entities
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|entity| (entity.created_on(), entity.id()));
        found
    }
}

impl<E: Entity> EntityManager<E> for InMemoryEntityManager<E> {
    fn get_by_id(&self, id: EntityId) -> Option<E> {
        self.entities.get(&id).map(|entry| entry.value().clone())
    }

    fn get_all_by_filter(&self, value: &str) -> Vec<E> {
        self.collect_where(|entity| entity.filter_value() == value)
    }

    fn get_all(&self) -> Vec<E> {
        self.collect_where(|_| true)
    }

    fn create(&self, draft: E::Draft) -> EntityId {
        let now = self.now();
        loop {
            let id = EntityId::new();
            // The shard lock is held between the vacancy check and the insert.
            if let Entry::Vacant(slot) = self.entities.entry(id) {
                slot.insert(E::from_draft(id, draft, now));
                tracing::debug!(collection = E::COLLECTION, %id, "entity created");
                return id;
            }
            tracing::warn!(collection = E::COLLECTION, %id, "id collision, drawing again");
        }
    }

    fn update(&self, id: EntityId, patch: E::Patch) -> bool {
        let now = self.now();
        let Some(mut entry) = self.entities.get_mut(&id) else {
            tracing::debug!(collection = E::COLLECTION, %id, "update target not found");
            return false;
        };
        let entity = entry.value_mut();
        entity.apply_patch(patch);
        entity.touch(now);
        true
    }

    fn modify(&self, id: EntityId, mutate: &dyn Fn(&mut E)) -> bool {
        let now = self.now();
        let Some(mut entry) = self.entities.get_mut(&id) else {
            tracing::debug!(collection = E::COLLECTION, %id, "modify target not found");
            return false;
        };
        let entity = entry.value_mut();
        mutate(entity);
        entity.touch(now);
        true
    }

    fn delete(&self, id: EntityId) -> bool {
        let removed = self.entities.remove(&id).is_some();
        tracing::debug!(collection = E::COLLECTION, %id, removed, "entity delete");
        removed
    }

    fn len(&self) -> usize {
        self.entities.len()
    }
}
