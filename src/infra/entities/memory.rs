//! In-memory bus entity registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{BusEntity, EntityRegistry};
use crate::util::serde::{ActivityPriority, BusId};

/// Bus entity whose priority is set directly.
#[derive(Debug)]
pub struct StaticEntity {
    id: BusId,
    priority: RwLock<ActivityPriority>,
}

impl StaticEntity {
    /// Create an entity with an initial priority.
    pub fn new(id: BusId, priority: ActivityPriority) -> Self {
        Self {
            id,
            priority: RwLock::new(priority),
        }
    }

    /// Change the priority the entity reports.
    pub fn set_priority(&self, priority: ActivityPriority) {
        *self.priority.write() = priority;
    }
}

impl BusEntity for StaticEntity {
    fn id(&self) -> &BusId {
        &self.id
    }

    fn priority(&self) -> ActivityPriority {
        *self.priority.read()
    }
}

/// Entity registry for development and tests.
#[derive(Default)]
pub struct InMemoryEntityRegistry {
    entities: RwLock<HashMap<BusId, Arc<StaticEntity>>>,
}

impl InMemoryEntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entity for `id`, creating it with `ActivityPriority::None`.
    pub fn entity(&self, id: &BusId) -> Arc<StaticEntity> {
        if let Some(entity) = self.entities.read().get(id) {
            return Arc::clone(entity);
        }
        Arc::clone(
            self.entities
                .write()
                .entry(id.clone())
                .or_insert_with(|| Arc::new(StaticEntity::new(id.clone(), ActivityPriority::None))),
        )
    }

    /// Register `id` with a priority, replacing any previous priority.
    pub fn insert(&self, id: BusId, priority: ActivityPriority) -> Arc<StaticEntity> {
        let entity = self.entity(&id);
        entity.set_priority(priority);
        entity
    }

    /// Number of known entities.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// True when no entity is known.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl EntityRegistry for InMemoryEntityRegistry {
    fn resolve(&self, id: &BusId) -> Option<Arc<dyn BusEntity>> {
        self.entities
            .read()
            .get(id)
            .map(|entity| Arc::clone(entity) as Arc<dyn BusEntity>)
    }
}
