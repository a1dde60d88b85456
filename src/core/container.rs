//! Resource containers: named priority-accounting groups of bus entities and
//! processes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::util::serde::{ActivityPriority, BusId, ProcessId};

/// A bus-addressable peer that may contribute activities to the scheduler.
///
/// Entities are owned by the external entity registry; containers only hold
/// shared handles and compare them by [`BusEntity::id`].
pub trait BusEntity: Send + Sync {
    /// Identity of the entity on the bus.
    fn id(&self) -> &BusId;

    /// Current priority contribution, derived from the entity's live
    /// activities.
    fn priority(&self) -> ActivityPriority;
}

/// Index of a container inside the manager's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) usize);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Serialized view of one container.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReport {
    /// Container name.
    pub name: String,
    /// Last computed priority.
    pub priority: ActivityPriority,
    /// Whether the container participates in scheduling.
    pub enabled: bool,
    /// Names of member entities.
    pub entities: Vec<String>,
    /// Mapped process ids.
    pub processes: Vec<ProcessId>,
    /// Number of priority recomputations so far.
    pub priority_updates: u64,
}

/// A logical grouping of entities and processes. Not a resource limit.
pub struct Container {
    name: String,
    entities: BTreeMap<BusId, Arc<dyn BusEntity>>,
    processes: BTreeSet<ProcessId>,
    priority: ActivityPriority,
    enabled: bool,
    priority_updates: u64,
    enable_updates: u64,
}

impl Container {
    /// Create an empty container.
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            entities: BTreeMap::new(),
            processes: BTreeSet::new(),
            priority: ActivityPriority::default(),
            enabled,
            priority_updates: 0,
            enable_updates: 0,
        }
    }

    /// Container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Priority as of the last [`Container::update_priority`].
    pub const fn priority(&self) -> ActivityPriority {
        self.priority
    }

    /// Whether the container participates in scheduling.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// How many times the priority has been recomputed.
    pub const fn priority_updates(&self) -> u64 {
        self.priority_updates
    }

    /// How many enable/disable broadcasts this container has received.
    pub const fn enable_updates(&self) -> u64 {
        self.enable_updates
    }

    /// True when the entity is a member.
    pub fn contains(&self, id: &BusId) -> bool {
        self.entities.contains_key(id)
    }

    /// Member ids in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = &BusId> {
        self.entities.keys()
    }

    /// Number of member entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Mapped process ids in ascending order.
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.processes.iter().copied()
    }

    pub(crate) fn add_entity(&mut self, entity: Arc<dyn BusEntity>) {
        tracing::debug!("adding [BusId {}] to [Container {}]", entity.id(), self.name);
        self.entities.insert(entity.id().clone(), entity);
    }

    pub(crate) fn remove_entity(&mut self, id: &BusId) {
        if self.entities.remove(id).is_none() {
            tracing::warn!("[BusId {}] was not a member of [Container {}]", id, self.name);
        }
    }

    /// Map a process into this container. Mapping the same pid twice is a no-op.
    pub fn map_process(&mut self, pid: ProcessId) {
        if self.processes.insert(pid) {
            tracing::debug!("mapped pid {} into [Container {}]", pid, self.name);
        }
    }

    /// Recompute the container priority from its members. An empty
    /// container drops to [`ActivityPriority::None`].
    pub fn update_priority(&mut self) {
        let priority = self
            .entities
            .values()
            .map(|entity| entity.priority())
            .max()
            .unwrap_or_default();

        self.priority_updates += 1;
        if priority != self.priority {
            tracing::debug!(
                "[Container {}] priority {} -> {}{}",
                self.name,
                self.priority.as_str(),
                priority.as_str(),
                if self.enabled { "" } else { " (disabled)" }
            );
            self.priority = priority;
        }
    }

    /// Toggle participation in scheduling.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enable_updates += 1;
        if self.enabled != enabled {
            tracing::debug!(
                "{} [Container {}]",
                if enabled { "enabling" } else { "disabling" },
                self.name
            );
        }
        self.enabled = enabled;
    }

    /// Snapshot of this container for diagnostics.
    pub fn report(&self) -> ContainerReport {
        ContainerReport {
            name: self.name.clone(),
            priority: self.priority,
            enabled: self.enabled,
            entities: self.entities.keys().map(ToString::to_string).collect(),
            processes: self.processes.iter().copied().collect(),
            priority_updates: self.priority_updates,
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("entities", &self.entities.keys().collect::<Vec<_>>())
            .field("processes", &self.processes)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish()
    }
}
