//! Mapping of process groups and bus entities onto resource containers.
//!
//! Containers live in an indexed store owned by the manager. Two lookup
//! tables reference them by [`ContainerId`]:
//!
//! ```text
//!   names:       "com.example.mail" ──► ContainerId(0) ──┐
//!   assignments: BusId(mail-ui)     ──► ContainerId(0) ──┼──► containers[0]
//!                BusId(mail-sync)   ──► ContainerId(0) ──┘
//! ```
//!
//! "Same container" is index equality, so an entity can never be recorded in
//! one container while sitting in another's member set.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::container::{BusEntity, Container, ContainerId, ContainerReport};
use crate::core::ContainerError;
use crate::util::serde::{BusId, ProcessId};

/// Lookup of bus entities by id, owned by the bus layer.
pub trait EntityRegistry: Send + Sync {
    /// Resolve an id to its entity, or `None` if the bus has never seen it.
    fn resolve(&self, id: &BusId) -> Option<Arc<dyn BusEntity>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManagerReport {
    containers: Vec<ContainerReport>,
    entity_map: Vec<Map<String, Value>>,
}

/// Owns every container and the current entity-to-container assignment.
///
/// Callers serialize access; every method runs to completion before the
/// next one starts.
pub struct ContainerManager {
    registry: Arc<dyn EntityRegistry>,
    containers: Vec<Container>,
    names: HashMap<String, ContainerId>,
    assignments: HashMap<BusId, ContainerId>,
    enabled: bool,
}

impl ContainerManager {
    /// Create a disabled manager with no containers.
    pub fn new(registry: Arc<dyn EntityRegistry>) -> Self {
        Self {
            registry,
            containers: Vec::new(),
            names: HashMap::new(),
            assignments: HashMap::new(),
            enabled: false,
        }
    }

    /// Look up a container by name, creating it on first reference.
    ///
    /// A new container starts empty and takes the manager's current enabled
    /// flag. Containers are never removed.
    pub fn get_container(&mut self, name: &str) -> ContainerId {
        tracing::debug!("looking up [Container {}]", name);

        if let Some(&id) = self.names.get(name) {
            return id;
        }

        tracing::debug!("allocating new container for [Container {}]", name);
        let id = ContainerId(self.containers.len());
        self.containers.push(Container::new(name, self.enabled));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Map a process and the bus entities backing it into `name`.
    ///
    /// Entities already assigned elsewhere are moved and their old container
    /// recomputes its priority. Entities not named here keep whatever
    /// container they were last mapped to, and a container left without
    /// entities is kept because it may still own live processes.
    ///
    /// Every id is resolved before anything is touched, so an unknown id
    /// fails the call without side effects.
    pub fn map_container(
        &mut self,
        name: &str,
        ids: &[BusId],
        pid: ProcessId,
    ) -> Result<ContainerId, ContainerError> {
        tracing::debug!("mapping pid {} into [Container {}]", pid, name);

        let entities = ids
            .iter()
            .map(|id| {
                self.registry
                    .resolve(id)
                    .ok_or_else(|| ContainerError::UnknownEntity(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let target = self.get_container(name);

        for entity in entities {
            let id = entity.id().clone();
            match self.assignments.get(&id).copied() {
                Some(current) if current == target => {}
                Some(current) => {
                    tracing::debug!(
                        "moving [BusId {}] from [Container {}] to [Container {}]",
                        id,
                        self.containers[current.0].name(),
                        name
                    );
                    let old = &mut self.containers[current.0];
                    old.remove_entity(&id);
                    old.update_priority();

                    self.containers[target.0].add_entity(entity);
                    self.assignments.insert(id, target);
                }
                None => {
                    self.containers[target.0].add_entity(entity);
                    self.assignments.insert(id, target);
                }
            }
        }

        // Once per call: members may have existed already with live activities.
        let container = &mut self.containers[target.0];
        container.update_priority();
        container.map_process(pid);

        Ok(target)
    }

    /// Recompute the priority of the container holding `id`, if any.
    pub fn inform_entity_updated(&mut self, id: &BusId) {
        tracing::debug!("[BusId {}] has been updated", id);

        match self.assignments.get(id) {
            None => tracing::debug!("no container currently mapped for [BusId {}]", id),
            Some(current) => {
                let container = &mut self.containers[current.0];
                container.update_priority();
                tracing::debug!(
                    "[BusId {}] priority is now \"{}\"",
                    id,
                    container.priority().as_str()
                );
            }
        }
    }

    /// Enable every container.
    pub fn enable(&mut self) {
        if self.enabled {
            tracing::debug!("container manager already enabled");
        }
        tracing::debug!("enabling container manager");

        self.enabled = true;
        for container in &mut self.containers {
            container.set_enabled(true);
        }
    }

    /// Disable every container.
    pub fn disable(&mut self) {
        if !self.enabled {
            tracing::debug!("container manager already disabled");
        }
        tracing::debug!("disabling container manager");

        self.enabled = false;
        for container in &mut self.containers {
            container.set_enabled(false);
        }
    }

    /// Whether the manager is enabled.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Borrow a container by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this manager.
    pub fn container(&self, id: ContainerId) -> &Container {
        &self.containers[id.0]
    }

    /// Look up a container by name without creating it.
    pub fn find_container(&self, name: &str) -> Option<&Container> {
        self.names.get(name).map(|id| &self.containers[id.0])
    }

    /// Current container of an entity.
    pub fn container_of(&self, id: &BusId) -> Option<ContainerId> {
        self.assignments.get(id).copied()
    }

    /// Iterate over every container.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter()
    }

    /// Structured snapshot for diagnostics:
    /// `{"containers": [...], "entityMap": [{"<entity>": "<container>"}, ...]}`.
    pub fn serialize(&self) -> Result<Value, ContainerError> {
        let containers = self.containers.iter().map(Container::report).collect();

        let entity_map = self
            .assignments
            .iter()
            .map(|(entity, container)| {
                let mut mapping = Map::new();
                mapping.insert(
                    entity.to_string(),
                    Value::String(self.containers[container.0].name().to_string()),
                );
                mapping
            })
            .collect();

        let report = ManagerReport {
            containers,
            entity_map,
        };
        serde_json::to_value(report).map_err(ContainerError::from)
    }
}
