//! In-memory master requirement registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::core::{
    Activity, ListedRequirement, MasterRequirementManager, RequirementError, RequirementManager,
};

/// Routes requirement names to the provider registered for them.
#[derive(Default)]
pub struct InMemoryRequirementRegistry {
    providers: RwLock<HashMap<String, Arc<dyn RequirementManager>>>,
}

impl InMemoryRequirementRegistry {
    /// Name reported when no provider matches.
    pub const NAME: &'static str = "MasterRequirementManager";

    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider registered for `name`.
    pub fn provider(&self, name: &str) -> Option<Arc<dyn RequirementManager>> {
        self.providers.read().get(name).cloned()
    }

    /// Registered requirement names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate `name` through its provider.
    pub fn instantiate(
        &self,
        activity: Arc<dyn Activity>,
        name: &str,
        value: &Value,
    ) -> Result<Arc<ListedRequirement>, RequirementError> {
        match self.provider(name) {
            Some(provider) => provider.instantiate_requirement(activity, name, value),
            None => {
                tracing::error!(
                    "no provider registered for [Requirement {}] requested by [Activity {}]",
                    name,
                    activity.id()
                );
                Err(RequirementError::UnknownRequirement {
                    manager: Self::NAME.to_string(),
                    requirement: name.to_string(),
                    activity: activity.id(),
                })
            }
        }
    }
}

impl MasterRequirementManager for InMemoryRequirementRegistry {
    fn register_requirement(&self, name: &str, provider: Arc<dyn RequirementManager>) {
        tracing::debug!("[Requirement {}] provided by {}", name, provider.name());
        if let Some(previous) = self.providers.write().insert(name.to_string(), provider) {
            tracing::warn!("[Requirement {}] was provided by {}, replaced", name, previous.name());
        }
    }

    fn unregister_requirement(&self, name: &str, provider: Arc<dyn RequirementManager>) {
        let mut providers = self.providers.write();
        match providers.get(name) {
            Some(current) if Arc::ptr_eq(current, &provider) => {
                providers.remove(name);
                tracing::debug!("[Requirement {}] no longer provided by {}", name, provider.name());
            }
            Some(current) => tracing::warn!(
                "{} tried to unregister [Requirement {}] owned by {}",
                provider.name(),
                name,
                current.name()
            ),
            None => tracing::debug!("[Requirement {}] was not registered", name),
        }
    }
}
