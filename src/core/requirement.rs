//! Requirements gate an activity's eligibility to run.
//!
//! A [`RequirementCore`] is one logical condition ("the system has booted")
//! with a one-way `unmet -> met` transition. A [`ListedRequirement`] binds one
//! activity to a core; the provider keeps its bindings so it can notify them
//! together.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::core::RequirementError;
use crate::util::serde::ActivityId;

/// The activity side of a requirement binding.
pub trait Activity: Send + Sync {
    /// Activity identifier.
    fn id(&self) -> ActivityId;

    /// Called every time a requirement the activity waits on is satisfied.
    /// Implementations must tolerate repeated calls.
    fn requirement_met(&self, requirement: &str);
}

/// Shared state of one requirement condition.
///
/// The transition to met is one-way. Starting over means replacing the core
/// with a fresh instance.
#[derive(Debug)]
pub struct RequirementCore {
    name: String,
    met: AtomicBool,
}

impl RequirementCore {
    /// A new, unmet condition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            met: AtomicBool::new(false),
        }
    }

    /// Requirement name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the condition has been met.
    pub fn is_met(&self) -> bool {
        self.met.load(Ordering::Acquire)
    }

    /// Mark the condition met. Returns `true` only for the call that
    /// performed the transition.
    pub fn mark_met(&self) -> bool {
        !self.met.swap(true, Ordering::AcqRel)
    }
}

/// Binding of one activity to one [`RequirementCore`].
pub struct ListedRequirement {
    activity: Arc<dyn Activity>,
    core: Arc<RequirementCore>,
    met: AtomicBool,
}

impl ListedRequirement {
    /// Bind `activity` to `core`.
    pub fn new(activity: Arc<dyn Activity>, core: Arc<RequirementCore>) -> Self {
        Self {
            activity,
            core,
            met: AtomicBool::new(false),
        }
    }

    /// Requirement name.
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Bound activity.
    pub fn activity_id(&self) -> ActivityId {
        self.activity.id()
    }

    /// The core this binding was created against.
    pub const fn core(&self) -> &Arc<RequirementCore> {
        &self.core
    }

    /// Whether this binding has been satisfied at least once.
    pub fn is_met(&self) -> bool {
        self.met.load(Ordering::Acquire)
    }

    /// Satisfy the binding and tell the activity.
    pub fn met(&self) {
        self.met.store(true, Ordering::Release);
        tracing::debug!(
            "[Requirement {}] met for [Activity {}]",
            self.core.name(),
            self.activity.id()
        );
        self.activity.requirement_met(self.core.name());
    }
}

impl fmt::Debug for ListedRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListedRequirement")
            .field("name", &self.core.name())
            .field("activity", &self.activity.id())
            .field("met", &self.is_met())
            .finish()
    }
}

/// A component able to instantiate named requirements.
pub trait RequirementManager: Send + Sync {
    /// Manager name, reported in errors.
    fn name(&self) -> &str;

    /// Bind `activity` to the requirement `name` configured with `value`.
    ///
    /// # Errors
    ///
    /// [`RequirementError::UnknownRequirement`] if this manager does not
    /// provide `name`, [`RequirementError::InvalidValue`] if `value` is not
    /// legal for it.
    fn instantiate_requirement(
        &self,
        activity: Arc<dyn Activity>,
        name: &str,
        value: &Value,
    ) -> Result<Arc<ListedRequirement>, RequirementError>;

    /// Announce the requirement names this manager provides.
    fn register_requirements(self: Arc<Self>, master: &dyn MasterRequirementManager);

    /// Withdraw the names announced by [`RequirementManager::register_requirements`].
    fn unregister_requirements(self: Arc<Self>, master: &dyn MasterRequirementManager);

    /// Start driving requirement state.
    fn enable(&self);

    /// Stop driving requirement state.
    fn disable(&self);
}

/// Registry routing requirement names to their providers.
pub trait MasterRequirementManager: Send + Sync {
    /// Make `provider` responsible for `name`.
    fn register_requirement(&self, name: &str, provider: Arc<dyn RequirementManager>);

    /// Remove `provider` as the handler of `name`. A different provider
    /// registered under the same name is left alone.
    fn unregister_requirement(&self, name: &str, provider: Arc<dyn RequirementManager>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counting(AtomicUsize);

    impl Activity for Counting {
        fn id(&self) -> ActivityId {
            ActivityId(7)
        }

        fn requirement_met(&self, _requirement: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_core_transition_is_one_way() {
        let core = RequirementCore::new("bootup");
        assert!(!core.is_met());
        assert!(core.mark_met());
        assert!(!core.mark_met());
        assert!(core.is_met());
    }

    #[test]
    fn test_listed_requirement_notifies_activity_each_time() {
        let activity = Arc::new(Counting(AtomicUsize::new(0)));
        let core = Arc::new(RequirementCore::new("bootup"));
        let req = ListedRequirement::new(activity.clone(), core);

        assert!(!req.is_met());
        req.met();
        req.met();
        assert!(req.is_met());
        assert_eq!(req.name(), "bootup");
        assert_eq!(req.activity_id(), ActivityId(7));
        assert_eq!(activity.0.load(Ordering::SeqCst), 2);
    }
}
