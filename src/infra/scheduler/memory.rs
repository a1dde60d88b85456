//! In-memory scheduler enable flags.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::core::SchedulerHooks;
use crate::util::serde::SubsystemTag;

/// Records scheduler enable flags and every hook invocation.
#[derive(Default)]
pub struct InMemoryScheduler {
    enabled: Mutex<HashSet<SubsystemTag>>,
    history: Mutex<Vec<(SubsystemTag, bool)>>,
}

impl InMemoryScheduler {
    /// Scheduler with every flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `tag` is currently set.
    pub fn is_enabled(&self, tag: SubsystemTag) -> bool {
        self.enabled.lock().contains(&tag)
    }

    /// True when every flag is set and activities may run.
    pub fn is_running(&self) -> bool {
        let enabled = self.enabled.lock();
        SubsystemTag::ALL.iter().all(|tag| enabled.contains(tag))
    }

    /// Hook invocations in order, `true` for enable.
    pub fn history(&self) -> Vec<(SubsystemTag, bool)> {
        self.history.lock().clone()
    }

    /// Number of enable calls for `tag`.
    pub fn enable_calls(&self, tag: SubsystemTag) -> usize {
        self.history.lock().iter().filter(|&&(t, on)| t == tag && on).count()
    }

    /// Number of disable calls for `tag`.
    pub fn disable_calls(&self, tag: SubsystemTag) -> usize {
        self.history.lock().iter().filter(|&&(t, on)| t == tag && !on).count()
    }
}

impl SchedulerHooks for InMemoryScheduler {
    fn enable_subsystem(&self, tag: SubsystemTag) {
        self.history.lock().push((tag, true));
        if self.enabled.lock().insert(tag) {
            tracing::info!("scheduler flag {:?} enabled", tag);
        }
    }

    fn disable_subsystem(&self, tag: SubsystemTag) {
        self.history.lock().push((tag, false));
        if self.enabled.lock().remove(&tag) {
            tracing::info!("scheduler flag {:?} disabled", tag);
        }
    }
}
