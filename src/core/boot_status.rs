//! Boot-status proxy: turns the boot-completion feed into the `bootup`
//! requirement and the scheduler's UI enable flag.
//!
//! ## Subscription lifecycle
//! ```text
//!            enable()
//! Disabled ───────────► Delivering ◄──────────────┐
//!    ▲                   │    │                    │ reissue call
//!    │ permanent failure │    │ transient failure  │
//!    ├───────────────────┘    ▼                    │
//!    │                    RetryWait ── 250 ms ─────┘
//!    │ disable() from any state
//!    └─────────────────────────────
//! ```
//!
//! ## Latch
//! The first `finished: true` of a boot cycle satisfies every pending
//! `bootup` binding exactly once. `finished: false` starts a new cycle so a
//! later `true` satisfies them again (the status source restarted).
//!
//! ## Cancellation
//! Each [`BootStatusProxy::enable`] starts a subscription with a new
//! generation number and a cancel channel. [`BootStatusProxy::disable`] drops
//! the channel, which wakes the background task out of its delivery wait or
//! retry sleep. Deliveries are also checked against the current generation
//! under the state lock, so nothing from a cancelled subscription is applied
//! or reissued.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use crate::config::BootStatusConfig;
use crate::core::requirement::{
    Activity, ListedRequirement, MasterRequirementManager, RequirementCore, RequirementManager,
};
use crate::core::{CallFailure, FailureKind, RequirementError, Spawn};
use crate::util::serde::SubsystemTag;

/// Requirement name provided by the proxy.
pub const BOOTUP_REQUIREMENT: &str = "bootup";

/// One push on a standing call.
pub type Delivery = Result<Value, CallFailure>;

/// Request issued to the status source.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingCall {
    /// Endpoint to call.
    pub endpoint: String,
    /// Call parameters.
    pub params: Value,
}

/// Transport carrying standing calls to the external status source.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Issue `request` and return the stream of pushes it produces. The call
    /// stays open until the receiver is dropped.
    async fn call(&self, request: &StandingCall) -> mpsc::UnboundedReceiver<Delivery>;
}

/// Global enable/disable hooks of the activity scheduler.
pub trait SchedulerHooks: Send + Sync {
    /// Set an enable flag.
    fn enable_subsystem(&self, tag: SubsystemTag);

    /// Clear an enable flag.
    fn disable_subsystem(&self, tag: SubsystemTag);
}

/// Response of the boot-status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootStatus {
    /// Boot has completed.
    pub finished: Option<bool>,
    /// Device is in its first-use flow.
    pub first_use: Option<bool>,
}

impl BootStatus {
    /// Read the status from a response. Malformed fields count as absent.
    pub fn from_response(response: &Value) -> Self {
        Self {
            finished: response.get("finished").and_then(Value::as_bool),
            first_use: response.get("firstUse").and_then(Value::as_bool),
        }
    }
}

/// What the subscription loop does after a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Retry,
    Stop,
}

struct Subscription {
    generation: u64,
    // Dropping the sender cancels the background task.
    _cancel: oneshot::Sender<()>,
}

struct BootState {
    core: Arc<RequirementCore>,
    pending: Vec<Weak<ListedRequirement>>,
    subscription: Option<Subscription>,
    generation: u64,
}

impl BootState {
    fn is_current(&self, generation: u64) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    fn live_pending(&mut self) -> Vec<Arc<ListedRequirement>> {
        self.pending.retain(|req| req.strong_count() > 0);
        self.pending.iter().filter_map(Weak::upgrade).collect()
    }
}

struct Inner {
    config: BootStatusConfig,
    transport: Arc<dyn StatusTransport>,
    scheduler: Arc<dyn SchedulerHooks>,
    state: Mutex<BootState>,
}

impl Inner {
    fn request(&self) -> StandingCall {
        StandingCall {
            endpoint: self.config.endpoint.clone(),
            params: json!({ "subscribe": true }),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().is_current(generation)
    }

    fn drop_subscription(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.is_current(generation) {
            state.subscription = None;
        }
    }

    fn handle_delivery(&self, generation: u64, delivery: Delivery) -> Step {
        match delivery {
            Err(failure) => match failure.kind {
                FailureKind::Permanent => {
                    tracing::warn!(
                        "subscription to boot status experienced an uncorrectable failure: {}",
                        failure.response
                    );
                    self.drop_subscription(generation);
                    Step::Stop
                }
                FailureKind::Transient => {
                    tracing::warn!(
                        "subscription to boot status failed, retrying: {}",
                        failure.response
                    );
                    if self.is_current(generation) {
                        Step::Retry
                    } else {
                        Step::Stop
                    }
                }
            },
            Ok(response) => {
                if self.apply_status(Some(generation), &response) {
                    Step::Continue
                } else {
                    Step::Stop
                }
            }
        }
    }

    /// Apply one status update. Returns `false` when `generation` is stale
    /// and the update was ignored.
    fn apply_status(&self, generation: Option<u64>, response: &Value) -> bool {
        tracing::debug!("boot status update message: {}", response);

        let status = BootStatus::from_response(response);

        let satisfied = {
            let mut state = self.state.lock();
            if let Some(generation) = generation {
                if !state.is_current(generation) {
                    return false;
                }
            }

            let Some(finished) = status.finished else {
                tracing::warn!("bootup status not returned by status source: {}", response);
                return true;
            };

            if finished {
                if state.core.mark_met() {
                    Some(state.live_pending())
                } else {
                    Some(Vec::new())
                }
            } else {
                if state.core.is_met() {
                    tracing::debug!("boot status went back to unfinished, starting a new boot cycle");
                    state.core = Arc::new(RequirementCore::new(BOOTUP_REQUIREMENT));
                }
                None
            }
        };

        // Callbacks run outside the lock; activities may re-enter the proxy.
        match satisfied {
            Some(requirements) => {
                if !requirements.is_empty() {
                    tracing::info!(
                        "boot finished, satisfying {} bootup requirement(s)",
                        requirements.len()
                    );
                }
                for requirement in requirements {
                    requirement.met();
                }
                self.scheduler.enable_subsystem(SubsystemTag::Ui);
            }
            None => self.scheduler.disable_subsystem(SubsystemTag::Ui),
        }
        true
    }
}

/// Provider of the `bootup` requirement, driven by a standing boot-status
/// subscription.
pub struct BootStatusProxy<S> {
    inner: Arc<Inner>,
    spawner: S,
}

impl<S> BootStatusProxy<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Create a disabled proxy.
    pub fn new(
        config: BootStatusConfig,
        transport: Arc<dyn StatusTransport>,
        scheduler: Arc<dyn SchedulerHooks>,
        spawner: S,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                scheduler,
                state: Mutex::new(BootState {
                    core: Arc::new(RequirementCore::new(BOOTUP_REQUIREMENT)),
                    pending: Vec::new(),
                    subscription: None,
                    generation: 0,
                }),
            }),
            spawner,
        }
    }

    /// Whether the current boot cycle has already satisfied `bootup`.
    pub fn is_boot_latched(&self) -> bool {
        self.inner.state.lock().core.is_met()
    }

    /// Whether a standing call is currently owned.
    pub fn is_subscribed(&self) -> bool {
        self.inner.state.lock().subscription.is_some()
    }

    /// Number of live `bootup` bindings.
    pub fn pending_requirements(&self) -> usize {
        self.inner.state.lock().live_pending().len()
    }

    /// Apply a boot-status response directly, bypassing the subscription.
    pub fn boot_status_update(&self, response: &Value) {
        self.inner.apply_status(None, response);
    }
}

impl<S> RequirementManager for BootStatusProxy<S>
where
    S: Spawn + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "BootStatusProxy"
    }

    fn instantiate_requirement(
        &self,
        activity: Arc<dyn Activity>,
        name: &str,
        value: &Value,
    ) -> Result<Arc<ListedRequirement>, RequirementError> {
        tracing::debug!("instantiating [Requirement {}] for [Activity {}]", name, activity.id());

        if name != BOOTUP_REQUIREMENT {
            tracing::error!(
                "{} does not know how to instantiate [Requirement {}] for [Activity {}]",
                self.name(),
                name,
                activity.id()
            );
            return Err(RequirementError::UnknownRequirement {
                manager: self.name().to_string(),
                requirement: name.to_string(),
                activity: activity.id(),
            });
        }

        if value != &Value::Bool(true) {
            return Err(RequirementError::InvalidValue {
                requirement: name.to_string(),
                value: value.clone(),
            });
        }

        let (requirement, latched) = {
            let mut state = self.inner.state.lock();
            let requirement = Arc::new(ListedRequirement::new(activity, Arc::clone(&state.core)));
            state.pending.push(Arc::downgrade(&requirement));
            (requirement, state.core.is_met())
        };

        // Boot already finished in this cycle.
        if latched {
            requirement.met();
        }
        Ok(requirement)
    }

    fn register_requirements(self: Arc<Self>, master: &dyn MasterRequirementManager) {
        tracing::debug!("registering requirements");
        master.register_requirement(BOOTUP_REQUIREMENT, self);
    }

    fn unregister_requirements(self: Arc<Self>, master: &dyn MasterRequirementManager) {
        tracing::debug!("unregistering requirements");
        master.unregister_requirement(BOOTUP_REQUIREMENT, self);
    }

    fn enable(&self) {
        tracing::debug!("enabling boot status proxy");

        let (generation, cancelled) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            let (cancel, cancelled) = oneshot::channel();
            // Replacing an existing subscription cancels it.
            state.subscription = Some(Subscription {
                generation: state.generation,
                _cancel: cancel,
            });
            (state.generation, cancelled)
        };

        self.spawner
            .spawn(run_subscription(Arc::clone(&self.inner), generation, cancelled));
    }

    fn disable(&self) {
        tracing::debug!("disabling boot status proxy");
        self.inner.state.lock().subscription = None;
    }
}

async fn run_subscription(inner: Arc<Inner>, generation: u64, mut cancelled: oneshot::Receiver<()>) {
    let request = inner.request();

    loop {
        tracing::debug!("issuing standing call to {}", request.endpoint);
        let mut deliveries = inner.transport.call(&request).await;

        let step = loop {
            let delivery = tokio::select! {
                biased;
                _ = &mut cancelled => return,
                delivery = deliveries.recv() => delivery,
            };

            let Some(delivery) = delivery else {
                tracing::warn!("boot status stream closed without a failure; giving up");
                inner.drop_subscription(generation);
                return;
            };

            match inner.handle_delivery(generation, delivery) {
                Step::Continue => {}
                step => break step,
            }
        };

        if step == Step::Stop {
            return;
        }
        drop(deliveries);

        tokio::select! {
            biased;
            _ = &mut cancelled => return,
            () = tokio::time::sleep(inner.config.retry_delay()) => {}
        }

        if !inner.is_current(generation) {
            return;
        }
    }
}
