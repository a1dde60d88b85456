//! # Prometheus Activity Manager
//!
//! Resource-container assignment and boot-requirement latching for the
//! Prometheus activity scheduler.
//!
//! The scheduler runs many independent activities whose eligibility depends
//! on external conditions. Activities from the same logical client are
//! grouped into containers so that priority accounting happens per client
//! rather than per activity. This crate provides the two pieces in between:
//!
//! - **Container assignment**: [`ContainerManager`](crate::core::ContainerManager) maps process groups
//!   and bus entities onto named containers. It survives renames and
//!   upgrades without losing or double-counting priority contributions.
//! - **Boot requirement**: [`BootStatusProxy`](crate::core::BootStatusProxy) keeps a standing
//!   subscription to the boot-status source. It latches `finished: true`
//!   into one satisfaction pass per boot cycle and toggles the scheduler's UI
//!   flag. Transient delivery failures are retried every 250 ms and
//!   permanent failures end the subscription.
//!
//! ```text
//!   master resource manager ──map_container()──► ContainerManager
//!                                                 ├─ names:       String ─► ContainerId
//!                                                 ├─ assignments: BusId  ─► ContainerId
//!                                                 └─ containers:  [Container]
//!
//!   status source ══ standing call ══► BootStatusProxy ──requirement_met()──► activities
//!        ▲                               │            └─enable/disable(Ui)─► scheduler
//!        └──── reissue after 250 ms ─────┘ (transient failure)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_activity_manager::builders::build_boot_status_proxy;
//! use prometheus_activity_manager::config::ServiceConfig;
//! use prometheus_activity_manager::core::RequirementManager;
//! use prometheus_activity_manager::infra::{
//!     InMemoryRequirementRegistry, InMemoryScheduler, InMemoryStatusSource,
//! };
//! use prometheus_activity_manager::runtime::TokioSpawner;
//!
//! let master = InMemoryRequirementRegistry::new();
//! let proxy = build_boot_status_proxy(
//!     &ServiceConfig::from_env()?,
//!     Arc::new(InMemoryStatusSource::new()),
//!     Arc::new(InMemoryScheduler::new()),
//!     &master,
//!     TokioSpawner::current(),
//! )?;
//! proxy.enable();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Container assignment, requirements and the boot-status proxy.
pub mod core;
/// Configuration models and environment loading.
pub mod config;
/// Builders to construct services from configuration.
pub mod builders;
/// In-memory adapters for external collaborators.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared value types and telemetry.
pub mod util;
