//! Container assignment and requirement latching.

pub mod boot_status;
pub mod container;
pub mod container_manager;
pub mod error;
pub mod requirement;
pub mod spawn;

pub use boot_status::{
    BootStatus, BootStatusProxy, Delivery, SchedulerHooks, StandingCall, StatusTransport,
    BOOTUP_REQUIREMENT,
};
pub use container::{BusEntity, Container, ContainerId, ContainerReport};
pub use container_manager::{ContainerManager, EntityRegistry};
pub use error::{AppResult, CallFailure, ContainerError, FailureKind, RequirementError};
pub use requirement::{
    Activity, ListedRequirement, MasterRequirementManager, RequirementCore, RequirementManager,
};
pub use spawn::Spawn;
