//! In-memory adapters for the collaborators the activity manager talks to.

pub mod entities;
pub mod requirements;
pub mod scheduler;
pub mod status;

pub use entities::{InMemoryEntityRegistry, StaticEntity};
pub use requirements::InMemoryRequirementRegistry;
pub use scheduler::InMemoryScheduler;
pub use status::InMemoryStatusSource;
