//! Master requirement registry adapters.

pub mod memory;
pub use memory::InMemoryRequirementRegistry;
