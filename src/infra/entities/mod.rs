//! Entity registry adapters.

pub mod memory;
pub use memory::{InMemoryEntityRegistry, StaticEntity};
