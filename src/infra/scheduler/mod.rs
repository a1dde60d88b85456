//! Scheduler hook adapters.

pub mod memory;
pub use memory::InMemoryScheduler;
