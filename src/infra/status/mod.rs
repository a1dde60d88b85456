//! Status source adapters.

pub mod memory;
pub use memory::InMemoryStatusSource;
