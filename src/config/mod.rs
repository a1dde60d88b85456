//! Configuration models for the activity manager services.

pub mod service;

pub use service::{BootStatusConfig, ServiceConfig, DEFAULT_BOOT_STATUS_ENDPOINT, DEFAULT_RETRY_DELAY_MS};
