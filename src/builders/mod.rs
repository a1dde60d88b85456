//! Builders to construct services from configuration.

pub mod proxy_builder;

pub use proxy_builder::build_boot_status_proxy;
