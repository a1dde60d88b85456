//! Telemetry helpers for structured logging.

/// Install a default env-filtered `tracing` subscriber unless the host
/// already installed one. Filter with `RUST_LOG`, e.g.
/// `RUST_LOG=prometheus_activity_manager=debug`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
