//! Builders to construct the boot-status proxy from configuration.

use std::sync::Arc;

use anyhow::anyhow;

use crate::config::ServiceConfig;
use crate::core::{
    AppResult, BootStatusProxy, MasterRequirementManager, RequirementManager, SchedulerHooks,
    Spawn, StatusTransport,
};

/// Build a boot-status proxy from validated configuration and register it
/// as the `bootup` provider with `master`. The proxy is returned disabled.
pub fn build_boot_status_proxy<S>(
    cfg: &ServiceConfig,
    transport: Arc<dyn StatusTransport>,
    scheduler: Arc<dyn SchedulerHooks>,
    master: &dyn MasterRequirementManager,
    spawner: S,
) -> AppResult<Arc<BootStatusProxy<S>>>
where
    S: Spawn + Send + Sync + 'static,
{
    cfg.validate().map_err(|e| anyhow!("config invalid: {e}"))?;

    let proxy = Arc::new(BootStatusProxy::new(
        cfg.boot_status.clone(),
        transport,
        scheduler,
        spawner,
    ));
    Arc::clone(&proxy).register_requirements(master);
    Ok(proxy)
}
