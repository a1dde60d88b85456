//! Service configuration structures.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Status endpoint queried for boot completion.
pub const DEFAULT_BOOT_STATUS_ENDPOINT: &str = "palm://com.palm.systemmanager/getBootStatus";

/// Delay before a failed standing call is reissued.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;

/// Environment variable overriding [`BootStatusConfig::endpoint`].
pub const ENV_BOOT_STATUS_ENDPOINT: &str = "ACTIVITY_BOOT_STATUS_ENDPOINT";

/// Environment variable overriding [`BootStatusConfig::retry_delay_ms`].
pub const ENV_BOOT_STATUS_RETRY_MS: &str = "ACTIVITY_BOOT_STATUS_RETRY_MS";

/// Boot-status subscription settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootStatusConfig {
    /// Endpoint of the standing call.
    pub endpoint: String,
    /// Fixed delay before reissuing after a transient failure, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for BootStatusConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BOOT_STATUS_ENDPOINT.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl BootStatusConfig {
    /// Retry delay as a [`Duration`].
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".into());
        }
        if self.retry_delay_ms == 0 {
            return Err("retry_delay_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Boot-status proxy settings.
    pub boot_status: BootStatusConfig,
}

impl ServiceConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.boot_status
            .validate()
            .map_err(|e| format!("boot_status invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by the process environment. A `.env` file in the
    /// working directory is loaded first when present.
    pub fn from_env() -> AppResult<Self> {
        if let Some(err) = env_file_error(dotenvy::dotenv()) {
            tracing::warn!("ignoring unreadable .env file: {}", err);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut cfg = Self::default();
        if let Some(endpoint) = lookup(ENV_BOOT_STATUS_ENDPOINT) {
            cfg.boot_status.endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_BOOT_STATUS_RETRY_MS) {
            cfg.boot_status.retry_delay_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_BOOT_STATUS_RETRY_MS}={raw} is not a number"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

/// A missing `.env` is the normal case; any other load failure is returned.
fn env_file_error<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Err(err) if !err.not_found() => Some(err),
        _ => None,
    }
}
