//! Shared daemon state.
//!
//! The daemon holds no order or zone data between requests. Every request
//! reads the stores fresh, so refresh cadence is whatever the caller polls at.

use std::time::Duration;

use scd_config::{EngineConfig, ResolvedStoreSecrets};
use scd_reconcile::ReconcileSettings;
use scd_runtime::{settings_from_config, Stores};
use scd_store::StoreError;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            service: "scd-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub build: BuildInfo,
    pub stores: Stores,
    pub settings: ReconcileSettings,
    /// Bound on each upstream fetch.
    pub fetch_timeout: Duration,
}

impl AppState {
    pub fn new(stores: Stores, settings: ReconcileSettings, fetch_timeout: Duration) -> Self {
        Self {
            build: BuildInfo::current(),
            stores,
            settings,
            fetch_timeout,
        }
    }

    pub fn from_config(cfg: &EngineConfig, secrets: &ResolvedStoreSecrets) -> Result<Self, StoreError> {
        Ok(Self::new(
            Stores::from_config(cfg, secrets)?,
            settings_from_config(cfg),
            Duration::from_secs(cfg.store.timeout_secs),
        ))
    }
}
