//! Command handler modules for the `scd` binary.
//!
//! Shared config/store wiring lives here; command-specific logic lives in
//! the submodules.

pub mod reconcile;
pub mod zones;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use scd_config::{ConfigSurface, EngineConfig, LoadedConfig};

/// Load layered config for the CLI surface, warn on unused keys and return
/// the typed engine config.
pub fn load_engine_config(paths: &[String]) -> Result<(LoadedConfig, EngineConfig)> {
    let loaded = scd_config::load_layered_yaml(paths)?;
    let report = scd_config::unused_keys(ConfigSurface::Cli, &loaded.config_json);
    if !report.is_clean() {
        tracing::warn!(
            surface = %report.surface,
            unused = ?report.unused_leaf_pointers,
            "config has keys the CLI does not read"
        );
    }
    let engine = loaded.engine().context("engine config")?;
    Ok((loaded, engine))
}

/// Money as printed in key=value output: 2 dp.
pub fn money(v: Decimal) -> String {
    format!("{:.2}", v.round_dp(2))
}

/// Quote a free-text value for key=value output when it contains spaces.
pub fn text(v: &str) -> String {
    if v.is_empty() || v.chars().any(|c| c.is_whitespace() || c == '"' || c == '=') {
        format!("{v:?}")
    } else {
        v.to_string()
    }
}
