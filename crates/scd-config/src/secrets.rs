//! Store secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (`store.rest.api_key_env`).
//! - Binaries call [`resolve_store_secrets`] once at startup and pass the
//!   result into store constructors; nothing else reads the environment.
//! - `Debug` redacts values; errors name the variable, never its value.

use anyhow::{bail, Result};

use crate::{EngineConfig, StoreKind};

#[derive(Clone, Default)]
pub struct ResolvedStoreSecrets {
    /// Service key for the REST store. `None` for file stores.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedStoreSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStoreSecrets")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Returns `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve secrets from the process environment.
pub fn resolve_store_secrets(cfg: &EngineConfig) -> Result<ResolvedStoreSecrets> {
    resolve_store_secrets_with(cfg, resolve_env)
}

/// Resolve secrets through `lookup` (env var name -> value).
pub fn resolve_store_secrets_with<F>(cfg: &EngineConfig, lookup: F) -> Result<ResolvedStoreSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    match (cfg.store.kind, cfg.store.rest.as_ref()) {
        (StoreKind::Rest, Some(rest)) => {
            let name = rest.api_key_env.trim();
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(key) => Ok(ResolvedStoreSecrets { api_key: Some(key) }),
                None => bail!(
                    "SECRETS_MISSING store=rest: required env var '{}' is not set or empty",
                    name
                ),
            }
        }
        (StoreKind::Rest, None) => {
            bail!("CONFIG_INVALID: store.kind=rest requires a store.rest section")
        }
        (StoreKind::File, _) => Ok(ResolvedStoreSecrets::default()),
    }
}
