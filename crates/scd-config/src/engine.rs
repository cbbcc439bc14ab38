//! Typed engine settings extracted from the merged config document.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_BIND: &str = "127.0.0.1:8898";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    File,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStoreConfig {
    pub zones_path: PathBuf,
    pub stripe_orders_path: PathBuf,
    pub woo_orders_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestStoreConfig {
    pub base_url: String,
    /// NAME of the env var holding the service key. Never the key itself.
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
    #[serde(default)]
    pub file: Option<FileStoreConfig>,
    #[serde(default)]
    pub rest: Option<RestStoreConfig>,
    /// Upper bound for each upstream fetch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSection {
    #[serde(default)]
    pub free_threshold_fallback: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalBucketSection {
    #[serde(default = "default_bucket_label")]
    pub label: String,
    #[serde(default = "default_bucket_keywords")]
    pub keywords: Vec<String>,
}

impl Default for RegionalBucketSection {
    fn default() -> Self {
        Self {
            label: default_bucket_label(),
            keywords: default_bucket_keywords(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSection {
    #[serde(default)]
    pub regional_bucket: RegionalBucketSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub shipping: ShippingSection,
    #[serde(default)]
    pub reconcile: ReconcileSection,
    #[serde(default)]
    pub daemon: DaemonSection,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_bucket_label() -> String {
    "Toronto/GTA".to_string()
}

fn default_bucket_keywords() -> Vec<String> {
    vec!["toronto".to_string(), "gta".to_string()]
}

impl EngineConfig {
    /// Deserialize and validate. Errors carry the CONFIG_INVALID code.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: engine config does not match schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        match self.store.kind {
            StoreKind::File if self.store.file.is_none() => {
                bail!("CONFIG_INVALID: store.kind=file requires a store.file section")
            }
            StoreKind::Rest => match &self.store.rest {
                None => bail!("CONFIG_INVALID: store.kind=rest requires a store.rest section"),
                Some(r) if r.base_url.trim().is_empty() => {
                    bail!("CONFIG_INVALID: store.rest.base_url is empty")
                }
                Some(r) if r.api_key_env.trim().is_empty() => {
                    bail!("CONFIG_INVALID: store.rest.api_key_env is empty")
                }
                Some(_) => {}
            },
            StoreKind::File => {}
        }
        if self.store.timeout_secs == 0 {
            bail!("CONFIG_INVALID: store.timeout_secs must be > 0");
        }
        if let Some(t) = self.shipping.free_threshold_fallback {
            if t.is_sign_negative() {
                bail!("CONFIG_INVALID: shipping.free_threshold_fallback must be >= 0");
            }
        }
        Ok(())
    }
}
