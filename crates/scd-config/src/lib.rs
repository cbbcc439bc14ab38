//! scd-config
//!
//! Layered YAML configuration for ShipCost Desk.
//!
//! - Layers merge in order: earlier docs are base, later docs override.
//! - The merged document is hashed (SHA-256 over canonical JSON) so every
//!   report can name the exact settings it was computed with.
//! - Literal secrets are rejected; YAML holds env var NAMES only (see
//!   [`secrets`]).
//! - [`unused_keys`] flags leaves that a surface never reads.
//! - [`EngineConfig`] is the typed view the runtime consumes.

mod engine;
pub mod secrets;

pub use engine::{
    DaemonSection, EngineConfig, FileStoreConfig, RegionalBucketSection, ReconcileSection,
    RestStoreConfig, ShippingSection, StoreConfig, StoreKind,
};
pub use secrets::{resolve_store_secrets, resolve_store_secrets_with, ResolvedStoreSecrets};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

/// Known secret-like prefixes. A leaf string value starting with one of these
/// aborts loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // Stripe / OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "rk_live",    // Stripe restricted
    "whsec_",     // Stripe webhook signing secret
    "ck_",        // WooCommerce consumer key
    "cs_",        // WooCommerce consumer secret
    "eyJ",        // JWT (hosted data-store service keys)
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
];

/// Which surface is reading the config. Each surface consumes a different
/// subset of keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSurface {
    Cli,
    Daemon,
}

impl ConfigSurface {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSurface::Cli => "CLI",
            ConfigSurface::Daemon => "DAEMON",
        }
    }
}

/// Config leaves a surface never reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub surface: String,
    pub consumed_prefixes: Vec<String>,
    /// Sorted JSON pointers.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }

    /// `CONFIG_UNUSED_KEYS` unless every leaf is read.
    pub fn ensure_clean(&self) -> Result<()> {
        if self.is_clean() {
            return Ok(());
        }
        bail!(
            "CONFIG_UNUSED_KEYS (surface={}): {} key(s) not read: {}",
            self.surface,
            self.unused_leaf_pointers.len(),
            self.unused_leaf_pointers.join(", ")
        )
    }
}

/// Registry of consumed JSON-pointer prefixes per surface.
///
/// Must reflect what [`EngineConfig::from_config_json`] and the surface
/// actually read. A prefix consumes every leaf beneath it.
pub fn consumed_pointers_for_surface(surface: ConfigSurface) -> &'static [&'static str] {
    match surface {
        ConfigSurface::Cli => &[
            "/store/kind",
            "/store/timeout_secs",
            "/store/file",
            "/store/rest",
            "/shipping/free_threshold_fallback",
            "/reconcile/regional_bucket",
        ],
        ConfigSurface::Daemon => &[
            "/store/kind",
            "/store/timeout_secs",
            "/store/file",
            "/store/rest",
            "/shipping/free_threshold_fallback",
            "/reconcile/regional_bucket",
            "/daemon/bind",
        ],
    }
}

pub fn unused_keys(surface: ConfigSurface, config_json: &Value) -> UnusedKeyReport {
    let consumed = consumed_pointers_for_surface(surface);
    let unused: BTreeSet<String> = leaf_pointers(config_json)
        .into_iter()
        .filter(|leaf| !consumed.iter().any(|prefix| covers(prefix, leaf)))
        .collect();

    UnusedKeyReport {
        surface: surface.as_str().to_string(),
        consumed_prefixes: consumed.iter().map(|p| p.to_string()).collect(),
        unused_leaf_pointers: unused.into_iter().collect(),
    }
}

/// `/store` covers `/store` and `/store/kind`, not `/storefront`.
fn covers(prefix: &str, leaf: &str) -> bool {
    leaf.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// JSON pointers (RFC 6901) to every scalar leaf. Empty objects and arrays
/// contribute nothing.
fn leaf_pointers(root: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = vec![(String::new(), root)];
    while let Some((ptr, v)) = pending.pop() {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let token = k.replace('~', "~0").replace('/', "~1");
                    pending.push((format!("{ptr}/{token}"), child));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    pending.push((format!("{ptr}/{i}"), child));
                }
            }
            _ if ptr.is_empty() => out.push("/".to_string()),
            _ => out.push(ptr),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed engine settings from the merged document.
    pub fn engine(&self) -> Result<EngineConfig> {
        EngineConfig::from_config_json(&self.config_json)
    }
}

pub fn load_layered_yaml<P: AsRef<std::path::Path>>(paths: &[P]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let p = p.as_ref();
        let raw = fs::read_to_string(p)
            .with_context(|| format!("failed to read yaml path: {}", p.display()))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is ordered by key, so serialization is canonical.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let leaves = leaf_pointers(v);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
