//! scd-store
//!
//! Store boundary for shipping zones and raw order records.
//!
//! Two backends:
//! - [`file`]: JSON files on disk (fixtures, offline runs).
//! - [`rest`]: a PostgREST-style HTTP store.
//!
//! Stores return *raw* order records; canonicalisation happens in
//! `scd-ingest`. Zone stores return enabled zones only, sorted by
//! configured position.

use std::fmt;

use scd_ingest::RawOrderRecord;
use scd_schemas::{DateRange, OrderSource, ShippingZone};

pub mod file;
pub mod rest;

pub use file::{JsonFileOrderStore, JsonFileZoneStore};
pub use rest::{RestClient, RestOrderStore, RestZoneStore};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a store implementation may return. Every variant names the store
/// it came from so a failed fetch is attributable in logs and API errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network, connection or filesystem failure.
    Transport { store: String, message: String },
    /// The upstream answered with a non-success status.
    Api {
        store: String,
        status: u16,
        message: String,
    },
    /// A payload or record could not be decoded.
    Decode { store: String, message: String },
    /// The fetch did not finish within the configured bound.
    Timeout { store: String, after_secs: u64 },
    /// The store is misconfigured (missing key, bad URL).
    Config { store: String, message: String },
}

impl StoreError {
    pub fn transport(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            store: store.into(),
            message: message.into(),
        }
    }

    pub fn decode(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            store: store.into(),
            message: message.into(),
        }
    }

    pub fn config(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            store: store.into(),
            message: message.into(),
        }
    }

    pub fn store(&self) -> &str {
        match self {
            StoreError::Transport { store, .. }
            | StoreError::Api { store, .. }
            | StoreError::Decode { store, .. }
            | StoreError::Timeout { store, .. }
            | StoreError::Config { store, .. } => store,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport { store, message } => {
                write!(f, "store {store} transport error: {message}")
            }
            StoreError::Api {
                store,
                status,
                message,
            } => write!(f, "store {store} api error status={status}: {message}"),
            StoreError::Decode { store, message } => {
                write!(f, "store {store} decode error: {message}")
            }
            StoreError::Timeout { store, after_secs } => {
                write!(f, "store {store} timed out after {after_secs}s")
            }
            StoreError::Config { store, message } => {
                write!(f, "store {store} config error: {message}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Source of shipping zone configuration.
///
/// Implementations return enabled zones only, each with its rules and rates,
/// sorted by position ascending (ties by id).
#[async_trait::async_trait]
pub trait ZoneStore: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_enabled_zones(&self) -> Result<Vec<ShippingZone>, StoreError>;
}

/// Source of raw order records for one commerce platform.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    fn name(&self) -> &str;

    fn source(&self) -> OrderSource;

    /// Orders created within `window` (inclusive), in store order.
    async fn fetch_orders(&self, window: DateRange) -> Result<Vec<RawOrderRecord>, StoreError>;
}

/// Keep enabled zones and apply the configured ordering.
pub(crate) fn finalize_zones(mut zones: Vec<ShippingZone>) -> Vec<ShippingZone> {
    zones.retain(|z| z.enabled);
    scd_schemas::sort_zones_by_position(&mut zones);
    zones
}

/// Decode a JSON array of raw order rows for `source`.
pub(crate) fn decode_order_rows(
    store: &str,
    source: OrderSource,
    rows: Vec<serde_json::Value>,
) -> Result<Vec<RawOrderRecord>, StoreError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let decoded = match source {
                OrderSource::Stripe => serde_json::from_value(row).map(RawOrderRecord::Stripe),
                OrderSource::WooCommerce => {
                    serde_json::from_value(row).map(RawOrderRecord::WooCommerce)
                }
            };
            decoded.map_err(|e| StoreError::decode(store, format!("row {i}: {e}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
