//! scd-runtime
//!
//! One engine invocation against live stores:
//!
//! 1. fetch zones, Stripe orders and WooCommerce orders concurrently, each
//!    bounded by the store timeout (all-or-nothing)
//! 2. adapt raw records into canonical orders
//! 3. reconcile
//!
//! Also builds the store set from an [`EngineConfig`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use scd_config::{EngineConfig, ResolvedStoreSecrets, StoreKind};
use scd_ingest::{adapt_all, normalize_address, RawOrderRecord};
use scd_reconcile::{ReconcileFilters, ReconcileReport, ReconcileSettings, RegionalBucket};
use scd_schemas::{DateRange, NormalizedAddress, Order, OrderSource};
use scd_store::{
    JsonFileOrderStore, JsonFileZoneStore, OrderStore, RestClient, RestOrderStore, RestZoneStore,
    StoreError, ZoneStore,
};
use scd_zones::{match_zone, resolve_rate, ShippingConfig};

// ---------------------------------------------------------------------------
// Store set
// ---------------------------------------------------------------------------

/// The three upstream stores one invocation reads from.
#[derive(Clone)]
pub struct Stores {
    pub zones: Arc<dyn ZoneStore>,
    pub stripe: Arc<dyn OrderStore>,
    pub woo: Arc<dyn OrderStore>,
}

impl Stores {
    pub fn new(
        zones: Arc<dyn ZoneStore>,
        stripe: Arc<dyn OrderStore>,
        woo: Arc<dyn OrderStore>,
    ) -> Self {
        Self { zones, stripe, woo }
    }

    /// Build stores for `cfg`. `secrets` must come from
    /// `scd_config::resolve_store_secrets` for the same config.
    pub fn from_config(cfg: &EngineConfig, secrets: &ResolvedStoreSecrets) -> Result<Self, StoreError> {
        match cfg.store.kind {
            StoreKind::File => {
                let file = cfg
                    .store
                    .file
                    .as_ref()
                    .ok_or_else(|| StoreError::config("file", "store.file section missing"))?;
                Ok(Self::new(
                    Arc::new(JsonFileZoneStore::new(&file.zones_path)),
                    Arc::new(JsonFileOrderStore::new(
                        &file.stripe_orders_path,
                        OrderSource::Stripe,
                    )),
                    Arc::new(JsonFileOrderStore::new(
                        &file.woo_orders_path,
                        OrderSource::WooCommerce,
                    )),
                ))
            }
            StoreKind::Rest => {
                let rest = cfg
                    .store
                    .rest
                    .as_ref()
                    .ok_or_else(|| StoreError::config("rest", "store.rest section missing"))?;
                let api_key = secrets.api_key.as_deref().ok_or_else(|| {
                    StoreError::config(
                        "rest",
                        format!("service key env var '{}' not resolved", rest.api_key_env),
                    )
                })?;
                let client = Arc::new(RestClient::new(
                    rest.base_url.as_str(),
                    api_key,
                    Duration::from_secs(cfg.store.timeout_secs),
                )?);
                Ok(Self::new(
                    Arc::new(RestZoneStore::new(client.clone())),
                    Arc::new(RestOrderStore::new(client.clone(), OrderSource::Stripe)),
                    Arc::new(RestOrderStore::new(client, OrderSource::WooCommerce)),
                ))
            }
        }
    }
}

/// Engine settings carried by the config document.
pub fn settings_from_config(cfg: &EngineConfig) -> ReconcileSettings {
    ReconcileSettings {
        shipping: ShippingConfig {
            free_threshold_fallback: cfg.shipping.free_threshold_fallback,
        },
        regional_bucket: RegionalBucket {
            label: cfg.reconcile.regional_bucket.label.clone(),
            keywords: cfg.reconcile.regional_bucket.keywords.clone(),
        },
    }
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileQuery {
    pub range: DateRange,
    pub filters: ReconcileFilters,
}

async fn bounded<T, F>(store: &str, timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout {
            store: store.to_string(),
            after_secs: timeout.as_secs(),
        }),
    }
}

fn adapt_source(store: &str, records: Vec<RawOrderRecord>) -> Result<(Vec<Order>, usize), StoreError> {
    let outcome = adapt_all(records).map_err(|e| StoreError::decode(store, e.to_string()))?;
    Ok((outcome.orders, outcome.dropped_without_address))
}

/// Fetch, adapt and reconcile one query. Any store failure fails the whole
/// invocation; there is no partial result.
pub async fn run_reconcile(
    stores: &Stores,
    query: &ReconcileQuery,
    settings: &ReconcileSettings,
    timeout: Duration,
) -> Result<ReconcileReport, StoreError> {
    let fetched = tokio::try_join!(
        bounded(stores.zones.name(), timeout, stores.zones.fetch_enabled_zones()),
        bounded(stores.stripe.name(), timeout, stores.stripe.fetch_orders(query.range)),
        bounded(stores.woo.name(), timeout, stores.woo.fetch_orders(query.range)),
    );
    let (zones, stripe_raw, woo_raw) = match fetched {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(store = e.store(), error = %e, "reconcile fetch failed");
            return Err(e);
        }
    };
    let fetched_count = stripe_raw.len() + woo_raw.len();

    let adapted = adapt_source(stores.stripe.name(), stripe_raw).and_then(|stripe| {
        adapt_source(stores.woo.name(), woo_raw).map(|woo| (stripe, woo))
    });
    let ((mut orders, stripe_dropped), (woo_orders, woo_dropped)) = match adapted {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(store = e.store(), error = %e, "reconcile adapt failed");
            return Err(e);
        }
    };
    orders.extend(woo_orders);

    let report = scd_reconcile::reconcile(&orders, &zones, &query.filters, settings);
    tracing::info!(
        zones = zones.len(),
        fetched = fetched_count,
        dropped_without_address = stripe_dropped + woo_dropped,
        listed = report.total_orders,
        "reconcile complete"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Zone lookup
// ---------------------------------------------------------------------------

/// Zone resolution for a single address, as exposed by the match surfaces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLookup {
    pub address: NormalizedAddress,
    pub zone_id: Option<String>,
    pub zone_name: String,
    pub rate_amount: rust_decimal::Decimal,
    pub free_threshold: Option<rust_decimal::Decimal>,
}

/// Resolve the zone for an already-normalized address against `zones`.
pub fn lookup_zone(
    address: NormalizedAddress,
    zones: &[scd_schemas::ShippingZone],
    shipping: &ShippingConfig,
) -> ZoneLookup {
    let m = match_zone(&address, zones);
    let rate = resolve_rate(m, rust_decimal::Decimal::ZERO, shipping);
    ZoneLookup {
        zone_id: m.zone().map(|z| z.id.clone()),
        zone_name: m.name().to_string(),
        rate_amount: rate.original_rate,
        free_threshold: rate.free_threshold,
        address,
    }
}

/// Fetch zones and resolve one raw address blob.
pub async fn run_match_zone(
    zones: &dyn ZoneStore,
    raw_address: &serde_json::Value,
    shipping: &ShippingConfig,
    timeout: Duration,
) -> Result<ZoneLookup, StoreError> {
    let fetched = bounded(zones.name(), timeout, zones.fetch_enabled_zones()).await;
    let zone_list = match fetched {
        Ok(z) => z,
        Err(e) => {
            tracing::warn!(store = e.store(), error = %e, "zone fetch failed");
            return Err(e);
        }
    };
    let lookup = lookup_zone(normalize_address(raw_address), &zone_list, shipping);
    tracing::info!(zone = %lookup.zone_name, "zone match");
    Ok(lookup)
}
